use armoury::catalog::Armoury;
use armoury::options::{
    parse_clause, parse_options, OptionError, RenderContext, Selection, SelectionError, WargearOption,
};
use armoury::wargear::{Category, Wargear};
use pretty_assertions::assert_eq;

fn scenario_armoury() -> Armoury {
    Armoury::new()
        .with_item("Gauss flayer", 0, Category::Ranged)
        .with_item("Gauss cannon", 20, Category::Ranged)
        .with_item("Heavy gauss cannon", 27, Category::Ranged)
        .with_item("Heat ray", 54, Category::Ranged)
        .with_item("Tesla carbine", 9, Category::Ranged)
        .with_item("Synaptic disintegrator", 0, Category::Ranged)
        .with_item("Gauss blaster", 9, Category::Ranged)
        .with_item("Warscythe", 11, Category::Melee)
        .with_item("Voidblade", 0, Category::Melee)
        .with_item("Dispersion shield", 10, Category::Other)
        .with_item("Hyperphase sword", 11, Category::Melee)
}

fn option(clause: &str) -> WargearOption {
    WargearOption::parse(&scenario_armoury(), clause, &RenderContext::empty())
        .expect("clause should parse")
}

#[test]
fn multiplied_item_is_one_item_with_quantity() {
    let opt = option("2*Heat ray");
    assert_eq!(opt.len(), 1);
    let Wargear::Item(item) = &opt[0] else {
        panic!("expected a single item");
    };
    assert_eq!(item.quantity(), 2);
    assert_eq!(item.cost(), 108);
}

#[test]
fn multiplier_cost_scales_with_lookup() {
    let armoury = scenario_armoury();
    for (n, name) in [(3, "Gauss cannon"), (2, "Tesla carbine"), (4, "Gauss flayer")] {
        let opt = WargearOption::parse(&armoury, &format!("{n}*{name}"), &RenderContext::empty()).unwrap();
        assert_eq!(opt[0].cost(), n * armoury.lookup_cost(name).unwrap());
    }
}

#[test]
fn bundle_is_one_choice_next_to_its_alternative() {
    let opt = option("Warscythe/Voidblade+Dispersion shield+Hyperphase sword");
    let involved = opt.items_involved();
    assert_eq!(involved.len(), 2);
    assert_eq!(involved[0].name(), "Warscythe");
    assert_eq!(involved[0].cost(), 11);
    assert!(matches!(&involved[1], Wargear::Composite(bundle) if bundle.members().len() == 3));
    assert_eq!(involved[1].cost(), 21);
}

#[test]
fn per_n_models_is_recorded() {
    let opt = option("Gauss cannon/Heavy gauss cannon-3");
    assert_eq!(opt.models_required_per(), 3);
    assert_eq!(opt.picks_allowed(), 1);
    assert!(!opt.per_model());
}

#[test]
fn exchange_framing_lists_net_deltas() {
    let armoury = scenario_armoury();
    let held = vec![Wargear::from(armoury.item("Gauss flayer", 1).unwrap())];
    let ctx = RenderContext::unit(&held);
    let opt = WargearOption::parse(&armoury, "Gauss flayer/Gauss blaster/Tesla carbine", &ctx).unwrap();
    assert_eq!(
        opt.render(&ctx),
        "The whole unit may exchange Gauss flayer for one of the following:\n    a) Gauss flayer (net +0pts)\n    b) Gauss blaster (net +9pts)\n    c) Tesla carbine (net +9pts)"
    );
    assert_eq!(opt.header(), "The whole unit may exchange Gauss flayer for one of the following:");
}

#[test]
fn render_is_idempotent_and_ignores_selection() {
    let armoury = scenario_armoury();
    let held = vec![Wargear::from(armoury.item("Warscythe", 1).unwrap())];
    let ctx = RenderContext::model(&held);
    let mut opt = WargearOption::parse(&armoury, "Warscythe/Voidblade+Dispersion shield+Hyperphase sword", &ctx).unwrap();
    let first = opt.render(&ctx);
    opt.select(Selection::Index(1)).unwrap();
    assert_eq!(opt.render(&ctx), first);
    assert_eq!(opt.render(&ctx), opt.render(&ctx));
}

#[test]
fn pick_limit_holds_after_every_select() {
    let mut opt = option("2#Gauss cannon/Heavy gauss cannon/Heat ray");
    opt.select(Selection::Letter('a')).unwrap();
    opt.select(Selection::Letter('c')).unwrap();
    let before = opt.selected();
    assert_eq!(
        opt.select(Selection::Letter('b')),
        Err(SelectionError::Overselection {
            picks_allowed: 2,
            attempted: 3
        })
    );
    assert_eq!(opt.selected(), before);
    assert!(opt.distinct_picks() <= opt.picks_allowed());
}

#[test]
fn failures_name_what_went_wrong() {
    let armoury = scenario_armoury();
    assert_eq!(
        parse_clause(&armoury, "Gauss cannon/Staff of light"),
        Err(OptionError::UnknownItem {
            name: "Staff of light".to_string(),
            position: 13
        })
    );
    assert_eq!(
        parse_clause(&armoury, "Gauss cannon//Heat ray"),
        Err(OptionError::UnexpectedToken {
            token: "'/'".to_string(),
            position: 13
        })
    );
    assert_eq!(
        parse_clause(&armoury, "Gauss cannon+"),
        Err(OptionError::UnexpectedEnd { position: 13 })
    );
    assert_eq!(
        parse_clause(&armoury, "Gauss cannon; Heat ray"),
        Err(OptionError::UnexpectedCharacter { ch: ';', position: 12 })
    );
}

#[test]
fn oversized_counts_fail_instead_of_overflowing_costs() {
    let armoury = scenario_armoury();
    assert!(matches!(
        WargearOption::parse(&armoury, "4294967295*Heat ray", &RenderContext::empty()),
        Err(OptionError::NumberOutOfRange { position: 0, .. })
    ));
    assert!(matches!(
        WargearOption::parse(&armoury, "1000#Gauss cannon/Heat ray", &RenderContext::empty()),
        Err(OptionError::NumberOutOfRange { position: 0, .. })
    ));

    let stacked = option("999*999*Heat ray");
    assert_eq!(stacked[0].cost(), 999 * 999 * 54);
}

#[test]
fn picking_the_same_choice_twice_doubles_it() {
    let mut opt = option("Gauss cannon/Heat ray");
    opt.select(Selection::Index(1)).expect("first pick should be accepted");
    opt.select(Selection::Index(1)).expect("repeat pick should raise the quantity");
    let selected = opt.selected();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].cost(), 108);
    assert_eq!(
        opt.select(Selection::Index(0)),
        Err(SelectionError::Overselection {
            picks_allowed: 1,
            attempted: 2
        })
    );
}

#[test]
fn comma_separated_entries_become_separate_options() {
    let armoury = scenario_armoury();
    let entries = vec![
        "Gauss flayer/Tesla carbine, Heat ray".to_string(),
        "Warscythe/Nope".to_string(),
    ];
    let parsed = parse_options(&armoury, &entries, &RenderContext::empty());
    let clauses: Vec<&str> = parsed.iter().map(|p| p.clause.as_str()).collect();
    assert_eq!(clauses, vec!["Gauss flayer/Tesla carbine", "Heat ray", "Warscythe/Nope"]);
    assert!(parsed[0].result.is_ok());
    assert!(parsed[1].result.is_ok());
    assert!(matches!(&parsed[2].result, Err(err) if err.is_catalog_error()));
}
