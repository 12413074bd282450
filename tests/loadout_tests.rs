use std::sync::Arc;

use armoury::catalog::{load_catalog, Armoury, BattlefieldRole, Catalog, UnitTemplate};
use armoury::options::Selection;
use armoury::roster::{RosterError, Unit};
use armoury::wargear::Category;
use pretty_assertions::assert_eq;

const CATALOG_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/catalogs/necron.catalog.json");

fn necrons() -> Arc<Catalog> {
    Arc::new(load_catalog(CATALOG_PATH, 1).expect("fixture catalog should load"))
}

fn unit(catalog: &Arc<Catalog>, role: BattlefieldRole, name: &str) -> Unit {
    Unit::new(catalog, role, name).expect("unit should exist")
}

fn select_and_apply(unit: &mut Unit, option: usize, choice: Selection) -> Result<(), RosterError> {
    let mut chosen = unit.option_mut(option)?.clone();
    chosen.select(choice)?;
    unit.apply_option(&chosen)
}

#[test]
fn default_points_count_every_model() {
    let catalog = necrons();
    assert_eq!(unit(&catalog, BattlefieldRole::Troops, "Necron Warriors").points(), 120);
    assert_eq!(unit(&catalog, BattlefieldRole::Elites, "Lychguard").points(), 180);
    assert_eq!(unit(&catalog, BattlefieldRole::Hq, "Overlord").points(), 94);
    assert_eq!(unit(&catalog, BattlefieldRole::FastAttack, "Destroyers").points(), 60);
}

#[test]
fn named_characters_resolve_from_any_role() {
    let catalog = necrons();
    let imotekh = unit(&catalog, BattlefieldRole::Hq, "Imotekh the Stormlord");
    assert_eq!(imotekh.points(), 195);
    assert!(matches!(
        Unit::new(&catalog, BattlefieldRole::Hq, "Trazyn"),
        Err(RosterError::Catalog(_))
    ));
}

#[test]
fn whole_unit_exchange_swaps_base_wargear() {
    let catalog = necrons();
    let mut lychguard = unit(&catalog, BattlefieldRole::Elites, "Lychguard");
    select_and_apply(&mut lychguard, 0, Selection::Letter('b')).unwrap();
    let labels: Vec<String> = lychguard.wargear().iter().map(|w| w.label()).collect();
    assert_eq!(labels, vec!["Hyperphase sword & Dispersion shield".to_string()]);
    assert_eq!(lychguard.points(), 5 * (25 + 21));
}

#[test]
fn character_exchange_and_take() {
    let catalog = necrons();
    let mut overlord = unit(&catalog, BattlefieldRole::Hq, "Overlord");
    let rendered = overlord.render_options().unwrap();
    assert_eq!(
        rendered[0].text,
        "You may exchange Staff of light for one of the following:\n    a) Staff of light (net +0pts)\n    b) Hyperphase sword (net +1pts)\n    c) Voidblade (net -10pts)\n    d) Warscythe (net +1pts)"
    );
    assert_eq!(rendered[1].header, "You may take one of the following:");

    select_and_apply(&mut overlord, 0, Selection::Letter('c')).unwrap();
    assert_eq!(overlord.points(), 84);
    select_and_apply(&mut overlord, 1, Selection::Letter('b')).unwrap();
    assert_eq!(overlord.points(), 114);
}

#[test]
fn per_n_option_carves_and_conserves_size() {
    let catalog = necrons();
    let mut destroyers = unit(&catalog, BattlefieldRole::FastAttack, "Destroyers");
    destroyers.resize(6).unwrap();
    assert_eq!(destroyers.points(), 360);

    select_and_apply(&mut destroyers, 0, Selection::Index(1)).unwrap();
    assert_eq!(destroyers.size(), 6);
    let counts: Vec<u32> = destroyers.models().iter().map(|g| g.count).collect();
    assert_eq!(counts, vec![4, 2]);
    assert_eq!(destroyers.points(), 4 * 60 + 2 * 67);

    // reapplying the same choice reuses the variant
    select_and_apply(&mut destroyers, 0, Selection::Index(1)).unwrap();
    assert_eq!(destroyers.models().len(), 2);
    assert_eq!(destroyers.size(), 6);
    assert_eq!(destroyers.points(), 374);
}

fn counts(unit: &Unit) -> Vec<u32> {
    unit.models().iter().map(|g| g.count).collect()
}

#[test]
fn keeping_current_gear_carves_nothing() {
    let catalog = necrons();
    let mut destroyers = unit(&catalog, BattlefieldRole::FastAttack, "Destroyers");
    destroyers.resize(6).unwrap();

    select_and_apply(&mut destroyers, 0, Selection::Index(0)).unwrap();
    assert_eq!(counts(&destroyers), vec![6]);
    assert_eq!(destroyers.points(), 360);

    select_and_apply(&mut destroyers, 0, Selection::Index(1)).unwrap();
    select_and_apply(&mut destroyers, 0, Selection::Index(0)).unwrap();
    assert_eq!(counts(&destroyers), vec![4, 2]);
    assert_eq!(destroyers.points(), 374);
}

#[test]
fn per_n_entitlement_is_shared_between_choices() {
    let armoury = Armoury::new()
        .with_item("Gauss cannon", 20, Category::Ranged)
        .with_item("Heavy gauss cannon", 27, Category::Ranged)
        .with_item("Heat ray", 54, Category::Ranged);
    let catalog = Arc::new(Catalog::new("Test", armoury).with_unit(
        BattlefieldRole::FastAttack,
        UnitTemplate::new("Wreckers", 40, [1, 9])
            .with_wargear(&["Gauss cannon"])
            .with_options(&["Gauss cannon/Heavy gauss cannon/Heat ray-3"]),
    ));
    let mut wreckers = unit(&catalog, BattlefieldRole::FastAttack, "Wreckers");
    wreckers.resize(6).unwrap();

    select_and_apply(&mut wreckers, 0, Selection::Letter('b')).unwrap();
    assert_eq!(counts(&wreckers), vec![4, 2]);
    assert_eq!(wreckers.points(), 374);

    let err = select_and_apply(&mut wreckers, 0, Selection::Letter('c')).unwrap_err();
    assert!(matches!(err, RosterError::EntitlementUsed { entitled: 2, .. }));
    assert_eq!(counts(&wreckers), vec![4, 2]);
    assert_eq!(wreckers.points(), 374);

    wreckers.resize(9).unwrap();
    select_and_apply(&mut wreckers, 0, Selection::Letter('c')).unwrap();
    assert_eq!(counts(&wreckers), vec![6, 2, 1]);
    assert_eq!(wreckers.size(), 9);
    assert_eq!(wreckers.points(), 6 * 60 + 2 * 67 + 94);
}

#[test]
fn per_model_option_moves_one_model_at_a_time() {
    let catalog = necrons();
    let mut warriors = unit(&catalog, BattlefieldRole::Troops, "Necron Warriors");
    select_and_apply(&mut warriors, 0, Selection::Letter('b')).unwrap();
    select_and_apply(&mut warriors, 0, Selection::Letter('b')).unwrap();
    let counts: Vec<u32> = warriors.models().iter().map(|g| g.count).collect();
    assert_eq!(counts, vec![8, 2]);
    assert_eq!(warriors.size(), 10);
    let loadout = warriors.models()[1].loadout(warriors.wargear());
    assert_eq!(loadout.len(), 1);
    assert_eq!(loadout[0].name(), "Synaptic disintegrator");
}

#[test]
fn too_few_models_reports_shortfall_without_changes() {
    let catalog = necrons();
    let mut destroyers = unit(&catalog, BattlefieldRole::FastAttack, "Destroyers");
    let err = select_and_apply(&mut destroyers, 0, Selection::Index(1)).unwrap_err();
    assert_eq!(
        err,
        RosterError::InsufficientModels {
            required: 3,
            current: 1,
            shortfall: 2,
            cost_delta: 120
        }
    );
    assert_eq!(destroyers.points(), 60);
    assert_eq!(destroyers.models().len(), 1);
}

#[test]
fn overselected_option_is_rejected_by_the_engine() {
    let catalog = necrons();
    let mut immortals = unit(&catalog, BattlefieldRole::Troops, "Immortals");
    let mut chosen = immortals.option_mut(0).unwrap().clone();
    chosen.select_list(&[0, 1]).unwrap();
    assert!(matches!(
        immortals.apply_option(&chosen),
        Err(RosterError::Selection(_))
    ));
    assert_eq!(immortals.points(), 130);
}

#[test]
fn applying_several_options_is_all_or_nothing() {
    let armoury = Armoury::new()
        .with_item("Gauss flayer", 0, Category::Ranged)
        .with_item("Tesla carbine", 9, Category::Ranged)
        .with_item("Heat ray", 54, Category::Ranged);
    let catalog = Arc::new(Catalog::new("Test", armoury).with_unit(
        BattlefieldRole::Troops,
        UnitTemplate::new("Squad", 10, [2, 4])
            .with_wargear(&["Gauss flayer"])
            .with_options(&["Gauss flayer/Tesla carbine", "Heat ray-3"]),
    ));
    let mut squad = unit(&catalog, BattlefieldRole::Troops, "Squad");
    let mut first = squad.option_mut(0).unwrap().clone();
    first.select(Selection::Index(1)).unwrap();
    let mut second = squad.option_mut(1).unwrap().clone();
    second.select(Selection::Index(0)).unwrap();

    let err = squad.apply_options(&[first.clone(), second]).unwrap_err();
    assert!(matches!(err, RosterError::InsufficientModels { required: 3, .. }));
    assert_eq!(squad.points(), 20);
    assert_eq!(squad.wargear()[0].name(), "Gauss flayer");

    squad.apply_options(&[first]).unwrap();
    assert_eq!(squad.points(), 2 * 19);
}

#[test]
fn resize_models_respects_limits() {
    let catalog = necrons();
    let mut destroyers = unit(&catalog, BattlefieldRole::FastAttack, "Destroyers");
    destroyers.resize_models(&[5, 1]).unwrap();
    assert_eq!(destroyers.size(), 6);
    assert_eq!(destroyers.points(), 5 * 60 + 67);
    assert!(destroyers.check_validity().is_empty());

    assert!(matches!(
        destroyers.resize_models(&[4, 2]),
        Err(RosterError::TooManyModels { limit: 1, .. })
    ));
    assert!(matches!(
        destroyers.resize_models(&[6]),
        Err(RosterError::ModelCountMismatch { expected: 2, got: 1, .. })
    ));
    assert!(matches!(
        destroyers.resize(7),
        Err(RosterError::InvalidSize { max: 6, .. })
    ));

    destroyers.resize_models(&[3, 0]).unwrap();
    assert_eq!(destroyers.models().len(), 1);
    assert_eq!(destroyers.points(), 180);
}

#[test]
fn reset_restores_catalog_state() {
    let catalog = necrons();
    let mut lychguard = unit(&catalog, BattlefieldRole::Elites, "Lychguard");
    lychguard.resize(8).unwrap();
    select_and_apply(&mut lychguard, 0, Selection::Letter('b')).unwrap();
    lychguard.rename("Honour guard");
    lychguard.reset().unwrap();
    assert_eq!(lychguard.points(), 180);
    assert_eq!(lychguard.size(), 5);
    assert_eq!(lychguard.name(), "Honour guard");
    assert_eq!(lychguard.summary().wargear, vec!["Warscythe".to_string()]);
}
