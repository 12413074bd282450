use serde::Serialize;

use crate::wargear::{loadout_cost, remove_first, Wargear};

/// A run of identically equipped models inside a unit.
///
/// Every model carries the unit's base wargear except what the group has
/// `exchanged`, plus the group's own `wargear`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelGroup {
    pub kind: String,
    pub count: u32,
    pub base_points: u32,
    pub wargear: Vec<Wargear>,
    pub exchanged: Vec<Wargear>,
    pub limit: Option<u32>,
}

impl ModelGroup {
    pub fn new(kind: impl Into<String>, count: u32, base_points: u32) -> Self {
        Self {
            kind: kind.into(),
            count,
            base_points,
            wargear: Vec::new(),
            exchanged: Vec::new(),
            limit: None,
        }
    }

    pub fn loadout(&self, base: &[Wargear]) -> Vec<Wargear> {
        let mut loadout = base.to_vec();
        for gone in &self.exchanged {
            remove_first(&mut loadout, gone);
        }
        loadout.extend(self.wargear.iter().cloned());
        loadout
    }

    pub fn per_model_cost(&self, base: &[Wargear]) -> u32 {
        self.base_points.saturating_add(loadout_cost(&self.loadout(base)))
    }

    pub fn points(&self, base: &[Wargear]) -> u32 {
        self.count.saturating_mul(self.per_model_cost(base))
    }

    /// Same model type ending up with the same gear over `base`, regardless of
    /// listing order or of how the gear was reached.
    pub fn same_loadout(&self, other: &ModelGroup, base: &[Wargear]) -> bool {
        self.kind == other.kind && same_multiset(&self.loadout(base), &other.loadout(base))
    }

    /// Gear this group carries that `other` does not, counting duplicates.
    pub fn gained_over(&self, other: &ModelGroup, base: &[Wargear]) -> Vec<Wargear> {
        let mut theirs = other.loadout(base);
        self.loadout(base)
            .into_iter()
            .filter(|item| !remove_first(&mut theirs, item))
            .collect()
    }
}

fn same_multiset(a: &[Wargear], b: &[Wargear]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut rest = b.to_vec();
    a.iter().all(|item| remove_first(&mut rest, item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wargear::{Category, Item};

    fn gear(name: &str, cost: u32) -> Wargear {
        Item::new(name, cost, Category::Ranged).into()
    }

    #[test]
    fn loadout_swaps_exchanged_base_items() {
        let base = vec![gear("Gauss cannon", 20)];
        let mut group = ModelGroup::new("Destroyer", 2, 40);
        group.exchanged.push(gear("Gauss cannon", 20));
        group.wargear.push(gear("Heavy gauss cannon", 27));
        assert_eq!(group.loadout(&base), vec![gear("Heavy gauss cannon", 27)]);
        assert_eq!(group.per_model_cost(&base), 67);
        assert_eq!(group.points(&base), 134);
    }

    #[test]
    fn loadout_comparison_ignores_order() {
        let mut a = ModelGroup::new("Warrior", 1, 12);
        a.wargear = vec![gear("A", 1), gear("B", 2)];
        let mut b = a.clone();
        b.wargear.reverse();
        b.count = 4;
        assert!(a.same_loadout(&b, &[]));
        b.wargear.pop();
        assert!(!a.same_loadout(&b, &[]));
    }

    #[test]
    fn exchanging_an_item_for_itself_is_the_same_loadout() {
        let base = vec![gear("Gauss cannon", 20)];
        let default = ModelGroup::new("Destroyer", 4, 40);
        let mut kept = default.clone();
        kept.exchanged.push(gear("Gauss cannon", 20));
        kept.wargear.push(gear("Gauss cannon", 20));
        assert!(kept.same_loadout(&default, &base));
        assert!(kept.gained_over(&default, &base).is_empty());

        let mut upgraded = default.clone();
        upgraded.exchanged.push(gear("Gauss cannon", 20));
        upgraded.wargear.push(gear("Heat ray", 54));
        assert_eq!(upgraded.gained_over(&default, &base), vec![gear("Heat ray", 54)]);
    }
}
