use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::catalog::BattlefieldRole;
use crate::roster::{Unit, UnitSummary};

/// A detachment of units filed by battlefield role.
#[derive(Debug, Clone)]
pub struct Detachment {
    pub kind: String,
    pub name: String,
    units: BTreeMap<BattlefieldRole, Vec<Unit>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetachmentSummary {
    pub kind: String,
    pub name: String,
    pub points: u32,
    pub units: Vec<UnitSummary>,
}

impl Detachment {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            units: BTreeMap::new(),
        }
    }

    pub fn add_unit(&mut self, unit: Unit) {
        self.units.entry(unit.role()).or_default().push(unit);
    }

    pub fn remove_unit(&mut self, role: BattlefieldRole, index: usize) -> Option<Unit> {
        let units = self.units.get_mut(&role)?;
        (index < units.len()).then(|| units.remove(index))
    }

    pub fn units(&self, role: BattlefieldRole) -> &[Unit] {
        self.units.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn unit_mut(&mut self, role: BattlefieldRole, index: usize) -> Option<&mut Unit> {
        self.units.get_mut(&role)?.get_mut(index)
    }

    pub fn unit_count(&self) -> usize {
        self.units.values().map(Vec::len).sum()
    }

    pub fn points(&self) -> u32 {
        self.units.values().flatten().map(Unit::points).sum()
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn summary(&self) -> DetachmentSummary {
        DetachmentSummary {
            kind: self.kind.clone(),
            name: self.name.clone(),
            points: self.points(),
            units: self.units.values().flatten().map(Unit::summary).collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArmyList {
    pub name: String,
    pub faction: String,
    detachments: Vec<Detachment>,
    numbering: HashMap<String, u32>,
}

impl ArmyList {
    pub fn new(name: impl Into<String>, faction: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            faction: faction.into(),
            ..Self::default()
        }
    }

    /// Adds a detachment named after its type and how many of that type came before
    /// ("Patrol 1", "Patrol 2").
    pub fn add_detachment(&mut self, kind: &str) -> &mut Detachment {
        let counter = self.numbering.entry(kind.to_string()).or_insert(0);
        *counter += 1;
        let name = format!("{kind} {counter}");
        self.detachments.push(Detachment::new(kind, name));
        let last = self.detachments.len() - 1;
        &mut self.detachments[last]
    }

    pub fn remove_detachment(&mut self, index: usize) -> Option<Detachment> {
        (index < self.detachments.len()).then(|| self.detachments.remove(index))
    }

    pub fn detachments(&self) -> &[Detachment] {
        &self.detachments
    }

    pub fn detachment_mut(&mut self, index: usize) -> Option<&mut Detachment> {
        self.detachments.get_mut(index)
    }

    pub fn points(&self) -> u32 {
        self.detachments.iter().map(Detachment::points).sum()
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::catalog::{Armoury, Catalog, UnitTemplate};
    use crate::wargear::Category;

    fn catalog() -> Arc<Catalog> {
        let armoury = Armoury::new().with_item("Gauss flayer", 0, Category::Ranged);
        Arc::new(
            Catalog::new("Necrons", armoury)
                .with_unit(
                    BattlefieldRole::Troops,
                    UnitTemplate::new("Necron Warriors", 12, [10, 20]).with_wargear(&["Gauss flayer"]),
                )
                .with_unit(BattlefieldRole::Hq, UnitTemplate::new("Overlord", 84, [1, 1])),
        )
    }

    #[test]
    fn repeated_detachment_types_are_numbered() {
        let mut army = ArmyList::new("Test", "Necrons");
        assert_eq!(army.add_detachment("Patrol").name, "Patrol 1");
        assert_eq!(army.add_detachment("Battalion").name, "Battalion 1");
        assert_eq!(army.add_detachment("Patrol").name, "Patrol 2");
        assert_eq!(army.detachments().len(), 3);
    }

    #[test]
    fn points_roll_up_from_units() {
        let catalog = catalog();
        let mut army = ArmyList::new("Test", "Necrons");
        let patrol = army.add_detachment("Patrol");
        patrol.add_unit(Unit::new(&catalog, BattlefieldRole::Troops, "Necron Warriors").unwrap());
        patrol.add_unit(Unit::new(&catalog, BattlefieldRole::Hq, "Overlord").unwrap());
        assert_eq!(patrol.unit_count(), 2);
        assert_eq!(army.points(), 120 + 84);

        let removed = army
            .detachment_mut(0)
            .and_then(|d| d.remove_unit(BattlefieldRole::Hq, 0))
            .unwrap();
        assert_eq!(removed.name(), "Overlord");
        assert_eq!(army.points(), 120);
        assert!(army.remove_detachment(4).is_none());
    }
}
