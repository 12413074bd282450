//! Armoury: the read-only item registry every wargear lookup goes through.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::catalog::CatalogError;
use crate::wargear::{Category, Item};

/// One priced line of the armoury.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArmouryEntry {
    pub name: String,
    pub cost: u32,
    pub category: Category,
}

/// Item name -> cost and category. Exact names win; otherwise lookups fall back to a
/// case- and whitespace-insensitive key and return the canonical catalog name.
#[derive(Debug, Clone, Default)]
pub struct Armoury {
    entries: HashMap<String, ArmouryEntry>,
    by_key: HashMap<String, String>,
}

/// Normalize an item name for lookup: lowercase, single spaces.
fn normalize_lookup_key(value: &str) -> String {
    value
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

impl Armoury {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an armoury from catalog sections (`{"Melee": {"Warscythe": 11}, ...}`).
    pub fn from_sections(
        sections: &BTreeMap<String, BTreeMap<String, u32>>,
    ) -> Result<Self, CatalogError> {
        let mut armoury = Self::new();
        for (section, items) in sections {
            let category = section
                .parse::<Category>()
                .map_err(|_| CatalogError::UnknownCategory(section.clone()))?;
            for (name, cost) in items {
                armoury.insert(name, *cost, category);
            }
        }
        Ok(armoury)
    }

    pub fn insert(&mut self, name: &str, cost: u32, category: Category) {
        let name = name.trim().to_string();
        if self.entries.contains_key(&name) {
            tracing::warn!(item = %name, "armoury entry listed twice; keeping the last one");
        }
        self.by_key.insert(normalize_lookup_key(&name), name.clone());
        self.entries.insert(
            name.clone(),
            ArmouryEntry {
                name,
                cost,
                category,
            },
        );
    }

    pub fn with_item(mut self, name: &str, cost: u32, category: Category) -> Self {
        self.insert(name, cost, category);
        self
    }

    pub fn lookup(&self, name: &str) -> Result<&ArmouryEntry, CatalogError> {
        if let Some(entry) = self.entries.get(name) {
            return Ok(entry);
        }
        self.by_key
            .get(&normalize_lookup_key(name))
            .and_then(|canonical| self.entries.get(canonical))
            .ok_or_else(|| CatalogError::UnknownItem {
                name: name.trim().to_string(),
            })
    }

    pub fn lookup_cost(&self, name: &str) -> Result<u32, CatalogError> {
        self.lookup(name).map(|entry| entry.cost)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_ok()
    }

    /// Fresh item value for `name` with the given quantity.
    pub fn item(&self, name: &str, quantity: u32) -> Result<Item, CatalogError> {
        let entry = self.lookup(name)?;
        Ok(Item::new(entry.name.clone(), entry.cost, entry.category).with_quantity(quantity))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by category then name.
    pub fn entries(&self) -> Vec<&ArmouryEntry> {
        let mut entries: Vec<&ArmouryEntry> = self.entries.values().collect();
        entries.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
        entries
    }
}
