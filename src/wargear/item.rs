//! Wargear value types: single catalog items and fixed multi-item bundles.
//!
//! Values are immutable; changing a quantity produces a new value so items stay
//! safe to use as set or map keys.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Armoury section an item is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Melee,
    Ranged,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Melee => "Melee",
            Self::Ranged => "Ranged",
            Self::Other => "Other",
        }
    }

    /// Bundles take the category of their highest-priority member.
    fn priority(self) -> u8 {
        match self {
            Self::Melee => 2,
            Self::Ranged => 1,
            Self::Other => 0,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "melee" => Ok(Self::Melee),
            "ranged" | "range" => Ok(Self::Ranged),
            "other" | "other wargear" => Ok(Self::Other),
            other => Err(format!("unknown armoury category '{other}'")),
        }
    }
}

/// A single piece of equipment with a quantity, costed per instance.
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    name: String,
    quantity: u32,
    unit_cost: u32,
    category: Category,
}

impl Item {
    pub fn new(name: impl Into<String>, unit_cost: u32, category: Category) -> Self {
        Self {
            name: name.into(),
            quantity: 1,
            unit_cost,
            category,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_cost(&self) -> u32 {
        self.unit_cost
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Saturates rather than overflowing on absurd quantities.
    pub fn cost(&self) -> u32 {
        self.quantity.saturating_mul(self.unit_cost)
    }

    /// Copy of this item with the given quantity (clamped to at least one).
    pub fn with_quantity(&self, quantity: u32) -> Self {
        Self {
            quantity: quantity.max(1),
            ..self.clone()
        }
    }

    pub fn times(&self, factor: u32) -> Self {
        self.with_quantity(self.quantity.saturating_mul(factor))
    }

    /// "Heat ray" or "2 Heat rays".
    pub fn label(&self) -> String {
        if self.quantity == 1 {
            return self.name.clone();
        }
        let plural = if self.name.ends_with('s') { "" } else { "s" };
        format!("{} {}{}", self.quantity, self.name, plural)
    }

    /// Catalog notation: `Heat ray` or `2*Heat ray`.
    pub fn to_catalog_string(&self) -> String {
        if self.quantity == 1 {
            self.name.clone()
        } else {
            format!("{}*{}", self.quantity, self.name)
        }
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.quantity == other.quantity && self.cost() == other.cost()
    }
}

impl Eq for Item {}

impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.quantity.hash(state);
        self.cost().hash(state);
    }
}

/// Two or more items taken together as one indivisible choice (e.g. sword and shield).
#[derive(Debug, Clone, Serialize)]
pub struct CompositeItem {
    members: Vec<Item>,
    quantity: u32,
}

impl CompositeItem {
    /// Returns `None` for fewer than two members; a bundle of one is just an item.
    pub fn from_members(members: Vec<Item>) -> Option<Self> {
        if members.len() < 2 {
            return None;
        }
        Some(Self {
            members,
            quantity: 1,
        })
    }

    pub fn members(&self) -> &[Item] {
        &self.members
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn cost(&self) -> u32 {
        let each = self
            .members
            .iter()
            .fold(0u32, |total, member| total.saturating_add(member.cost()));
        self.quantity.saturating_mul(each)
    }

    pub fn category(&self) -> Category {
        self.members
            .iter()
            .map(Item::category)
            .max_by_key(|category| category.priority())
            .unwrap_or(Category::Other)
    }

    pub fn times(&self, factor: u32) -> Self {
        Self {
            members: self.members.clone(),
            quantity: self.quantity.saturating_mul(factor).max(1),
        }
    }

    /// "Voidblade, Dispersion shield & Hyperphase sword".
    pub fn label(&self) -> String {
        let mut label = String::new();
        let last = self.members.len() - 1;
        for (index, member) in self.members.iter().enumerate() {
            label.push_str(&member.label());
            if index + 1 == last {
                label.push_str(" & ");
            } else if index < last {
                label.push_str(", ");
            }
        }
        if self.quantity > 1 {
            format!("{} x ({label})", self.quantity)
        } else {
            label
        }
    }

    pub fn to_catalog_string(&self) -> String {
        self.members
            .iter()
            .map(Item::to_catalog_string)
            .collect::<Vec<_>>()
            .join("+")
    }

    fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.members.iter().map(Item::name).collect();
        names.sort_unstable();
        names
    }
}

impl PartialEq for CompositeItem {
    fn eq(&self, other: &Self) -> bool {
        self.sorted_names() == other.sorted_names()
    }
}

impl Eq for CompositeItem {}

impl Hash for CompositeItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sorted_names().hash(state);
    }
}

/// Anything that can sit in a loadout or be offered by an option.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Wargear {
    Item(Item),
    Composite(CompositeItem),
}

impl Wargear {
    pub fn name(&self) -> String {
        match self {
            Self::Item(item) => item.name().to_string(),
            Self::Composite(bundle) => bundle
                .members()
                .iter()
                .map(Item::name)
                .collect::<Vec<_>>()
                .join("+"),
        }
    }

    pub fn cost(&self) -> u32 {
        match self {
            Self::Item(item) => item.cost(),
            Self::Composite(bundle) => bundle.cost(),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Self::Item(item) => item.category(),
            Self::Composite(bundle) => bundle.category(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Item(item) => item.label(),
            Self::Composite(bundle) => bundle.label(),
        }
    }

    pub fn times(&self, factor: u32) -> Self {
        match self {
            Self::Item(item) => Self::Item(item.times(factor)),
            Self::Composite(bundle) => Self::Composite(bundle.times(factor)),
        }
    }

    pub fn to_catalog_string(&self) -> String {
        match self {
            Self::Item(item) => item.to_catalog_string(),
            Self::Composite(bundle) => bundle.to_catalog_string(),
        }
    }

    /// Joins two pieces of wargear into one bundle, keeping left-to-right member order.
    pub fn bundle(self, other: Wargear) -> Wargear {
        let mut members = self.into_members();
        members.extend(other.into_members());
        // both sides contribute at least one member
        Self::Composite(CompositeItem {
            members,
            quantity: 1,
        })
    }

    fn into_members(self) -> Vec<Item> {
        match self {
            Self::Item(item) => vec![item],
            Self::Composite(bundle) => bundle.members,
        }
    }
}

impl From<Item> for Wargear {
    fn from(item: Item) -> Self {
        Self::Item(item)
    }
}

impl From<CompositeItem> for Wargear {
    fn from(bundle: CompositeItem) -> Self {
        Self::Composite(bundle)
    }
}

impl fmt::Display for Wargear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cost = self.cost();
        match self {
            Self::Item(_) if cost == 0 => write!(f, "{}", self.label()),
            _ => write!(f, "{} ({}pts)", self.label(), cost),
        }
    }
}

/// Total cost of a loadout.
pub fn loadout_cost(wargear: &[Wargear]) -> u32 {
    wargear
        .iter()
        .fold(0, |total, item| total.saturating_add(item.cost()))
}

/// Removes the first entry equal to `target`; returns whether anything was removed.
pub fn remove_first(wargear: &mut Vec<Wargear>, target: &Wargear) -> bool {
    match wargear.iter().position(|held| held == target) {
        Some(index) => {
            wargear.remove(index);
            true
        }
        None => false,
    }
}
