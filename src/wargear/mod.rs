//! Wargear items and bundles as immutable, costed values.

mod item;

pub use item::{loadout_cost, remove_first, Category, CompositeItem, Item, Wargear};
