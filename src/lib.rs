//! Army-builder core: a wargear-option grammar, its renderer, and a unit loadout
//! engine that keeps points in step with the options a player applies.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod logging;
pub mod options;
pub mod roster;
pub mod server;
pub mod wargear;
