//! Units, their model groups, the edit workflow and army lists.

pub mod army;
mod model;
pub mod session;
pub mod unit;

pub use army::{ArmyList, Detachment, DetachmentSummary};
pub use model::ModelGroup;
pub use session::{EditSession, SessionError, SessionState};
pub use unit::{ModelSummary, RosterError, Unit, UnitSummary};
