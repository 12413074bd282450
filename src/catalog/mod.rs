//! Faction catalog: armoury prices, unit and model templates, file loading and validation.

pub mod armoury;
pub mod loader;
pub mod units;
pub mod validate;

use thiserror::Error;

pub use armoury::{Armoury, ArmouryEntry};
pub use loader::{load_catalog, load_catalog_dir, parse_catalog, read_catalog, CatalogFormat, LoadError};
pub use units::{BattlefieldRole, Catalog, ModelTemplate, UnitTemplate};
pub use validate::{validate_catalog, ValidationDiagnostic, ValidationReport, ValidationSeverity};

/// Lookup failures against a loaded catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("'{name}' is not in the armoury")]
    UnknownItem { name: String },
    #[error("no {kind} named '{name}' in the catalog")]
    MissingCatalogEntry { kind: &'static str, name: String },
    #[error("unknown armoury category '{0}'")]
    UnknownCategory(String),
}
