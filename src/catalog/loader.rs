//! Reads catalog files (JSON or YAML, picked by extension) into a [`Catalog`].

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::catalog::validate::{validate_catalog, ValidationReport, ValidationSeverity};
use crate::catalog::{Armoury, BattlefieldRole, Catalog, CatalogError, ModelTemplate, UnitTemplate};

/// On-disk layout of a catalog file.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    faction: String,
    #[serde(default)]
    armoury: BTreeMap<String, BTreeMap<String, u32>>,
    #[serde(default)]
    units: BTreeMap<String, BTreeMap<String, UnitTemplate>>,
    #[serde(default)]
    models: BTreeMap<String, ModelTemplate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Json,
    Yaml,
}

impl CatalogFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Some(Self::Json),
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Some(Self::Yaml)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("unsupported catalog format for {path} (expected .json, .yaml or .yml)")]
    UnsupportedFormat { path: String },
    #[error("{path}: {source}")]
    Catalog {
        path: String,
        #[source]
        source: CatalogError,
    },
    #[error("{path}: unknown battlefield role '{role}'")]
    UnknownRole { path: String, role: String },
    #[error("{path} failed validation with {} error(s)", .report.error_count())]
    Invalid { path: String, report: ValidationReport },
}

/// Parses catalog text. `origin` only labels errors.
pub fn parse_catalog(raw: &str, format: CatalogFormat, origin: &str) -> Result<Catalog, LoadError> {
    let file: CatalogFile = match format {
        CatalogFormat::Json => serde_json::from_str(raw).map_err(|source| LoadError::Json {
            path: origin.to_string(),
            source,
        })?,
        CatalogFormat::Yaml => serde_yaml::from_str(raw).map_err(|source| LoadError::Yaml {
            path: origin.to_string(),
            source,
        })?,
    };

    let armoury = Armoury::from_sections(&file.armoury).map_err(|source| LoadError::Catalog {
        path: origin.to_string(),
        source,
    })?;
    let mut catalog = Catalog::new(file.faction, armoury);

    for (role_name, units) in file.units {
        let role = role_name
            .parse::<BattlefieldRole>()
            .map_err(|_| LoadError::UnknownRole {
                path: origin.to_string(),
                role: role_name.clone(),
            })?;
        for (name, mut template) in units {
            template.name = name;
            catalog.add_unit(role, template);
        }
    }
    for (name, mut template) in file.models {
        template.name = name;
        catalog.add_model(template);
    }
    Ok(catalog)
}

/// Reads and parses a catalog file without validating its option strings.
pub fn read_catalog(path: impl AsRef<Path>) -> Result<Catalog, LoadError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let format = CatalogFormat::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat {
        path: display.clone(),
    })?;
    let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: display.clone(),
        source,
    })?;
    parse_catalog(&raw, format, &display)
}

/// Reads a catalog and validates every wargear and option string up front.
/// Warnings are logged; any error rejects the catalog.
pub fn load_catalog(path: impl AsRef<Path>, workers: usize) -> Result<Catalog, LoadError> {
    let path = path.as_ref();
    let catalog = read_catalog(path)?;
    let report = validate_catalog(&catalog, workers);
    for diag in &report.diagnostics {
        match diag.severity {
            ValidationSeverity::Error => tracing::error!(context = %diag.context, "{}", diag.message),
            ValidationSeverity::Warning => tracing::warn!(context = %diag.context, "{}", diag.message),
            ValidationSeverity::Info => tracing::debug!(context = %diag.context, "{}", diag.message),
        }
    }
    if report.has_errors() {
        return Err(LoadError::Invalid {
            path: path.display().to_string(),
            report,
        });
    }
    tracing::info!(
        path = %path.display(),
        faction = %catalog.faction,
        units = catalog.unit_count(),
        items = catalog.armoury().len(),
        "catalog loaded"
    );
    Ok(catalog)
}

/// Loads every `*.catalog.json`, `*.catalog.yaml` and `*.catalog.yml` file in a directory.
/// Files that fail to load are logged and skipped.
pub fn load_catalog_dir(dir: impl AsRef<Path>, workers: usize) -> Result<Vec<Catalog>, LoadError> {
    let dir = dir.as_ref();
    let mut catalogs = Vec::new();
    if !dir.is_dir() {
        return Ok(catalogs);
    }
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.display().to_string(),
        source,
    })?;
    let mut paths: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map_or(false, |n| {
                        n.ends_with(".catalog.json")
                            || n.ends_with(".catalog.yaml")
                            || n.ends_with(".catalog.yml")
                    })
        })
        .collect();
    paths.sort();
    for path in paths {
        match load_catalog(&path, workers) {
            Ok(catalog) => catalogs.push(catalog),
            Err(err) => tracing::warn!(path = %path.display(), error = %err, "skipping catalog"),
        }
    }
    Ok(catalogs)
}
