//! Eager catalog validation: every loadout entry, option clause and model reference
//! is checked when the catalog is loaded instead of when a player first opens a unit.

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;

use crate::catalog::{BattlefieldRole, Catalog, ModelTemplate, UnitTemplate};
use crate::options::{parse_options, parse_wargear, RenderContext, Scope};
use crate::wargear::Wargear;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn extend(&mut self, other: ValidationReport) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.count(ValidationSeverity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(ValidationSeverity::Warning)
    }

    fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == severity)
            .count()
    }
}

/// Validates all templates. `workers == 0` uses the global rayon pool.
pub fn validate_catalog(catalog: &Catalog, workers: usize) -> ValidationReport {
    let run = || {
        let units: Vec<(BattlefieldRole, &Arc<UnitTemplate>)> = catalog.units().collect();
        let models: Vec<&Arc<ModelTemplate>> = catalog.models().collect();

        let unit_reports: Vec<ValidationReport> = units
            .par_iter()
            .map(|(role, template)| validate_unit(catalog, *role, template))
            .collect();
        let model_reports: Vec<ValidationReport> = models
            .par_iter()
            .map(|template| validate_model(catalog, template))
            .collect();

        let mut report = ValidationReport::default();
        for partial in unit_reports.into_iter().chain(model_reports) {
            report.extend(partial);
        }
        report
    };

    if workers == 0 {
        return run();
    }
    match ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool.install(run),
        Err(err) => {
            tracing::warn!(workers, error = %err, "could not size validation pool; using the global pool");
            run()
        }
    }
}

fn parse_loadout(
    catalog: &Catalog,
    entries: &[String],
    context: &str,
    report: &mut ValidationReport,
) -> Vec<Wargear> {
    entries
        .iter()
        .filter_map(|entry| match parse_wargear(catalog.armoury(), entry) {
            Ok(wargear) => Some(wargear),
            Err(err) => {
                report.push(
                    ValidationSeverity::Error,
                    context,
                    format!("wargear '{entry}': {err}"),
                );
                None
            }
        })
        .collect()
}

fn validate_unit(catalog: &Catalog, role: BattlefieldRole, template: &UnitTemplate) -> ValidationReport {
    let mut report = ValidationReport::default();
    let context = format!("{role}/{}", template.name);

    let [min, max] = template.size;
    if min == 0 || min > max {
        report.push(
            ValidationSeverity::Error,
            &context,
            format!("invalid size range [{min}, {max}]"),
        );
    }

    let wargear = parse_loadout(catalog, &template.wargear, &context, &mut report);
    let scope = if max > 1 { Scope::Unit } else { Scope::Model };
    let ctx = RenderContext { wargear: &wargear, scope };
    for parsed in parse_options(catalog.armoury(), &template.options, &ctx) {
        match parsed.result {
            Ok(option) => {
                if option.models_required_per() > max {
                    report.push(
                        ValidationSeverity::Warning,
                        &context,
                        format!(
                            "option '{}' needs {} models but the unit tops out at {max}",
                            parsed.clause,
                            option.models_required_per()
                        ),
                    );
                }
            }
            Err(err) => report.push(
                ValidationSeverity::Error,
                &context,
                format!("option '{}': {err}", parsed.clause),
            ),
        }
    }

    for model in &template.models {
        if let Err(err) = catalog.model(model) {
            report.push(ValidationSeverity::Error, &context, err.to_string());
        }
    }

    if template.base_points == 0 && template.wargear.is_empty() {
        report.push(
            ValidationSeverity::Info,
            &context,
            "unit has no points cost and no wargear",
        );
    }
    report
}

fn validate_model(catalog: &Catalog, template: &ModelTemplate) -> ValidationReport {
    let mut report = ValidationReport::default();
    let context = format!("model/{}", template.name);
    parse_loadout(catalog, &template.wargear, &context, &mut report);
    if template.limit == Some(0) {
        report.push(
            ValidationSeverity::Warning,
            &context,
            "model limit of 0 means it can never be fielded",
        );
    }
    report
}
