use std::path::Path;
use std::sync::Arc;

use crate::catalog::{load_catalog, read_catalog, validate_catalog, BattlefieldRole, Catalog, ValidationSeverity};
use crate::config::Settings;
use crate::roster::Unit;
use crate::server::{self, AppState, SessionLimits};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    Validate,
    Units,
    Options,
}

const USAGE: &str = "usage: armoury <serve|validate [catalog]|units [catalog]|options <role> <unit> [catalog]>";

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("serve") => Some(Command::Serve),
        Some("validate") => Some(Command::Validate),
        Some("units") => Some(Command::Units),
        Some("options") => Some(Command::Options),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    let settings = Settings::from_env();
    match parse_command(args) {
        Some(Command::Serve) => handle_serve(&settings),
        Some(Command::Validate) => handle_validate(args, &settings),
        Some(Command::Units) => handle_units(args, &settings),
        Some(Command::Options) => handle_options(args, &settings),
        None => {
            eprintln!("{USAGE}");
            2
        }
    }
}

fn catalog_arg<'a>(args: &'a [String], index: usize, settings: &'a Settings) -> &'a Path {
    args.get(index)
        .map(Path::new)
        .unwrap_or(settings.catalog_path.as_path())
}

fn load(path: &Path, settings: &Settings) -> Result<Arc<Catalog>, i32> {
    load_catalog(path, settings.workers).map(Arc::new).map_err(|err| {
        eprintln!("failed to load catalog: {err}");
        1
    })
}

fn handle_serve(settings: &Settings) -> i32 {
    let catalog = match load(&settings.catalog_path, settings) {
        Ok(catalog) => catalog,
        Err(code) => return code,
    };
    let limits = SessionLimits {
        max_sessions: settings.max_sessions,
        idle_timeout: settings.session_idle,
    };
    let state = Arc::new(AppState::with_limits(catalog, limits));
    match server::run_server(&settings.bind_addr, state) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn handle_validate(args: &[String], settings: &Settings) -> i32 {
    let path = catalog_arg(args, 2, settings);
    let catalog = match read_catalog(path) {
        Ok(catalog) => catalog,
        Err(err) => {
            eprintln!("validation failed: {err}");
            return 1;
        }
    };

    let report = validate_catalog(&catalog, settings.workers);
    for diag in &report.diagnostics {
        if diag.severity == ValidationSeverity::Error {
            eprintln!("- {diag}");
        } else {
            println!("- {diag}");
        }
    }
    if report.has_errors() {
        eprintln!("validation failed: {} error(s)", report.error_count());
        1
    } else {
        println!(
            "validation passed: {} ({} units, {} warning(s))",
            path.display(),
            catalog.unit_count(),
            report.warning_count()
        );
        0
    }
}

fn handle_units(args: &[String], settings: &Settings) -> i32 {
    let catalog = match load(catalog_arg(args, 2, settings), settings) {
        Ok(catalog) => catalog,
        Err(code) => return code,
    };
    println!("{}", catalog.faction);
    for (role, template) in catalog.units() {
        match Unit::new(&catalog, role, &template.name) {
            Ok(unit) => println!(
                "{role}\t{}\t{}-{} models\t{}pts",
                template.name,
                template.min_size(),
                template.max_size(),
                unit.points()
            ),
            Err(err) => {
                eprintln!("{role}\t{}\t{err}", template.name);
                return 1;
            }
        }
    }
    0
}

fn handle_options(args: &[String], settings: &Settings) -> i32 {
    let (Some(role), Some(name)) = (args.get(2), args.get(3)) else {
        eprintln!("usage: armoury options <role> <unit> [catalog]");
        return 2;
    };
    let role = match role.parse::<BattlefieldRole>() {
        Ok(role) => role,
        Err(err) => {
            eprintln!("{err}");
            return 2;
        }
    };
    let catalog = match load(catalog_arg(args, 4, settings), settings) {
        Ok(catalog) => catalog,
        Err(code) => return code,
    };

    let mut unit = match Unit::new(&catalog, role, name) {
        Ok(unit) => unit,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    match unit.render_options() {
        Ok(options) => {
            println!("{} ({}pts)", unit.name(), unit.points());
            for option in options {
                println!("{}. {}", option.index + 1, option.text);
            }
            0
        }
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}
