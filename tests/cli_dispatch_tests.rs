use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

const CATALOG_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/catalogs/necron.catalog.json");

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_armoury")
}

fn unique_temp_path(name: &str, extension: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("armoury-{name}-{stamp}.{extension}"))
}

#[test]
fn validate_command_accepts_the_bundled_catalog() {
    let output = Command::new(bin())
        .args(["validate", CATALOG_PATH])
        .output()
        .expect("validate should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("validation passed"));
    assert!(stdout.contains("11 units"));
}

#[test]
fn validate_command_reports_broken_options() {
    let path = unique_temp_path("broken", "yaml");
    fs::write(
        &path,
        r#"
faction: Broken
armoury:
  ranged:
    Gauss flayer: 0
units:
  Troops:
    Warriors:
      base_pts: 12
      size: [10, 20]
      wargear: [Gauss flayer]
      options: ["Gauss flayer/Tesla carbine"]
"#,
    )
    .expect("temp catalog should be written");

    let output = Command::new(bin())
        .args(["validate", path.to_str().expect("temp path should be utf-8")])
        .output()
        .expect("validate should run");
    let _ = fs::remove_file(&path);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Tesla carbine"));
    assert!(stderr.contains("validation failed: 1 error(s)"));
}

#[test]
fn validate_command_fails_on_missing_file() {
    let path = unique_temp_path("missing", "json");
    let output = Command::new(bin())
        .args(["validate", path.to_str().expect("temp path should be utf-8")])
        .output()
        .expect("validate should run");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("validation failed"));
}

#[test]
fn units_command_lists_default_points() {
    let output = Command::new(bin())
        .args(["units", CATALOG_PATH])
        .output()
        .expect("units should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Necrons"));
    assert!(stdout.contains("Fast Attack\tDestroyers\t1-6 models\t60pts"));
    assert!(stdout.contains("Troops\tNecron Warriors\t10-20 models\t120pts"));
}

#[test]
fn options_command_renders_exchange_text() {
    let output = Command::new(bin())
        .args(["options", "hq", "Overlord", CATALOG_PATH])
        .output()
        .expect("options should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Overlord (94pts)"));
    assert!(stdout.contains("1. You may exchange Staff of light for one of the following:"));
    assert!(stdout.contains("c) Voidblade (net -10pts)"));
    assert!(stdout.contains("2. You may take one of the following:"));
}

#[test]
fn options_command_rejects_unknown_role() {
    let output = Command::new(bin())
        .args(["options", "flyers", "Doom Scythe", CATALOG_PATH])
        .output()
        .expect("options should run");

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn missing_command_prints_usage() {
    let output = Command::new(bin()).output().expect("binary should run");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage: armoury"));
}
