//! Command-line tests for the offline `flatten` command
//!
//! Tests cover:
//! - `--format json` writes only the result to stdout, logs go to stderr
//! - A missing config file is reported as a warning
//! - Text output renders the flattened table

use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_flatten(dir: &Path, extra: &[&str]) -> Output {
    let input = dir.join("payload.json");
    std::fs::write(&input, r#"{"well": {"id": "W1"}, "stages": [1, 2]}"#).expect("write payload");

    Command::new(env!("CARGO_BIN_EXE_athena-pricing"))
        .arg("--config")
        .arg(dir.join("missing.toml"))
        .arg("flatten")
        .arg(&input)
        .args(extra)
        .env("RUST_LOG", "info")
        .env_remove("ATHENA_CONFIG")
        .output()
        .expect("run CLI")
}

#[test]
fn test_flatten_json_output_is_clean() {
    let dir = TempDir::new().expect("temp dir");
    let output = run_flatten(dir.path(), &["--format", "json"]);
    assert!(
        output.status.success(),
        "cli exited with {}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );

    let table: Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(table["total_rows"], 2);
    assert_eq!(table["columns"], serde_json::json!(["well_id", "stages"]));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Starting athena-pricing"));
}

#[test]
fn test_missing_config_file_is_warned() {
    let dir = TempDir::new().expect("temp dir");
    let output = run_flatten(dir.path(), &["--format", "json"]);
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Config file not found"),
        "missing config warning not logged:\n{}",
        stderr
    );
    assert!(stderr.contains("missing.toml"));
}

#[test]
fn test_flatten_text_output() {
    let dir = TempDir::new().expect("temp dir");
    let output = run_flatten(dir.path(), &["--separator", "."]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("well.id"));
    assert!(lines[0].ends_with("stages"));
    assert!(lines[2].starts_with("W1"));
    assert!(!stdout.contains("INFO"));
}
