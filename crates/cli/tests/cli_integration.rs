//! CLI integration tests for all subcommands.
//!
//! Uses `assert_cmd` to spawn the `apicompat` binary against snapshot
//! files written into a temporary directory, and verifies exit codes,
//! stdout content and stderr content.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper: create a Command for the `apicompat` binary.
fn apicompat() -> Command {
    cargo_bin_cmd!("apicompat")
}

fn method(name: &str) -> Value {
    json!({ "name": name, "modifiers": { "visibility": "public" }, "since": "1.0" })
}

fn snapshot(name: &str, version: &str, methods: &[&str]) -> Value {
    let methods: Vec<Value> = methods.iter().map(|m| method(m)).collect();
    json!({
        "name": name,
        "components": [{
            "id": "org.example.core",
            "version": version,
            "types": [{
                "name": "p.Api",
                "kind": "class",
                "modifiers": { "visibility": "public" },
                "since": "1.0",
                "methods": methods
            }]
        }]
    })
}

/// Write a reference and a current snapshot; returns their paths.
fn write_pair(dir: &TempDir, old: Value, new: Value) -> (PathBuf, PathBuf) {
    let reference = dir.path().join("reference.json");
    let current = dir.path().join("current.json");
    fs::write(&reference, old.to_string()).unwrap();
    fs::write(&current, new.to_string()).unwrap();
    (reference, current)
}

fn breaking_pair(dir: &TempDir, new_version: &str) -> (PathBuf, PathBuf) {
    write_pair(
        dir,
        snapshot("reference", "1.0.0", &["run", "stop"]),
        snapshot("current", new_version, &["run"]),
    )
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    apicompat()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("API compatibility checker"));
}

#[test]
fn version_exits_0() {
    apicompat()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("apicompat"));
}

// ──────────────────────────────────────────────
// 2. compare
// ──────────────────────────────────────────────

#[test]
fn compare_clean_minor_release_exits_0() {
    let dir = TempDir::new().unwrap();
    let (reference, current) = write_pair(
        &dir,
        snapshot("reference", "1.0.0", &["run"]),
        snapshot("current", "1.0.1", &["run"]),
    );
    apicompat()
        .arg("compare")
        .arg(&reference)
        .arg(&current)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 error(s)"));
}

#[test]
fn compare_breakage_without_major_bump_exits_1() {
    let dir = TempDir::new().unwrap();
    let (reference, current) = breaking_pair(&dir, "1.0.1");
    apicompat()
        .arg("compare")
        .arg(&reference)
        .arg(&current)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("suggested 2.0.0"));
}

#[test]
fn compare_breakage_with_unchanged_version_exits_1() {
    let dir = TempDir::new().unwrap();
    let (reference, current) = breaking_pair(&dir, "1.0.0");
    apicompat()
        .arg("compare")
        .arg(&reference)
        .arg(&current)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("2 error(s)"))
        .stdout(predicate::str::contains("suggested 2.0.0"));
}

#[test]
fn compare_json_lists_problem_ids() {
    let dir = TempDir::new().unwrap();
    let (reference, current) = breaking_pair(&dir, "1.0.1");
    let out = apicompat()
        .args(["--output", "json", "compare"])
        .arg(&reference)
        .arg(&current)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));

    let report: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["summary"]["errors"], 2);
    let problems = report["components"][0]["problems"].as_array().unwrap();
    let categories: Vec<&str> = problems
        .iter()
        .map(|p| p["category"].as_str().unwrap())
        .collect();
    assert_eq!(categories, vec!["compatibility", "version"]);
    assert_eq!(problems[1]["args"], json!(["1.0.1", "1.0.0"]));
}

#[test]
fn compare_major_bump_accepts_breakage() {
    let dir = TempDir::new().unwrap();
    let (reference, current) = breaking_pair(&dir, "2.0.0");
    apicompat()
        .arg("compare")
        .arg(&reference)
        .arg(&current)
        .assert()
        .success();

    apicompat()
        .arg("compare")
        .arg("--report-major-breakage")
        .arg(&reference)
        .arg(&current)
        .assert()
        .failure()
        .code(1);
}

#[test]
fn compare_config_can_downgrade_version_problems() {
    let dir = TempDir::new().unwrap();
    let (reference, current) = write_pair(
        &dir,
        snapshot("reference", "1.0.0", &["run"]),
        snapshot("current", "1.1.0", &["run"]),
    );
    let config = dir.path().join(".apiconfig");
    fs::write(&config, "micro_version_error = \"warning\"\n").unwrap();

    apicompat()
        .arg("compare")
        .arg(&reference)
        .arg(&current)
        .assert()
        .failure();

    apicompat()
        .arg("compare")
        .arg("--config")
        .arg(&config)
        .arg(&reference)
        .arg(&current)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 warning(s)"));
}

#[test]
fn compare_filter_store_suppresses_problems() {
    let dir = TempDir::new().unwrap();
    let (reference, current) = breaking_pair(&dir, "1.0.1");
    let out = apicompat()
        .args(["--output", "json", "compare"])
        .arg(&reference)
        .arg(&current)
        .output()
        .unwrap();
    let report: Value = serde_json::from_slice(&out.stdout).unwrap();
    let filters: Vec<Value> = report["components"][0]["problems"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| json!({ "resource": p["resource"], "id": p["id"], "args": p["args"] }))
        .collect();
    let store = dir.path().join("filters.json");
    fs::write(&store, Value::Array(filters).to_string()).unwrap();

    apicompat()
        .arg("compare")
        .arg("--filters")
        .arg(&store)
        .arg(&reference)
        .arg(&current)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 filtered"));
}

#[test]
fn compare_missing_file_exits_1() {
    apicompat()
        .args(["compare", "no/such/reference.json", "no/such/current.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error reading"));
}

#[test]
fn compare_malformed_snapshot_reports_json_error() {
    let dir = TempDir::new().unwrap();
    let bad = dir.path().join("bad.json");
    fs::write(&bad, "[1, 2, 3]").unwrap();
    apicompat()
        .args(["--output", "json", "compare"])
        .arg(&bad)
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"error\""));
}

// ──────────────────────────────────────────────
// 3. delta
// ──────────────────────────────────────────────

#[test]
fn delta_prints_tree() {
    let dir = TempDir::new().unwrap();
    let (reference, current) = breaking_pair(&dir, "1.0.1");
    apicompat()
        .arg("delta")
        .arg(&reference)
        .arg(&current)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 change(s)"))
        .stdout(predicate::str::contains("API_BASELINE current"));
}

#[test]
fn delta_equal_versions_needs_force() {
    let dir = TempDir::new().unwrap();
    let (reference, current) = breaking_pair(&dir, "1.0.0");
    apicompat()
        .arg("delta")
        .arg(&reference)
        .arg(&current)
        .assert()
        .success()
        .stdout(predicate::str::contains("no differences"));

    apicompat()
        .args(["delta", "--force"])
        .arg(&reference)
        .arg(&current)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 change(s)"));
}

// ──────────────────────────────────────────────
// 4. problem-id
// ──────────────────────────────────────────────

#[test]
fn problem_id_decodes_decimal_and_hex() {
    apicompat()
        .args(["problem-id", "285999126"])
        .assert()
        .success()
        .stdout(predicate::str::contains("compatibility CLASS REMOVED METHOD"));

    apicompat()
        .args(["problem-id", "0x110C0016"])
        .assert()
        .success()
        .stdout(predicate::str::contains("compatibility CLASS REMOVED METHOD"));
}

#[test]
fn problem_id_rejects_unknown_ids() {
    apicompat()
        .args(["problem-id", "0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unknown problem id"));

    apicompat()
        .args(["problem-id", "banana"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid problem id"));
}
