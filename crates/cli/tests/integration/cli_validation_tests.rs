//! CLI argument validation tests.
//!
//! These tests verify that the CLI properly validates arguments and provides
//! helpful error messages.

use predicates::prelude::*;

use super::helpers::{fixture_path, margin_dash_cmd, snapshot};

#[test]
fn test_help_output() {
    margin_dash_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("margin-dash"))
        .stdout(predicate::str::contains("pools"))
        .stdout(predicate::str::contains("positions"))
        .stdout(predicate::str::contains("stress"))
        .stdout(predicate::str::contains("cliff"))
        .stdout(predicate::str::contains("distribution"))
        .stdout(predicate::str::contains("curve"));
}

#[test]
fn test_stress_help_output() {
    margin_dash_cmd()
        .args(["stress", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--position"))
        .stdout(predicate::str::contains("--asset"))
        .stdout(predicate::str::contains("--shock"));
}

#[test]
fn test_invalid_command() {
    margin_dash_cmd()
        .arg("invalid_command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_pools_missing_snapshot() {
    margin_dash_cmd()
        .arg("pools")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_stress_missing_shock() {
    margin_dash_cmd()
        .args(["stress", &snapshot(), "--position", "levered-0", "--asset", "SUI"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_invalid_format_value() {
    margin_dash_cmd()
        .args(["pools", &snapshot(), "--format", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_invalid_shock_value() {
    margin_dash_cmd()
        .args([
            "stress",
            &snapshot(),
            "--position",
            "levered-0",
            "--asset",
            "SUI",
            "--shock",
            "lots",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_allow_stale_conflicts_with_max_age() {
    margin_dash_cmd()
        .args([
            "positions",
            &snapshot(),
            "--allow-stale",
            "--max-price-age-ms",
            "1000",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_missing_snapshot_file() {
    margin_dash_cmd()
        .args(["pools", "/nonexistent/snapshot.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read snapshot"));
}

#[test]
fn test_malformed_snapshot_file() {
    // A config file is valid JSON but not a snapshot
    margin_dash_cmd()
        .args(["pools", &fixture_path("strict_config")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse snapshot"));
}

#[test]
fn test_missing_config_file() {
    margin_dash_cmd()
        .args(["pools", &snapshot(), "--config", "/nonexistent/config.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config"));
}
