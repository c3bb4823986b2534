//! Test helper utilities for CLI integration tests.

#![allow(deprecated)] // Command::cargo_bin deprecation

use assert_cmd::Command;
use serde_json::Value;

/// Create a CLI command with a clean environment.
pub fn margin_dash_cmd() -> Command {
    let mut cmd = Command::cargo_bin("margin-dash").unwrap();
    cmd.env_remove("MARGIN_DASH_CONFIG")
        .env_remove("MARGIN_DASH_MAX_PRICE_AGE_MS")
        .env_remove("RUST_LOG");
    cmd
}

/// Absolute path of a fixture file.
pub fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}.json", env!("CARGO_MANIFEST_DIR"), name)
}

/// Path of the shared market snapshot.
pub fn snapshot() -> String {
    fixture_path("snapshot")
}

/// Run a command with `--format json` and parse its stdout.
pub fn run_json(args: &[&str]) -> Value {
    let output = margin_dash_cmd()
        .args(args)
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

/// Parse a decimal that serde emitted as a JSON string.
pub fn decimal(value: &Value) -> f64 {
    value.as_str().unwrap().parse().unwrap()
}
