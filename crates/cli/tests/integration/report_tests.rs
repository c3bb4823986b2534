//! Tests for the pools, positions and distribution commands.

use predicates::prelude::*;

use super::helpers::{decimal, fixture_path, margin_dash_cmd, run_json, snapshot};

#[test]
fn test_pools_table() {
    margin_dash_cmd()
        .args(["pools", &snapshot()])
        .assert()
        .success()
        .stdout(predicate::str::contains("USDC"))
        .stdout(predicate::str::contains("SUI"))
        .stdout(predicate::str::contains("Utilization"))
        .stdout(predicate::str::contains("20.10%"))
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("ref-1"));
}

#[test]
fn test_pools_json() {
    let pools = run_json(&["pools", &snapshot()]);
    let pools = pools.as_array().unwrap();
    assert_eq!(pools.len(), 2);

    let usdc = &pools[0];
    assert_eq!(usdc["asset"], "USDC");
    assert!((decimal(&usdc["utilization"]) - 0.201).abs() < 1e-9);
    assert!((decimal(&usdc["borrow_apr"]) - 0.03206).abs() < 1e-9);
    assert_eq!(usdc["suppliers"].as_array().unwrap().len(), 2);
    assert!((decimal(&usdc["suppliers"][0]["balance"]) - 60_000.0).abs() < 1e-9);

    let sui = &pools[1];
    assert_eq!(sui["asset"], "SUI");
    assert!(decimal(&sui["borrow"]).abs() < 1e-9);
}

#[test]
fn test_positions_table() {
    margin_dash_cmd()
        .args(["positions", &snapshot()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Positions: 11"))
        .stdout(predicate::str::contains("Unevaluable: 1"))
        .stdout(predicate::str::contains("underwater"))
        .stdout(predicate::str::contains("liquidatable"))
        .stdout(predicate::str::contains("stale-wal: Price for asset WAL is stale"));
}

#[test]
fn test_positions_json_statuses() {
    let positions = run_json(&["positions", &snapshot()]);
    let positions = positions.as_array().unwrap();
    assert_eq!(positions.len(), 11);

    let status = |id: &str| {
        positions
            .iter()
            .find(|p| p["id"] == id)
            .map(|p| p["status"].as_str().unwrap().to_string())
            .unwrap()
    };
    assert_eq!(status("underwater"), "liquidatable");
    assert_eq!(status("levered-0"), "healthy");
    assert_eq!(status("safe-5"), "healthy");
    assert_eq!(status("stale-wal"), "unknown");

    let levered = positions.iter().find(|p| p["id"] == "levered-0").unwrap();
    assert!((decimal(&levered["risk_ratio"]) - 1.45).abs() < 1e-9);
    assert!((decimal(&levered["collateral_usd"]) - 5_800.0).abs() < 1e-9);
}

#[test]
fn test_positions_liquidatable_filter() {
    let positions = run_json(&["positions", &snapshot(), "--liquidatable"]);
    let ids: Vec<_> = positions
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["underwater"]);
}

#[test]
fn test_allow_stale_prices_every_position() {
    margin_dash_cmd()
        .args(["positions", &snapshot(), "--allow-stale"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unevaluable: 0"));
}

#[test]
fn test_max_price_age_from_env() {
    margin_dash_cmd()
        .env("MARGIN_DASH_MAX_PRICE_AGE_MS", "3600000")
        .args(["positions", &snapshot()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unevaluable: 0"));
}

#[test]
fn test_config_file_threshold() {
    // Threshold 1.5 puts the 1.45x levered positions underwater
    let positions = run_json(&[
        "positions",
        &snapshot(),
        "--liquidatable",
        "--config",
        &fixture_path("strict_config"),
    ]);
    assert_eq!(positions.as_array().unwrap().len(), 4);
}

#[test]
fn test_config_from_env() {
    let output = margin_dash_cmd()
        .env("MARGIN_DASH_CONFIG", fixture_path("strict_config"))
        .args(["positions", &snapshot(), "--liquidatable", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let positions: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(positions.as_array().unwrap().len(), 4);
}

#[test]
fn test_distribution_table() {
    margin_dash_cmd()
        .args(["distribution", &snapshot()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Risk Ratio Distribution"))
        .stdout(predicate::str::contains("<1.00"))
        .stdout(predicate::str::contains("1.25-1.50"))
        .stdout(predicate::str::contains(">=2.00"));
}

#[test]
fn test_distribution_json() {
    let buckets = run_json(&["distribution", &snapshot()]);
    let buckets = buckets.as_array().unwrap();
    assert_eq!(buckets.len(), 6);

    let count = |label: &str| {
        buckets
            .iter()
            .find(|b| b["label"] == label)
            .map(|b| b["count"].as_u64().unwrap())
            .unwrap()
    };
    assert_eq!(count("<1.00"), 1);
    assert_eq!(count("1.25-1.50"), 3);
    assert_eq!(count(">=2.00"), 6);
    assert_eq!(
        buckets.iter().map(|b| b["count"].as_u64().unwrap()).sum::<u64>(),
        10
    );
}
