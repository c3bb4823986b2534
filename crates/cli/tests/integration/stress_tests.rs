//! Tests for the stress, cliff and curve commands.

use predicates::prelude::*;

use super::helpers::{decimal, margin_dash_cmd, run_json, snapshot};

#[test]
fn test_stress_table() {
    margin_dash_cmd()
        .args([
            "stress",
            &snapshot(),
            "--position",
            "levered-0",
            "--asset",
            "SUI",
            "--shock",
            "-30",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Position levered-0"))
        .stdout(predicate::str::contains("SUI -30.00%"))
        .stdout(predicate::str::contains("LIQUIDATABLE"))
        .stdout(predicate::str::contains("$4.06K"));
}

#[test]
fn test_stress_json() {
    let result = run_json(&[
        "stress",
        &snapshot(),
        "--position",
        "levered-0",
        "--asset",
        "SUI",
        "--shock",
        "-30",
    ]);
    assert_eq!(result["asset"], "SUI");
    assert!((decimal(&result["shock_pct"]) + 30.0).abs() < 1e-9);
    assert_eq!(result["before"]["status"], "healthy");
    assert_eq!(result["after"]["status"], "liquidatable");
    assert!((decimal(&result["after"]["risk_ratio"]) - 1.015).abs() < 1e-9);
}

#[test]
fn test_stress_fractional_shock() {
    let result = run_json(&[
        "stress",
        &snapshot(),
        "--position",
        "levered-0",
        "--asset",
        "SUI",
        "--shock",
        "-16.5",
    ]);
    assert!((decimal(&result["shock_pct"]) + 16.5).abs() < 1e-9);
    assert_eq!(result["after"]["status"], "healthy");
}

#[test]
fn test_stress_unknown_position() {
    margin_dash_cmd()
        .args([
            "stress",
            &snapshot(),
            "--position",
            "nobody",
            "--asset",
            "SUI",
            "--shock",
            "-10",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No position with id nobody"));
}

#[test]
fn test_stress_unpriced_asset() {
    margin_dash_cmd()
        .args([
            "stress",
            &snapshot(),
            "--position",
            "levered-0",
            "--asset",
            "DOGE",
            "--shock",
            "-10",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Price missing for asset DOGE"));
}

#[test]
fn test_stress_rejects_shock_below_total_loss() {
    margin_dash_cmd()
        .args([
            "stress",
            &snapshot(),
            "--position",
            "levered-0",
            "--asset",
            "SUI",
            "--shock",
            "-150",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid price shock"));
}

#[test]
fn test_stress_rejects_overflowing_shock() {
    margin_dash_cmd()
        .args([
            "stress",
            &snapshot(),
            "--position",
            "levered-0",
            "--asset",
            "SUI",
            "--shock",
            "100000000000000000000",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Arithmetic overflow"))
        .stderr(predicate::str::contains("panicked").not());
}

#[test]
fn test_cliff_table() {
    margin_dash_cmd()
        .args(["cliff", &snapshot(), "--asset", "SUI"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stress scan: SUI"))
        .stdout(predicate::str::contains("Liquidation cliff at -18.00%"))
        .stdout(predicate::str::contains("$2.00K -> $14.00K"));
}

#[test]
fn test_cliff_json() {
    let stress = run_json(&["cliff", &snapshot(), "--asset", "SUI"]);
    assert_eq!(stress["asset"], "SUI");
    assert_eq!(stress["curve"].as_array().unwrap().len(), 26);

    let cliff = &stress["cliff"];
    assert!((decimal(&cliff["shock_pct"]) + 18.0).abs() < 1e-9);
    assert!((decimal(&cliff["debt_multiplier"]) - 7.0).abs() < 1e-9);
    assert!((decimal(&cliff["debt_before_usd"]) - 2_000.0).abs() < 1e-9);
    assert!((decimal(&cliff["debt_after_usd"]) - 14_000.0).abs() < 1e-9);
}

#[test]
fn test_cliff_defaults_to_largest_collateral() {
    // USDC backs more collateral value than SUI in the fixture
    let stress = run_json(&["cliff", &snapshot()]);
    assert_eq!(stress["asset"], "USDC");
}

#[test]
fn test_curve_table() {
    margin_dash_cmd()
        .args(["curve", &snapshot(), "--pool", "USDC", "--steps", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Rate curve for USDC (current utilization 20.10%)",
        ))
        .stdout(predicate::str::contains("100.00%"));
}

#[test]
fn test_curve_json() {
    let points = run_json(&["curve", &snapshot(), "--pool", "USDC", "--steps", "4"]);
    let points = points.as_array().unwrap();
    assert_eq!(points.len(), 5);
    assert!(decimal(&points[0]["utilization"]).abs() < 1e-9);
    assert!((decimal(&points[0]["borrow_apr"]) - 0.02).abs() < 1e-9);
    // 0.02 + 0.06 * 0.7 + 0.15 * 0.3
    assert!((decimal(&points[4]["borrow_apr"]) - 0.107).abs() < 1e-9);
}

#[test]
fn test_curve_unknown_pool() {
    margin_dash_cmd()
        .args(["curve", &snapshot(), "--pool", "DOGE"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No pool for asset DOGE"));
}

#[test]
fn test_curve_zero_steps() {
    margin_dash_cmd()
        .args(["curve", &snapshot(), "--pool", "USDC", "--steps", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one step"));
}
