//! Price shock simulation and liquidation cliff detection.
//!
//! A stress scan re-evaluates every position while one asset's price is
//! stepped down, and tracks the USD debt held by liquidatable positions at
//! each step. A "cliff" is the step where that debt jumps by the largest
//! multiple, provided the multiple reaches [`StressConfig::cliff_multiplier`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SimError;
use crate::math::{mul_div_down, BPS_SCALE, FLOAT_SCALING, FLOAT_SCALING_U128};
use crate::price::{AssetId, PriceBook};
use crate::risk::{Evaluation, MarginPosition, RiskEngine};

/// A hypothetical move in one asset's price
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceShock {
    pub asset: AssetId,
    /// Price change in basis points; -10_000 wipes the price out
    pub shock_bps: i64,
}

impl PriceShock {
    pub fn new(asset: impl Into<AssetId>, shock_bps: i64) -> Self {
        Self {
            asset: asset.into(),
            shock_bps,
        }
    }

    /// Builds a shock from whole percent, e.g. `-30` for a 30% drop.
    pub fn percent(asset: impl Into<AssetId>, percent: i64) -> Self {
        Self::new(asset, percent.saturating_mul(100))
    }

    /// Returns the shocked price book.
    pub fn apply(&self, prices: &PriceBook) -> Result<PriceBook, SimError> {
        prices.with_shock(&self.asset, self.shock_bps)
    }
}

/// Evaluates `position` under `shock`.
///
/// A zero shock evaluates against an identical book, so the result equals
/// [`RiskEngine::evaluate`] on the unshocked prices.
pub fn simulate(
    engine: &RiskEngine,
    position: &MarginPosition,
    prices: &PriceBook,
    shock: &PriceShock,
) -> Result<Evaluation, SimError> {
    let shocked = shock.apply(prices)?;
    Ok(engine.evaluate(position, &shocked))
}

/// Range and sensitivity of a stress scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct StressConfig {
    /// First shock scanned, in bps
    pub start_bps: i64,
    /// Last shock scanned, in bps (inclusive when reached exactly)
    pub end_bps: i64,
    /// Distance between scanned shocks, in bps; its sign sets the direction
    pub step_bps: i64,
    /// Minimum step-over-step growth of debt at risk that counts as a cliff
    /// (2.0 = doubling), scaled by [`FLOAT_SCALING`]
    pub cliff_multiplier: u64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            start_bps: 0,
            end_bps: -5_000,
            step_bps: -200,
            cliff_multiplier: 2 * FLOAT_SCALING,
        }
    }
}

impl StressConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        if self.step_bps == 0 {
            return Err(SimError::invalid_config("step_bps must be non-zero"));
        }
        for bps in [self.start_bps, self.end_bps] {
            if !(-BPS_SCALE..=BPS_SCALE).contains(&bps) {
                return Err(SimError::InvalidShock { shock_bps: bps });
            }
        }
        let span = self.end_bps - self.start_bps;
        if span != 0 && span.signum() != self.step_bps.signum() {
            return Err(SimError::invalid_config(format!(
                "step_bps {} moves away from end_bps {}",
                self.step_bps, self.end_bps
            )));
        }
        if self.cliff_multiplier < FLOAT_SCALING {
            return Err(SimError::invalid_config(format!(
                "cliff_multiplier {} is below 1.0",
                self.cliff_multiplier
            )));
        }
        Ok(())
    }

    /// Shocks scanned, in order.
    pub fn shocks(&self) -> Vec<i64> {
        let mut shocks = Vec::new();
        let mut next = Some(self.start_bps);
        while let Some(bps) = next {
            let in_range = (self.step_bps < 0 && bps >= self.end_bps)
                || (self.step_bps > 0 && bps <= self.end_bps);
            if !in_range {
                break;
            }
            shocks.push(bps);
            next = bps.checked_add(self.step_bps);
        }
        shocks
    }
}

/// Aggregate outcome of one scanned shock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StressPoint {
    pub shock_bps: i64,
    /// Total debt of liquidatable positions, scaled by [`FLOAT_SCALING`]
    pub debt_at_risk_usd: u128,
    pub liquidatable: usize,
    pub unevaluable: usize,
}

/// The largest step-over-step jump in debt at risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliffReport {
    /// Shock at which the jumped-to debt level is first reached
    pub shock_bps: i64,
    /// `debt_after_usd / debt_before_usd`, scaled by [`FLOAT_SCALING`]
    pub debt_multiplier: u128,
    pub debt_before_usd: u128,
    pub debt_after_usd: u128,
}

/// Scans shocks to `asset` and aggregates liquidatable debt at each step.
///
/// Unevaluable positions are counted but contribute no debt.
pub fn stress_curve(
    engine: &RiskEngine,
    positions: &[MarginPosition],
    prices: &PriceBook,
    asset: &AssetId,
    config: &StressConfig,
) -> Result<Vec<StressPoint>, SimError> {
    config.validate()?;
    config
        .shocks()
        .into_iter()
        .map(|shock_bps| {
            let shocked = prices.with_shock(asset, shock_bps)?;
            let mut point = StressPoint {
                shock_bps,
                debt_at_risk_usd: 0,
                liquidatable: 0,
                unevaluable: 0,
            };
            for position in positions {
                match engine.evaluate_quiet(position, &shocked) {
                    Evaluation::Evaluable(p) if p.is_liquidatable => {
                        point.liquidatable += 1;
                        point.debt_at_risk_usd = point
                            .debt_at_risk_usd
                            .checked_add(p.debt_usd)
                            .ok_or(SimError::ArithmeticOverflow)?;
                    }
                    Evaluation::Evaluable(_) => {}
                    Evaluation::Unevaluable { .. } => point.unevaluable += 1,
                }
            }
            Ok(point)
        })
        .collect()
}

/// Scans shocks to `asset` and picks the cliff from the resulting curve.
pub fn stress_scan(
    engine: &RiskEngine,
    positions: &[MarginPosition],
    prices: &PriceBook,
    asset: &AssetId,
    config: &StressConfig,
) -> Result<(Vec<StressPoint>, Option<CliffReport>), SimError> {
    let curve = stress_curve(engine, positions, prices, asset, config)?;
    let cliff = find_cliff(&curve, config.cliff_multiplier)?;
    debug!(
        asset = %asset,
        steps = curve.len(),
        cliff_bps = ?cliff.map(|c| c.shock_bps),
        "cliff scan complete"
    );
    Ok((curve, cliff))
}

/// Finds the liquidation cliff for shocks to `asset`.
///
/// Returns `None` when no step multiplies debt at risk by at least
/// `cliff_multiplier`.
pub fn detect_cliff(
    engine: &RiskEngine,
    positions: &[MarginPosition],
    prices: &PriceBook,
    asset: &AssetId,
    config: &StressConfig,
) -> Result<Option<CliffReport>, SimError> {
    stress_scan(engine, positions, prices, asset, config).map(|(_, cliff)| cliff)
}

/// Picks the largest qualifying jump from a scanned curve.
///
/// Steps from zero debt have no defined multiple and are skipped. Ties keep
/// the shallowest shock.
pub fn find_cliff(curve: &[StressPoint], cliff_multiplier: u64) -> Result<Option<CliffReport>, SimError> {
    let mut best: Option<CliffReport> = None;
    for pair in curve.windows(2) {
        let (before, after) = (&pair[0], &pair[1]);
        if before.debt_at_risk_usd == 0 {
            continue;
        }
        let multiplier = mul_div_down(
            after.debt_at_risk_usd,
            FLOAT_SCALING_U128,
            before.debt_at_risk_usd,
        )?;
        if multiplier < u128::from(cliff_multiplier) {
            continue;
        }
        if best.is_none_or(|b| multiplier > b.debt_multiplier) {
            best = Some(CliffReport {
                shock_bps: after.shock_bps,
                debt_multiplier: multiplier,
                debt_before_usd: before.debt_at_risk_usd,
                debt_after_usd: after.debt_at_risk_usd,
            });
        }
    }
    Ok(best)
}

/// The collateral asset backing the most USD across evaluable positions.
///
/// Used as the default stress target. Ties resolve to the smaller asset id.
pub fn dominant_collateral_asset(evaluations: &[Evaluation]) -> Option<AssetId> {
    let mut totals: HashMap<&AssetId, u128> = HashMap::new();
    for position in evaluations.iter().filter_map(Evaluation::as_evaluable) {
        for value in &position.collateral {
            let total = totals.entry(&value.asset).or_default();
            *total = total.saturating_add(value.usd_value);
        }
    }
    totals
        .into_iter()
        .max_by(|(a_id, a), (b_id, b)| a.cmp(b).then_with(|| b_id.cmp(a_id)))
        .map(|(asset, _)| asset.clone())
}
