//! Display types for dashboard reports.
//!
//! Every view is built from an engine result with `From`, so the conversion
//! from fixed point happens in exactly one place.

use margin_dash_sim::{
    AssetId, CliffReport, CurvePoint, DashboardReport, Evaluation, PoolReport,
    RiskDistributionBucket, StressPoint, StressReport, SupplierBalance, FLOAT_SCALING,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Decimal places of the engine's fixed-point scale
const FIXED_SCALE: u32 = FLOAT_SCALING.ilog10();

/// Largest scale a `Decimal` can carry
const MAX_DECIMAL_SCALE: u32 = 28;

/// Liquidation status of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Healthy,
    Liquidatable,
    /// Could not be priced or resolved
    Unknown,
}

impl PositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Healthy => "healthy",
            PositionStatus::Liquidatable => "liquidatable",
            PositionStatus::Unknown => "unknown",
        }
    }
}

/// Math utilities for converting engine values.
pub struct DisplayMath;

impl DisplayMath {
    /// Convert a fixed-point value (scaled by 10^9) to a decimal.
    ///
    /// Values beyond `Decimal`'s 96-bit range saturate to `Decimal::MAX`.
    pub fn fixed_to_decimal(value: u128) -> Decimal {
        i128::try_from(value)
            .ok()
            .and_then(|v| Decimal::try_from_i128_with_scale(v, FIXED_SCALE).ok())
            .map_or(Decimal::MAX, |d| d.normalize())
    }

    /// Convert a signed fixed-point value (scaled by 10^9) to a decimal.
    pub fn signed_fixed_to_decimal(value: i128) -> Decimal {
        match Decimal::try_from_i128_with_scale(value, FIXED_SCALE) {
            Ok(d) => d.normalize(),
            Err(_) if value.is_negative() => Decimal::MIN,
            Err(_) => Decimal::MAX,
        }
    }

    /// Convert an amount in an asset's smallest unit to whole units.
    ///
    /// Digits beyond 28 decimal places are truncated.
    pub fn amount_to_decimal(amount: u64, decimals: u8) -> Decimal {
        let decimals = u32::from(decimals);
        let (mantissa, scale) = if decimals > MAX_DECIMAL_SCALE {
            let shift = 10u128
                .checked_pow(decimals - MAX_DECIMAL_SCALE)
                .unwrap_or(u128::MAX);
            (u128::from(amount) / shift, MAX_DECIMAL_SCALE)
        } else {
            (u128::from(amount), decimals)
        };
        i128::try_from(mantissa)
            .ok()
            .and_then(|m| Decimal::try_from_i128_with_scale(m, scale).ok())
            .map_or(Decimal::MAX, |d| d.normalize())
    }

    /// Convert basis points to a percentage (e.g. -1800 -> -18).
    pub fn bps_to_percent(bps: i64) -> Decimal {
        Decimal::new(bps, 2).normalize()
    }

    /// Convert a decimal to basis points (integer).
    ///
    /// Rounds half to even and saturates at the `i64` range.
    pub fn decimal_to_bps(d: Decimal) -> i64 {
        let saturated = if d.is_sign_negative() { i64::MIN } else { i64::MAX };
        d.checked_mul(Decimal::from(10_000))
            .map(|bps| bps.round())
            .and_then(|bps| i64::try_from(bps).ok())
            .unwrap_or(saturated)
    }

    /// Convert a percentage to basis points (e.g. -17.5 -> -1750).
    pub fn percent_to_bps(percent: Decimal) -> i64 {
        Self::decimal_to_bps(percent / Decimal::ONE_HUNDRED)
    }
}

/// A supplier's balance, in whole units of the pool asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierView {
    pub owner: String,
    pub balance: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral: Option<String>,
}

/// Pool health and rates for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolView {
    pub asset: AssetId,
    /// Total supplied, in whole units
    pub supply: Decimal,
    /// Total borrowed, in whole units
    pub borrow: Decimal,
    /// Utilization as a fraction (0.7 = 70%)
    pub utilization: Decimal,
    /// Borrow APR as a fraction
    pub borrow_apr: Decimal,
    /// Supply APR as a fraction
    pub supply_apr: Decimal,
    pub available_liquidity: Decimal,
    pub max_borrowable: Decimal,
    pub supply_cap_headroom: Decimal,
    pub suppliers: Vec<SupplierView>,
}

impl From<&PoolReport> for PoolView {
    fn from(report: &PoolReport) -> Self {
        let decimals = report.pool.decimals;
        let amount = |v: u64| DisplayMath::amount_to_decimal(v, decimals);
        Self {
            asset: report.pool.asset.clone(),
            supply: amount(report.pool.state.supply),
            borrow: amount(report.pool.state.borrow),
            utilization: DisplayMath::fixed_to_decimal(u128::from(report.metrics.utilization)),
            borrow_apr: DisplayMath::fixed_to_decimal(u128::from(report.metrics.borrow_apr)),
            supply_apr: DisplayMath::fixed_to_decimal(u128::from(report.metrics.supply_apr)),
            available_liquidity: amount(report.available_liquidity),
            max_borrowable: amount(report.max_borrowable),
            supply_cap_headroom: amount(report.supply_cap_headroom),
            suppliers: report
                .suppliers
                .iter()
                .map(|s| SupplierView::new(s, decimals))
                .collect(),
        }
    }
}

impl SupplierView {
    fn new(balance: &SupplierBalance, decimals: u8) -> Self {
        Self {
            owner: balance.owner.clone(),
            balance: DisplayMath::amount_to_decimal(balance.balance, decimals),
            referral: balance.referral.clone(),
        }
    }
}

/// One position's risk for display.
///
/// Numeric fields are `None` when the position could not be evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionView {
    pub id: String,
    pub status: PositionStatus,
    pub collateral_usd: Option<Decimal>,
    pub debt_usd: Option<Decimal>,
    /// Collateral over debt (999 when debt-free)
    pub risk_ratio: Option<Decimal>,
    /// Percentage the risk ratio sits above the liquidation threshold
    pub distance_to_liquidation: Option<Decimal>,
    pub estimated_reward_usd: Option<Decimal>,
    /// Why the position could not be evaluated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&Evaluation> for PositionView {
    fn from(evaluation: &Evaluation) -> Self {
        match evaluation {
            Evaluation::Evaluable(p) => Self {
                id: p.position_id.clone(),
                status: if p.is_liquidatable {
                    PositionStatus::Liquidatable
                } else {
                    PositionStatus::Healthy
                },
                collateral_usd: Some(DisplayMath::fixed_to_decimal(p.collateral_usd)),
                debt_usd: Some(DisplayMath::fixed_to_decimal(p.debt_usd)),
                risk_ratio: Some(DisplayMath::fixed_to_decimal(p.risk_ratio)),
                distance_to_liquidation: Some(DisplayMath::signed_fixed_to_decimal(
                    p.distance_to_liquidation,
                )),
                estimated_reward_usd: Some(DisplayMath::fixed_to_decimal(p.estimated_reward_usd)),
                reason: None,
            },
            Evaluation::Unevaluable {
                position_id,
                reason,
            } => Self {
                id: position_id.clone(),
                status: PositionStatus::Unknown,
                collateral_usd: None,
                debt_usd: None,
                risk_ratio: None,
                distance_to_liquidation: None,
                estimated_reward_usd: None,
                reason: Some(reason.to_string()),
            },
        }
    }
}

/// One bar of the risk histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketView {
    pub label: String,
    pub count: usize,
    pub total_debt_usd: Decimal,
    pub color: String,
}

impl From<&RiskDistributionBucket> for BucketView {
    fn from(bucket: &RiskDistributionBucket) -> Self {
        Self {
            label: bucket.label.clone(),
            count: bucket.count,
            total_debt_usd: DisplayMath::fixed_to_decimal(bucket.total_debt_usd),
            color: bucket.color.clone(),
        }
    }
}

/// Debt at risk for one scanned shock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressPointView {
    /// Price change in percent (-18 = 18% drop)
    pub shock_pct: Decimal,
    pub debt_at_risk_usd: Decimal,
    pub liquidatable: usize,
    pub unevaluable: usize,
}

impl From<&StressPoint> for StressPointView {
    fn from(point: &StressPoint) -> Self {
        Self {
            shock_pct: DisplayMath::bps_to_percent(point.shock_bps),
            debt_at_risk_usd: DisplayMath::fixed_to_decimal(point.debt_at_risk_usd),
            liquidatable: point.liquidatable,
            unevaluable: point.unevaluable,
        }
    }
}

/// The detected liquidation cliff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliffView {
    pub shock_pct: Decimal,
    /// Growth of debt at risk across the cliff (7 = sevenfold)
    pub debt_multiplier: Decimal,
    pub debt_before_usd: Decimal,
    pub debt_after_usd: Decimal,
}

impl From<&CliffReport> for CliffView {
    fn from(cliff: &CliffReport) -> Self {
        Self {
            shock_pct: DisplayMath::bps_to_percent(cliff.shock_bps),
            debt_multiplier: DisplayMath::fixed_to_decimal(cliff.debt_multiplier),
            debt_before_usd: DisplayMath::fixed_to_decimal(cliff.debt_before_usd),
            debt_after_usd: DisplayMath::fixed_to_decimal(cliff.debt_after_usd),
        }
    }
}

/// Stress scan results for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressView {
    pub asset: AssetId,
    pub curve: Vec<StressPointView>,
    /// `None` means no cascade risk in the scanned range
    pub cliff: Option<CliffView>,
}

impl From<&StressReport> for StressView {
    fn from(report: &StressReport) -> Self {
        Self {
            asset: report.asset.clone(),
            curve: report.curve.iter().map(StressPointView::from).collect(),
            cliff: report.cliff.as_ref().map(CliffView::from),
        }
    }
}

/// A sampled point of a pool's rate curve, as fractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePointView {
    pub utilization: Decimal,
    pub borrow_apr: Decimal,
    pub supply_apr: Decimal,
}

impl From<&CurvePoint> for CurvePointView {
    fn from(point: &CurvePoint) -> Self {
        Self {
            utilization: DisplayMath::fixed_to_decimal(u128::from(point.utilization)),
            borrow_apr: DisplayMath::fixed_to_decimal(u128::from(point.borrow_apr)),
            supply_apr: DisplayMath::fixed_to_decimal(u128::from(point.supply_apr)),
        }
    }
}

/// Headline numbers across all positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryView {
    pub positions: usize,
    pub liquidatable: usize,
    pub unevaluable: usize,
    pub total_debt_usd: Decimal,
    /// Debt of currently liquidatable positions
    pub debt_at_risk_usd: Decimal,
}

impl From<&DashboardReport> for SummaryView {
    fn from(report: &DashboardReport) -> Self {
        let debt_at_risk = report
            .liquidatable()
            .filter_map(Evaluation::as_evaluable)
            .fold(0u128, |acc, p| acc.saturating_add(p.debt_usd));
        Self {
            positions: report.evaluations.len(),
            liquidatable: report.liquidatable().count(),
            unevaluable: report.unevaluable_count(),
            total_debt_usd: DisplayMath::fixed_to_decimal(report.total_debt_usd()),
            debt_at_risk_usd: DisplayMath::fixed_to_decimal(debt_at_risk),
        }
    }
}

/// Complete dashboard for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    /// Snapshot time in milliseconds
    pub taken_at: u64,
    pub summary: SummaryView,
    pub pools: Vec<PoolView>,
    pub positions: Vec<PositionView>,
    pub distribution: Vec<BucketView>,
    pub stress: Option<StressView>,
}

impl From<&DashboardReport> for DashboardView {
    fn from(report: &DashboardReport) -> Self {
        Self {
            taken_at: report.taken_at,
            summary: SummaryView::from(report),
            pools: report.pools.iter().map(PoolView::from).collect(),
            positions: report.evaluations.iter().map(PositionView::from).collect(),
            distribution: report.distribution.iter().map(BucketView::from).collect(),
            stress: report.stress.as_ref().map(StressView::from),
        }
    }
}

impl DashboardView {
    /// Check if any position can be liquidated right now.
    pub fn has_liquidatable(&self) -> bool {
        self.summary.liquidatable > 0
    }

    pub fn position(&self, id: &str) -> Option<&PositionView> {
        self.positions.iter().find(|p| p.id == id)
    }
}
