//! Per-position liquidation risk.
//!
//! The [`RiskEngine`] values a position's collateral and debt in USD and
//! compares their ratio against the liquidation threshold:
//!
//! ```text
//! risk_ratio              = collateral_usd / debt_usd   (SENTINEL_SAFE when debt is 0)
//! is_liquidatable         = risk_ratio <= liquidation_threshold
//! distance_to_liquidation = (risk_ratio - threshold) / threshold * 100
//! estimated_reward_usd    = debt_usd * liquidation_reward   (when liquidatable)
//! ```
//!
//! A position whose assets cannot all be priced is never valued as if the
//! missing asset were worth zero; it becomes [`Evaluation::Unevaluable`].

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::SimError;
use crate::math::{f_mul_down, mul_div_down, FLOAT_SCALING, FLOAT_SCALING_U128};
use crate::price::{usd_value, AssetAmount, AssetId, PriceBook};

/// Risk ratio reported for a position with no debt (999.0)
pub const SENTINEL_SAFE: u128 = 999 * FLOAT_SCALING_U128;

/// Liquidation parameters, scaled by [`FLOAT_SCALING`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RiskParams {
    /// Risk ratio at or below which a position can be liquidated (e.g. 1.2)
    pub liquidation_threshold: u64,
    /// Liquidator reward as a fraction of the debt repaid
    pub liquidation_reward: u64,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            liquidation_threshold: 1_200_000_000,
            liquidation_reward: 50_000_000,
        }
    }
}

impl RiskParams {
    pub fn validate(&self) -> Result<(), SimError> {
        if self.liquidation_threshold == 0 {
            return Err(SimError::invalid_config("liquidation_threshold must be positive"));
        }
        if self.liquidation_reward > FLOAT_SCALING {
            return Err(SimError::invalid_config(format!(
                "liquidation_reward {} exceeds {}",
                self.liquidation_reward, FLOAT_SCALING
            )));
        }
        Ok(())
    }
}

/// A borrower's collateral and outstanding debt, as asset amounts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarginPosition {
    pub id: String,
    pub collateral: Vec<AssetAmount>,
    pub debt: Vec<AssetAmount>,
}

/// An asset amount together with its USD value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetValue {
    pub asset: AssetId,
    pub amount: u64,
    pub decimals: u8,
    /// USD value scaled by [`FLOAT_SCALING`]
    pub usd_value: u128,
}

/// Risk metrics for a fully priced position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtRiskPosition {
    pub position_id: String,
    pub collateral: Vec<AssetValue>,
    pub debt: Vec<AssetValue>,
    pub collateral_usd: u128,
    pub debt_usd: u128,
    pub liquidation_threshold: u64,
    /// `collateral_usd / debt_usd`, or [`SENTINEL_SAFE`] without debt
    pub risk_ratio: u128,
    pub is_liquidatable: bool,
    /// Signed percentage, scaled by [`FLOAT_SCALING`]; negative once liquidatable
    pub distance_to_liquidation: i128,
    pub estimated_reward_usd: u128,
}

/// Outcome of evaluating one position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    Evaluable(AtRiskPosition),
    Unevaluable { position_id: String, reason: SimError },
}

impl Evaluation {
    pub fn position_id(&self) -> &str {
        match self {
            Evaluation::Evaluable(p) => &p.position_id,
            Evaluation::Unevaluable { position_id, .. } => position_id,
        }
    }

    pub fn as_evaluable(&self) -> Option<&AtRiskPosition> {
        match self {
            Evaluation::Evaluable(p) => Some(p),
            Evaluation::Unevaluable { .. } => None,
        }
    }

    pub fn is_evaluable(&self) -> bool {
        matches!(self, Evaluation::Evaluable(_))
    }

    /// False for unevaluable positions.
    pub fn is_liquidatable(&self) -> bool {
        self.as_evaluable().is_some_and(|p| p.is_liquidatable)
    }

    /// The failure reason, if unevaluable.
    pub fn reason(&self) -> Option<&SimError> {
        match self {
            Evaluation::Evaluable(_) => None,
            Evaluation::Unevaluable { reason, .. } => Some(reason),
        }
    }
}

/// Evaluates margin positions against a price book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskEngine {
    params: RiskParams,
}

impl RiskEngine {
    pub fn new(params: RiskParams) -> Result<Self, SimError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &RiskParams {
        &self.params
    }

    /// Evaluates one position. Failures are logged and returned as
    /// [`Evaluation::Unevaluable`].
    pub fn evaluate(&self, position: &MarginPosition, prices: &PriceBook) -> Evaluation {
        let evaluation = self.evaluate_quiet(position, prices);
        if let Evaluation::Unevaluable {
            position_id,
            reason,
        } = &evaluation
        {
            warn!(position = %position_id, %reason, "position is unevaluable");
        }
        evaluation
    }

    /// Evaluates every position, in input order.
    pub fn evaluate_all(&self, positions: &[MarginPosition], prices: &PriceBook) -> Vec<Evaluation> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            positions
                .par_iter()
                .map(|p| self.evaluate(p, prices))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            positions.iter().map(|p| self.evaluate(p, prices)).collect()
        }
    }

    /// Same as [`evaluate`](Self::evaluate) without logging, for repeated
    /// stress scans.
    pub(crate) fn evaluate_quiet(&self, position: &MarginPosition, prices: &PriceBook) -> Evaluation {
        match self.assess(position, prices) {
            Ok(at_risk) => Evaluation::Evaluable(at_risk),
            Err(reason) => Evaluation::Unevaluable {
                position_id: position.id.clone(),
                reason,
            },
        }
    }

    fn assess(&self, position: &MarginPosition, prices: &PriceBook) -> Result<AtRiskPosition, SimError> {
        let collateral = value_holdings(&position.collateral, prices)?;
        let debt = value_holdings(&position.debt, prices)?;
        let collateral_usd = total_usd(&collateral)?;
        let debt_usd = total_usd(&debt)?;

        let threshold = self.params.liquidation_threshold;
        let risk_ratio = risk_ratio(collateral_usd, debt_usd)?;
        let is_liquidatable = risk_ratio <= u128::from(threshold);
        let estimated_reward_usd = if is_liquidatable {
            f_mul_down(debt_usd, u128::from(self.params.liquidation_reward))?
        } else {
            0
        };

        Ok(AtRiskPosition {
            position_id: position.id.clone(),
            collateral,
            debt,
            collateral_usd,
            debt_usd,
            liquidation_threshold: threshold,
            risk_ratio,
            is_liquidatable,
            distance_to_liquidation: distance_to_liquidation(risk_ratio, threshold)?,
            estimated_reward_usd,
        })
    }
}

/// `collateral_usd / debt_usd` at [`FLOAT_SCALING`], or [`SENTINEL_SAFE`]
/// when there is no debt.
pub fn risk_ratio(collateral_usd: u128, debt_usd: u128) -> Result<u128, SimError> {
    if debt_usd == 0 {
        return Ok(SENTINEL_SAFE);
    }
    mul_div_down(collateral_usd, FLOAT_SCALING_U128, debt_usd)
}

/// `(risk_ratio - threshold) / threshold * 100`, as a percentage scaled by
/// [`FLOAT_SCALING`]. Truncates toward zero.
pub fn distance_to_liquidation(risk_ratio: u128, threshold: u64) -> Result<i128, SimError> {
    if threshold == 0 {
        return Err(SimError::DivisionByZero);
    }
    let ratio = i128::try_from(risk_ratio).map_err(|_| SimError::ArithmeticOverflow)?;
    let diff = ratio - i128::from(threshold);
    let percent_scale = 100 * i128::from(FLOAT_SCALING);
    diff.checked_mul(percent_scale)
        .map(|scaled| scaled / i128::from(threshold))
        .ok_or(SimError::ArithmeticOverflow)
}

fn value_holdings(holdings: &[AssetAmount], prices: &PriceBook) -> Result<Vec<AssetValue>, SimError> {
    holdings
        .iter()
        .map(|h| {
            let quote = prices.quote(&h.asset)?;
            Ok(AssetValue {
                asset: h.asset.clone(),
                amount: h.amount,
                decimals: h.decimals,
                usd_value: usd_value(h.amount, h.decimals, quote)?,
            })
        })
        .collect()
}

fn total_usd(values: &[AssetValue]) -> Result<u128, SimError> {
    values.iter().try_fold(0u128, |acc, v| {
        acc.checked_add(v.usd_value)
            .ok_or(SimError::ArithmeticOverflow)
    })
}
