//! Kinked interest rate model.
//!
//! Borrow APR is a piecewise-linear function of pool utilization with a single
//! kink at `optimal_utilization`:
//!
//! ```text
//! If utilization <= optimal:
//!     borrow_apr = base_rate + base_slope * utilization
//! If utilization > optimal:
//!     borrow_apr = base_rate + base_slope * optimal
//!                + excess_slope * (utilization - optimal)
//!
//! supply_apr = borrow_apr * utilization * (1 - protocol_spread)
//! ```
//!
//! The second piece starts from exactly the value of the first piece at the
//! kink, so the curve is continuous without any epsilon. All values are
//! fixed-point with [`FLOAT_SCALING`] and every product rounds down.
//!
//! # Example
//!
//! ```rust
//! use margin_dash_sim::irm::{borrow_apr, supply_apr, InterestConfig};
//!
//! let cfg = InterestConfig {
//!     base_rate: 20_000_000,             // 2%
//!     base_slope: 60_000_000,            // 6%
//!     optimal_utilization: 700_000_000,  // 70%
//!     excess_slope: 150_000_000,         // 15%
//! };
//!
//! let apr = borrow_apr(700_000_000, &cfg).unwrap();
//! assert_eq!(apr, 62_000_000); // 6.2%
//!
//! let supply = supply_apr(700_000_000, apr, 100_000_000).unwrap();
//! assert_eq!(supply, 39_060_000); // 3.906%
//! ```

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::math::{f_div_down, f_mul_down, to_u64, FLOAT_SCALING, FLOAT_SCALING_U128};

/// Parameters of the kinked rate curve, all scaled by [`FLOAT_SCALING`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterestConfig {
    /// Borrow APR at 0% utilization
    pub base_rate: u64,
    /// APR added per unit of utilization below the kink
    pub base_slope: u64,
    /// Utilization at which the curve steepens
    pub optimal_utilization: u64,
    /// APR added per unit of utilization above the kink
    pub excess_slope: u64,
}

impl InterestConfig {
    /// Checks `optimal_utilization <= 100%`.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.optimal_utilization > FLOAT_SCALING {
            return Err(SimError::invalid_config(format!(
                "optimal_utilization {} exceeds {}",
                self.optimal_utilization, FLOAT_SCALING
            )));
        }
        Ok(())
    }

    /// Borrow APR at 100% utilization.
    pub fn max_rate(&self) -> Result<u64, SimError> {
        borrow_apr(FLOAT_SCALING, self)
    }
}

/// A sampled point of the rate curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub utilization: u64,
    pub borrow_apr: u64,
    pub supply_apr: u64,
}

/// Calculates utilization as `borrow / supply` (0 when supply is 0).
pub fn utilization(supply: u64, borrow: u64) -> Result<u64, SimError> {
    if supply == 0 {
        return Ok(0);
    }
    to_u64(f_div_down(u128::from(borrow), u128::from(supply))?)
}

/// Calculates the borrow APR at a given utilization.
///
/// Utilization above 100% is clamped, so the result never exceeds the rate at
/// full utilization.
pub fn borrow_apr(utilization: u64, cfg: &InterestConfig) -> Result<u64, SimError> {
    let utilization = u128::from(utilization.min(FLOAT_SCALING));
    let optimal = u128::from(cfg.optimal_utilization);
    let base_rate = u128::from(cfg.base_rate);

    let apr = if utilization <= optimal {
        base_rate + f_mul_down(u128::from(cfg.base_slope), utilization)?
    } else {
        let at_kink = base_rate + f_mul_down(u128::from(cfg.base_slope), optimal)?;
        at_kink + f_mul_down(u128::from(cfg.excess_slope), utilization - optimal)?
    };

    to_u64(apr)
}

/// Calculates the supply APR from the borrow APR.
///
/// `spread` is the protocol's cut of borrow interest and must be below 100%.
pub fn supply_apr(utilization: u64, borrow_apr: u64, spread: u64) -> Result<u64, SimError> {
    if spread >= FLOAT_SCALING {
        return Err(SimError::invalid_config(format!(
            "protocol_spread {spread} must be below {FLOAT_SCALING}"
        )));
    }
    let utilization = u128::from(utilization.min(FLOAT_SCALING));
    let gross = f_mul_down(u128::from(borrow_apr), utilization)?;
    to_u64(f_mul_down(gross, FLOAT_SCALING_U128 - u128::from(spread))?)
}

/// Returns the utilization at which the borrow APR equals `target`, rounded down.
///
/// Inverse of [`borrow_apr`]. Returns `None` when the target is below the base
/// rate or above the rate at full utilization.
pub fn utilization_at_borrow_apr(target: u64, cfg: &InterestConfig) -> Result<Option<u64>, SimError> {
    if target < cfg.base_rate || target > cfg.max_rate()? {
        return Ok(None);
    }

    let at_kink = borrow_apr(cfg.optimal_utilization, cfg)?;
    let utilization = if target <= at_kink {
        if cfg.base_slope == 0 {
            0
        } else {
            f_div_down(
                u128::from(target - cfg.base_rate),
                u128::from(cfg.base_slope),
            )?
        }
    } else {
        // target > at_kink implies excess_slope > 0
        u128::from(cfg.optimal_utilization)
            + f_div_down(u128::from(target - at_kink), u128::from(cfg.excess_slope))?
    };

    Ok(Some(to_u64(utilization.min(FLOAT_SCALING_U128))?))
}

/// Samples the curve at `steps + 1` evenly spaced utilizations from 0 to 100%.
pub fn sample_curve(
    cfg: &InterestConfig,
    spread: u64,
    steps: u32,
) -> Result<Vec<CurvePoint>, SimError> {
    if steps == 0 {
        return Err(SimError::invalid_config("curve needs at least one step"));
    }
    (0..=steps)
        .map(|i| {
            let utilization =
                to_u64(u128::from(FLOAT_SCALING) * u128::from(i) / u128::from(steps))?;
            let borrow = borrow_apr(utilization, cfg)?;
            Ok(CurvePoint {
                utilization,
                borrow_apr: borrow,
                supply_apr: supply_apr(utilization, borrow, spread)?,
            })
        })
        .collect()
}
