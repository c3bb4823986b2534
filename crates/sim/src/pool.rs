//! Lending pool snapshots and pool-level analytics.
//!
//! A [`Pool`] bundles one pool's aggregate state with its configuration and
//! rate curve. All methods take `&self` and return new values; the snapshot is
//! never mutated.
//!
//! # Example
//!
//! ```rust
//! use margin_dash_sim::{InterestConfig, Pool, PoolConfig, PoolState};
//!
//! let pool = Pool {
//!     asset: "USDC".into(),
//!     decimals: 6,
//!     state: PoolState {
//!         supply: 1_000_000,
//!         borrow: 700_000,
//!         supply_shares: 1_000_000,
//!         borrow_shares: 700_000,
//!         last_update_timestamp: 0,
//!     },
//!     config: PoolConfig {
//!         supply_cap: 10_000_000,
//!         max_utilization_rate: 900_000_000,
//!         protocol_spread: 100_000_000,
//!         min_borrow: 10,
//!     },
//!     interest: InterestConfig {
//!         base_rate: 20_000_000,
//!         base_slope: 60_000_000,
//!         optimal_utilization: 700_000_000,
//!         excess_slope: 150_000_000,
//!     },
//! };
//!
//! let metrics = pool.metrics().unwrap();
//! assert_eq!(metrics.utilization, 700_000_000);
//! assert_eq!(metrics.borrow_apr, 62_000_000);
//! assert_eq!(metrics.supply_apr, 39_060_000);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::irm::{self, InterestConfig};
use crate::ledger::convert_shares;
use crate::math::{
    f_mul_down, mul_div_down, to_u64, zero_floor_sub, RoundingDirection, FLOAT_SCALING,
    FLOAT_SCALING_U128, YEAR_MS,
};
use crate::price::{AssetAmount, AssetId};

/// Aggregate state of a lending pool, in the asset's smallest unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolState {
    /// Total assets supplied, including accrued interest
    pub supply: u64,
    /// Total assets borrowed, including accrued interest
    pub borrow: u64,
    /// Outstanding supply shares
    pub supply_shares: u64,
    /// Outstanding borrow shares
    pub borrow_shares: u64,
    /// Millisecond timestamp of the last accrual
    pub last_update_timestamp: u64,
}

impl PoolState {
    /// Checks `borrow <= supply`.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.borrow > self.supply {
            return Err(SimError::invalid_snapshot(format!(
                "borrow {} exceeds supply {}",
                self.borrow, self.supply
            )));
        }
        Ok(())
    }

    /// Utilization (borrow / supply), scaled by [`FLOAT_SCALING`]
    pub fn utilization(&self) -> Result<u64, SimError> {
        irm::utilization(self.supply, self.borrow)
    }

    /// Converts supply shares to assets, rounding down.
    pub fn supply_balance(&self, shares: u64) -> Result<u64, SimError> {
        convert_shares(
            shares,
            self.supply,
            self.supply_shares,
            FLOAT_SCALING,
            RoundingDirection::Down,
        )
    }

    /// Converts borrow shares to owed assets, rounding up.
    pub fn borrow_debt(&self, shares: u64) -> Result<u64, SimError> {
        convert_shares(
            shares,
            self.borrow,
            self.borrow_shares,
            FLOAT_SCALING,
            RoundingDirection::Up,
        )
    }

    /// Assets available to withdraw or borrow
    pub fn available_liquidity(&self) -> u64 {
        zero_floor_sub(self.supply, self.borrow)
    }
}

/// Risk and capacity limits of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum total supply, in asset units
    pub supply_cap: u64,
    /// Utilization above which new borrows are refused (fixed-point)
    pub max_utilization_rate: u64,
    /// Protocol's cut of borrow interest (fixed-point, below 100%)
    pub protocol_spread: u64,
    /// Smallest allowed borrow, in asset units
    pub min_borrow: u64,
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        if self.protocol_spread >= FLOAT_SCALING {
            return Err(SimError::invalid_config(format!(
                "protocol_spread {} must be below {}",
                self.protocol_spread, FLOAT_SCALING
            )));
        }
        if self.max_utilization_rate > FLOAT_SCALING {
            return Err(SimError::invalid_config(format!(
                "max_utilization_rate {} exceeds {}",
                self.max_utilization_rate, FLOAT_SCALING
            )));
        }
        Ok(())
    }
}

/// A supplier's claim on a pool
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub shares: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral: Option<String>,
}

impl Position {
    /// Current asset balance of this position in `pool`
    pub fn balance(&self, pool: &PoolState) -> Result<u64, SimError> {
        pool.supply_balance(self.shares)
    }
}

/// Headline rates of a pool, scaled by [`FLOAT_SCALING`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMetrics {
    pub utilization: u64,
    pub borrow_apr: u64,
    pub supply_apr: u64,
}

/// Rates before and after a hypothetical deposit or borrow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AprImpact {
    pub before: PoolMetrics,
    pub after: PoolMetrics,
}

impl AprImpact {
    /// Change in supply APR (negative when rates fall)
    pub fn supply_apr_delta(&self) -> i128 {
        i128::from(self.after.supply_apr) - i128::from(self.before.supply_apr)
    }

    /// Change in borrow APR (negative when rates fall)
    pub fn borrow_apr_delta(&self) -> i128 {
        i128::from(self.after.borrow_apr) - i128::from(self.before.borrow_apr)
    }
}

/// One lending pool: asset, state, limits and rate curve
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pool {
    pub asset: AssetId,
    /// Native decimals of the pool asset
    pub decimals: u8,
    pub state: PoolState,
    pub config: PoolConfig,
    pub interest: InterestConfig,
}

impl Pool {
    /// Validates state and configuration.
    ///
    /// Configuration errors are reported as [`SimError::InvalidSnapshot`] since
    /// the whole pool arrives as one decoded snapshot.
    pub fn validate(&self) -> Result<(), SimError> {
        let in_pool = |e: SimError| match e {
            SimError::InvalidConfig { reason } | SimError::InvalidSnapshot { reason } => {
                SimError::invalid_snapshot(format!("pool {}: {reason}", self.asset))
            }
            other => other,
        };
        self.state.validate().map_err(in_pool)?;
        self.config.validate().map_err(in_pool)?;
        self.interest.validate().map_err(in_pool)?;
        Ok(())
    }

    /// Utilization, borrow APR and supply APR of the current state.
    pub fn metrics(&self) -> Result<PoolMetrics, SimError> {
        metrics_for(&self.state, &self.config, &self.interest)
    }

    /// Assets available to withdraw or borrow
    pub fn available_liquidity(&self) -> u64 {
        self.state.available_liquidity()
    }

    /// Additional assets that can be borrowed before hitting `max_utilization_rate`
    pub fn max_borrowable(&self) -> Result<u64, SimError> {
        let ceiling = to_u64(f_mul_down(
            u128::from(self.state.supply),
            u128::from(self.config.max_utilization_rate),
        )?)?;
        Ok(zero_floor_sub(ceiling, self.state.borrow))
    }

    /// Additional assets that can be supplied before hitting `supply_cap`
    pub fn supply_cap_headroom(&self) -> u64 {
        zero_floor_sub(self.config.supply_cap, self.state.supply)
    }

    /// Balance of a supplier position
    pub fn position_balance(&self, position: &Position) -> Result<u64, SimError> {
        position.balance(&self.state)
    }

    /// Debt owed for `borrow_shares`, as an amount of the pool asset
    pub fn debt_for_shares(&self, borrow_shares: u64) -> Result<AssetAmount, SimError> {
        Ok(AssetAmount {
            asset: self.asset.clone(),
            amount: self.state.borrow_debt(borrow_shares)?,
            decimals: self.decimals,
        })
    }

    /// Projects the pool state forward to `timestamp` with linear interest.
    ///
    /// Interest `borrow * borrow_apr * elapsed / YEAR_MS` is added to borrow;
    /// the suppliers' portion (net of protocol spread) is added to supply.
    /// Shares are unchanged, so each share is worth more afterwards.
    pub fn accrue_interest(&self, timestamp: u64) -> Result<PoolState, SimError> {
        let last_update = self.state.last_update_timestamp;
        if timestamp < last_update {
            return Err(SimError::InvalidInterestAccrual {
                timestamp,
                last_update,
            });
        }

        let elapsed = timestamp - last_update;
        let borrow_apr = self.metrics()?.borrow_apr;
        let annual = f_mul_down(u128::from(self.state.borrow), u128::from(borrow_apr))?;
        let interest = to_u64(mul_div_down(annual, u128::from(elapsed), u128::from(YEAR_MS))?)?;
        let to_suppliers = to_u64(f_mul_down(
            u128::from(interest),
            FLOAT_SCALING_U128 - u128::from(self.config.protocol_spread),
        )?)?;

        Ok(PoolState {
            supply: self
                .state
                .supply
                .checked_add(to_suppliers)
                .ok_or(SimError::ArithmeticOverflow)?,
            borrow: self
                .state
                .borrow
                .checked_add(interest)
                .ok_or(SimError::ArithmeticOverflow)?,
            last_update_timestamp: timestamp,
            ..self.state
        })
    }

    /// Rates before and after supplying `amount` more assets.
    pub fn supply_apr_impact(&self, amount: u64) -> Result<AprImpact, SimError> {
        let supply = self
            .state
            .supply
            .checked_add(amount)
            .ok_or(SimError::ArithmeticOverflow)?;
        if supply > self.config.supply_cap {
            return Err(SimError::SupplyCapExceeded {
                asset: self.asset.clone(),
                cap: self.config.supply_cap,
            });
        }

        let after = PoolState {
            supply,
            ..self.state
        };
        Ok(AprImpact {
            before: self.metrics()?,
            after: metrics_for(&after, &self.config, &self.interest)?,
        })
    }

    /// Rates before and after borrowing `amount` assets.
    pub fn borrow_apr_impact(&self, amount: u64) -> Result<AprImpact, SimError> {
        if amount < self.config.min_borrow {
            return Err(SimError::BelowMinBorrow {
                asset: self.asset.clone(),
                amount,
                min_borrow: self.config.min_borrow,
            });
        }
        if amount > self.max_borrowable()? {
            return Err(SimError::ExceedsMaxUtilization {
                asset: self.asset.clone(),
            });
        }

        let after = PoolState {
            borrow: self.state.borrow + amount,
            ..self.state
        };
        Ok(AprImpact {
            before: self.metrics()?,
            after: metrics_for(&after, &self.config, &self.interest)?,
        })
    }
}

/// Computes utilization and both APRs for a pool state.
pub fn metrics_for(
    state: &PoolState,
    config: &PoolConfig,
    interest: &InterestConfig,
) -> Result<PoolMetrics, SimError> {
    let utilization = state.utilization()?;
    let borrow_apr = irm::borrow_apr(utilization, interest)?;
    let supply_apr = irm::supply_apr(utilization, borrow_apr, config.protocol_spread)?;
    Ok(PoolMetrics {
        utilization,
        borrow_apr,
        supply_apr,
    })
}
