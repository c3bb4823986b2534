//! Share ledger conversions.
//!
//! A pool tracks each depositor's claim as shares. The exchange ratio between
//! shares and the underlying asset is `total_supply * scale / total_shares`,
//! falling back to `scale` (one share per unit) while the pool has no shares.
//!
//! Both the ratio and the conversion truncate toward zero. Rounding up, even by
//! one unit, would let repeated deposit/withdraw cycles pull value out of the
//! pool.
//!
//! # Example
//!
//! ```rust
//! use margin_dash_sim::ledger::{balance_to_shares, shares_to_balance};
//! use margin_dash_sim::FLOAT_SCALING;
//!
//! // Empty pool: 1:1
//! assert_eq!(shares_to_balance(500, 0, 0, FLOAT_SCALING).unwrap(), 500);
//!
//! // 3 units backing 2 shares
//! let shares = balance_to_shares(100, 3, 2, FLOAT_SCALING).unwrap();
//! assert!(shares_to_balance(shares, 3, 2, FLOAT_SCALING).unwrap() <= 100);
//! ```

use crate::error::SimError;
use crate::math::{mul_div, to_u64, RoundingDirection};

/// Exchange ratio between shares and balance, scaled by `scale`.
pub fn exchange_ratio(total_supply: u64, total_shares: u64, scale: u64) -> Result<u128, SimError> {
    if scale == 0 {
        return Err(SimError::DivisionByZero);
    }
    if total_shares == 0 {
        return Ok(u128::from(scale));
    }
    mul_div(
        u128::from(total_supply),
        u128::from(scale),
        u128::from(total_shares),
        RoundingDirection::Down,
    )
}

/// Converts shares to an asset balance, rounding down.
pub fn shares_to_balance(
    shares: u64,
    total_supply: u64,
    total_shares: u64,
    scale: u64,
) -> Result<u64, SimError> {
    convert_shares(shares, total_supply, total_shares, scale, RoundingDirection::Down)
}

/// Converts an asset balance to shares, rounding down.
pub fn balance_to_shares(
    balance: u64,
    total_supply: u64,
    total_shares: u64,
    scale: u64,
) -> Result<u64, SimError> {
    let ratio = exchange_ratio(total_supply, total_shares, scale)?;
    let shares = mul_div(
        u128::from(balance),
        u128::from(scale),
        ratio,
        RoundingDirection::Down,
    )?;
    to_u64(shares)
}

/// Converts shares to assets with an explicit rounding direction.
///
/// Debt conversions round up so that the borrower's obligation is never
/// understated; supply conversions round down.
pub fn convert_shares(
    shares: u64,
    total_amount: u64,
    total_shares: u64,
    scale: u64,
    rounding: RoundingDirection,
) -> Result<u64, SimError> {
    let ratio = exchange_ratio(total_amount, total_shares, scale)?;
    let amount = mul_div(u128::from(shares), ratio, u128::from(scale), rounding)?;
    to_u64(amount)
}
