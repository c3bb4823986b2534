//! Fixed-point arithmetic helpers.
//!
//! Every rate, ratio and fraction in the engine is an integer scaled by
//! [`FLOAT_SCALING`] (`1_000_000_000` = 1.0 = 100%). USD values share the same
//! scale. Products are formed in `u128` with checked multiplication, so an
//! overflow surfaces as [`SimError::ArithmeticOverflow`] before any division
//! truncates it.

use crate::error::SimError;

/// Fixed-point scale for rates, ratios, fractions and USD values (10^9)
pub const FLOAT_SCALING: u64 = 1_000_000_000;

/// [`FLOAT_SCALING`] widened for intermediate products
pub const FLOAT_SCALING_U128: u128 = FLOAT_SCALING as u128;

/// Basis points in 1.0
pub const BPS_SCALE: i64 = 10_000;

/// Milliseconds in a 365-day year
pub const YEAR_MS: u64 = 365 * 24 * 60 * 60 * 1000;

/// Rounding direction for fixed-point division
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingDirection {
    Up,
    Down,
}

/// Computes `a * b / denominator` with a checked `u128` intermediate.
pub fn mul_div(
    a: u128,
    b: u128,
    denominator: u128,
    rounding: RoundingDirection,
) -> Result<u128, SimError> {
    if denominator == 0 {
        return Err(SimError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(SimError::ArithmeticOverflow)?;
    let quotient = product / denominator;
    match rounding {
        RoundingDirection::Down => Ok(quotient),
        RoundingDirection::Up if product % denominator == 0 => Ok(quotient),
        RoundingDirection::Up => quotient.checked_add(1).ok_or(SimError::ArithmeticOverflow),
    }
}

/// `a * b / denominator`, rounded down
pub fn mul_div_down(a: u128, b: u128, denominator: u128) -> Result<u128, SimError> {
    mul_div(a, b, denominator, RoundingDirection::Down)
}

/// `a * b / denominator`, rounded up
pub fn mul_div_up(a: u128, b: u128, denominator: u128) -> Result<u128, SimError> {
    mul_div(a, b, denominator, RoundingDirection::Up)
}

/// Fixed-point multiplication, rounded down
pub fn f_mul_down(a: u128, b: u128) -> Result<u128, SimError> {
    mul_div_down(a, b, FLOAT_SCALING_U128)
}

/// Fixed-point division, rounded down
pub fn f_div_down(a: u128, b: u128) -> Result<u128, SimError> {
    mul_div_down(a, FLOAT_SCALING_U128, b)
}

/// Narrows a `u128` intermediate back to `u64`.
pub fn to_u64(value: u128) -> Result<u64, SimError> {
    u64::try_from(value).map_err(|_| SimError::ArithmeticOverflow)
}

/// Returns `10^exponent` or an overflow error.
pub fn pow10(exponent: u32) -> Result<u128, SimError> {
    10u128
        .checked_pow(exponent)
        .ok_or(SimError::ArithmeticOverflow)
}

/// Returns `x - y`, or zero when `y > x`.
pub fn zero_floor_sub(x: u64, y: u64) -> u64 {
    x.saturating_sub(y)
}

/// Formats a fixed-point value with two decimals, truncating.
///
/// Used for labels, where a float round trip would make them unstable.
pub fn format_fixed(value: u128) -> String {
    let whole = value / FLOAT_SCALING_U128;
    let hundredths = (value % FLOAT_SCALING_U128) / (FLOAT_SCALING_U128 / 100);
    format!("{whole}.{hundredths:02}")
}
