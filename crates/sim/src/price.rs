//! USD price quotes and valuation.
//!
//! A [`PriceBook`] holds one quote per asset. Lookups never fall back to a
//! zero price: an absent quote is [`SimError::MissingPrice`], and a quote older
//! than the configured cutoff is [`SimError::StalePrice`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::math::{mul_div_down, pow10, to_u64, BPS_SCALE, FLOAT_SCALING};

/// Identifier of an asset (e.g. a coin type or ticker)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A USD price for one asset from the price feed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceQuote {
    pub asset_id: AssetId,
    /// USD price scaled by `10^price_decimals`
    pub usd_price: u64,
    pub price_decimals: u8,
    /// Feed timestamp in milliseconds
    pub as_of_timestamp: u64,
}

/// An amount of one asset in its smallest unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetAmount {
    pub asset: AssetId,
    pub amount: u64,
    /// Native decimals of the asset
    pub decimals: u8,
}

impl AssetAmount {
    pub fn new(asset: impl Into<AssetId>, amount: u64, decimals: u8) -> Self {
        Self {
            asset: asset.into(),
            amount,
            decimals,
        }
    }
}

/// Price quotes keyed by asset, with an optional staleness cutoff
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceBook {
    quotes: HashMap<AssetId, PriceQuote>,
    /// Quotes with `as_of_timestamp` below this are rejected
    cutoff: Option<u64>,
}

impl PriceBook {
    /// Builds a book from quotes. Later quotes for the same asset win.
    pub fn new(quotes: impl IntoIterator<Item = PriceQuote>) -> Self {
        Self {
            quotes: quotes
                .into_iter()
                .map(|q| (q.asset_id.clone(), q))
                .collect(),
            cutoff: None,
        }
    }

    /// Rejects quotes older than `max_age_ms` as of `now_ms`.
    pub fn with_max_age(mut self, now_ms: u64, max_age_ms: u64) -> Self {
        self.cutoff = Some(now_ms.saturating_sub(max_age_ms));
        self
    }

    /// Looks up a fresh quote for `asset`.
    pub fn quote(&self, asset: &AssetId) -> Result<&PriceQuote, SimError> {
        let quote = self.quotes.get(asset).ok_or_else(|| SimError::MissingPrice {
            asset: asset.clone(),
        })?;
        if let Some(cutoff) = self.cutoff {
            if quote.as_of_timestamp < cutoff {
                return Err(SimError::StalePrice {
                    asset: asset.clone(),
                    as_of: quote.as_of_timestamp,
                    cutoff,
                });
            }
        }
        Ok(quote)
    }

    /// Returns a copy of the book with one asset's price scaled by
    /// `(10_000 + shock_bps) / 10_000`, rounded down.
    ///
    /// A zero shock returns an identical book.
    pub fn with_shock(&self, asset: &AssetId, shock_bps: i64) -> Result<PriceBook, SimError> {
        if shock_bps < -BPS_SCALE {
            return Err(SimError::InvalidShock { shock_bps });
        }
        let mut shocked = self.clone();
        if shock_bps == 0 {
            return Ok(shocked);
        }
        let quote = shocked
            .quotes
            .get_mut(asset)
            .ok_or_else(|| SimError::MissingPrice {
                asset: asset.clone(),
            })?;
        let factor = BPS_SCALE
            .checked_add(shock_bps)
            .ok_or(SimError::ArithmeticOverflow)?;
        let factor = u128::try_from(factor).map_err(|_| SimError::InvalidShock { shock_bps })?;
        let price = mul_div_down(
            u128::from(quote.usd_price),
            factor,
            u128::from(BPS_SCALE.unsigned_abs()),
        )?;
        quote.usd_price = to_u64(price)?;
        Ok(shocked)
    }
}

/// Values an amount in USD, scaled by [`FLOAT_SCALING`] and rounded down.
///
/// `usd = amount / 10^decimals * usd_price / 10^price_decimals`
pub fn usd_value(amount: u64, decimals: u8, quote: &PriceQuote) -> Result<u128, SimError> {
    let raw = u128::from(amount) * u128::from(quote.usd_price);
    let exponent = u32::from(decimals) + u32::from(quote.price_decimals);
    // FLOAT_SCALING is 10^9
    let scale_exponent = FLOAT_SCALING.ilog10();
    if exponent >= scale_exponent {
        Ok(raw / pow10(exponent - scale_exponent)?)
    } else {
        raw.checked_mul(pow10(scale_exponent - exponent)?)
            .ok_or(SimError::ArithmeticOverflow)
    }
}
