//! Error types for the simulation library.

use thiserror::Error;

use crate::price::AssetId;

/// Errors that can occur during simulation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// Pool state violates an invariant (e.g. borrow exceeds supply)
    #[error("Invalid snapshot: {reason}")]
    InvalidSnapshot { reason: String },

    /// Configuration value outside its allowed range
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// No price quote for an asset the position holds or owes
    #[error("Price missing for asset {asset}")]
    MissingPrice { asset: AssetId },

    /// Price quote older than the staleness cutoff
    #[error("Price for asset {asset} is stale: quoted at {as_of}, cutoff is {cutoff}")]
    StalePrice {
        asset: AssetId,
        as_of: u64,
        cutoff: u64,
    },

    /// An intermediate product exceeded the representable range
    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Interest accrual was attempted with a timestamp before the last update
    #[error("Invalid interest accrual: timestamp {timestamp} is before last update {last_update}")]
    InvalidInterestAccrual { timestamp: u64, last_update: u64 },

    /// Price shock would push a price below zero
    #[error("Invalid price shock of {shock_bps} bps")]
    InvalidShock { shock_bps: i64 },

    /// Bucket boundaries empty or not strictly increasing
    #[error("Invalid bucket boundaries: {reason}")]
    InvalidBuckets { reason: String },

    /// Position borrows from a pool that is not in the snapshot
    #[error("No pool for asset {asset}")]
    UnknownPool { asset: AssetId },

    /// Deposit would push total supply past the pool's cap
    #[error("Supply cap exceeded for pool {asset}: cap is {cap}")]
    SupplyCapExceeded { asset: AssetId, cap: u64 },

    /// Borrow smaller than the pool's minimum
    #[error("Borrow of {amount} is below the minimum {min_borrow} for pool {asset}")]
    BelowMinBorrow {
        asset: AssetId,
        amount: u64,
        min_borrow: u64,
    },

    /// Borrow would push utilization past the pool's maximum
    #[error("Borrow would exceed max utilization for pool {asset}")]
    ExceedsMaxUtilization { asset: AssetId },
}

impl SimError {
    pub(crate) fn invalid_snapshot(reason: impl Into<String>) -> Self {
        SimError::InvalidSnapshot {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        SimError::InvalidConfig {
            reason: reason.into(),
        }
    }
}
