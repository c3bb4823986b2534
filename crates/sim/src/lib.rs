//! Margin Pool Risk Engine
//!
//! This crate is the numeric core of a margin-lending dashboard: pool share
//! accounting, the kinked interest rate curve, and per-position liquidation
//! risk with price shock stress testing.
//!
//! # Overview
//!
//! The engine allows you to:
//! - Convert pool shares to asset balances and back
//! - Calculate utilization, borrow APR and supply APR for a pool
//! - Project interest accrual and the APR impact of deposits and borrows
//! - Value margin positions in USD and flag the liquidatable ones
//! - Simulate price shocks and find the liquidation "cliff"
//! - Bucket positions into a risk-ratio histogram
//! - Build a full report from one market snapshot, with caching across snapshots
//!
//! Every value is an integer. Rates, ratios and USD amounts are scaled by
//! [`FLOAT_SCALING`]; asset amounts stay in their native smallest unit.
//!
//! # Example
//!
//! ```rust
//! use margin_dash_sim::{
//!     AssetAmount, MarginPosition, PriceBook, PriceQuote, PriceShock, RiskEngine,
//!     RiskParams, simulate,
//! };
//!
//! let prices = PriceBook::new(vec![
//!     PriceQuote { asset_id: "SUI".into(), usd_price: 150, price_decimals: 2, as_of_timestamp: 0 },
//!     PriceQuote { asset_id: "USDC".into(), usd_price: 100, price_decimals: 2, as_of_timestamp: 0 },
//! ]);
//! let position = MarginPosition {
//!     id: "0xabc".to_string(),
//!     collateral: vec![AssetAmount::new("SUI", 100_000_000_000, 9)],
//!     debt: vec![AssetAmount::new("USDC", 100_000_000, 6)],
//! };
//!
//! let engine = RiskEngine::new(RiskParams::default())?;
//! let now = engine.evaluate(&position, &prices);
//! assert!(!now.is_liquidatable());
//!
//! let crash = simulate(&engine, &position, &prices, &PriceShock::percent("SUI", -30))?;
//! assert!(crash.is_liquidatable());
//! # Ok::<(), margin_dash_sim::SimError>(())
//! ```

pub mod cache;
pub mod distribution;
pub mod error;
pub mod irm;
pub mod ledger;
pub mod math;
pub mod pool;
pub mod price;
pub mod risk;
pub mod snapshot;
pub mod stress;

// Re-export commonly used types
pub use error::SimError;

// Math exports
pub use math::{RoundingDirection, BPS_SCALE, FLOAT_SCALING, YEAR_MS};

// Ledger exports
pub use ledger::{balance_to_shares, exchange_ratio, shares_to_balance};

// IRM exports
pub use irm::{borrow_apr, sample_curve, supply_apr, utilization, CurvePoint, InterestConfig};

// Pool exports
pub use pool::{AprImpact, Pool, PoolConfig, PoolMetrics, PoolState, Position};

// Price exports
pub use price::{usd_value, AssetAmount, AssetId, PriceBook, PriceQuote};

// Risk exports
pub use risk::{
    AssetValue, AtRiskPosition, Evaluation, MarginPosition, RiskEngine, RiskParams, SENTINEL_SAFE,
};

// Stress exports
pub use stress::{
    detect_cliff, find_cliff, simulate, stress_curve, stress_scan, CliffReport, PriceShock,
    StressConfig, StressPoint,
};

// Distribution exports
pub use distribution::{bucket, BucketBoundaries, RiskDistributionBucket};

// Snapshot exports
pub use cache::{CacheStats, EvaluationCache, SnapshotKey};
pub use snapshot::{
    compute_report, BorrowShares, BorrowerAccount, Dashboard, DashboardConfig, DashboardReport,
    MarketSnapshot, PoolReport, StressReport, SupplierBalance, SupplyRecord,
};
