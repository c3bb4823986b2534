//! Display types for margin pool dashboard reports.
//!
//! The engine works in fixed-point integers. This crate converts its results
//! into exact [`rust_decimal::Decimal`] values with serde support, for tables,
//! JSON output and any other presentation layer.

mod types;

pub use types::*;
