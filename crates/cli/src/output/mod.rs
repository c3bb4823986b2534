//! Output formatting for CLI results.

pub mod format;
pub mod pools;
pub mod positions;
pub mod risk;

pub use pools::{format_curve_table, format_pools_table};
pub use positions::{format_positions_table, format_shock_comparison};
pub use risk::{format_distribution, format_stress_view};
