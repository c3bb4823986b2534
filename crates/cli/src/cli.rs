//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;

/// Margin Dash - Inspect margin pool health and liquidation risk
#[derive(Parser, Debug)]
#[command(name = "margin-dash")]
#[command(about = "CLI tool for inspecting margin pool health and liquidation risk", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "table")]
    pub format: OutputFormat,

    /// Dashboard configuration file (JSON)
    #[arg(long, global = true, env = "MARGIN_DASH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Reject price quotes older than this many milliseconds
    #[arg(long, global = true, env = "MARGIN_DASH_MAX_PRICE_AGE_MS")]
    pub max_price_age_ms: Option<u64>,

    /// Accept price quotes of any age
    #[arg(long, global = true, conflicts_with = "max_price_age_ms")]
    pub allow_stale: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show pool utilization, rates and liquidity
    Pools(SnapshotArgs),
    /// Show risk metrics for every borrower position
    Positions(PositionsArgs),
    /// Simulate a price shock on one position
    Stress(StressArgs),
    /// Scan price shocks for a liquidation cliff
    Cliff(CliffArgs),
    /// Show the risk-ratio histogram
    Distribution(SnapshotArgs),
    /// Sample a pool's interest rate curve
    Curve(CurveArgs),
}

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Path to a market snapshot (JSON)
    pub snapshot: PathBuf,
}

#[derive(Args, Debug)]
pub struct PositionsArgs {
    /// Path to a market snapshot (JSON)
    pub snapshot: PathBuf,

    /// Only show liquidatable positions
    #[arg(long)]
    pub liquidatable: bool,
}

#[derive(Args, Debug)]
pub struct StressArgs {
    /// Path to a market snapshot (JSON)
    pub snapshot: PathBuf,

    /// Borrower position id
    #[arg(long)]
    pub position: String,

    /// Asset whose price is shocked
    #[arg(long)]
    pub asset: String,

    /// Price change in percent (e.g. -30)
    #[arg(long, allow_hyphen_values = true)]
    pub shock: Decimal,
}

#[derive(Args, Debug)]
pub struct CliffArgs {
    /// Path to a market snapshot (JSON)
    pub snapshot: PathBuf,

    /// Asset whose price is shocked (default: largest collateral asset)
    #[arg(long)]
    pub asset: Option<String>,
}

#[derive(Args, Debug)]
pub struct CurveArgs {
    /// Path to a market snapshot (JSON)
    pub snapshot: PathBuf,

    /// Pool asset
    #[arg(long)]
    pub pool: String,

    /// Number of intervals between 0% and 100% utilization
    #[arg(long, default_value = "10")]
    pub steps: u32,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}
