//! Command implementations.

pub mod curve;
pub mod report;
pub mod stress;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use margin_dash_sim::{DashboardConfig, MarketSnapshot};
use serde::Serialize;
use tracing::debug;

use crate::cli::{Cli, OutputFormat};

pub use curve::run_curve;
pub use report::{run_distribution, run_pools, run_positions};
pub use stress::{run_cliff, run_stress};

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct Settings {
    pub format: OutputFormat,
    pub config: DashboardConfig,
}

impl Settings {
    /// Resolves the dashboard configuration: file first, then flags.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => load_config(path)?,
            None => DashboardConfig::default(),
        };
        if cli.allow_stale {
            config = config.with_max_price_age_ms(None);
        } else if let Some(max_age) = cli.max_price_age_ms {
            config = config.with_max_price_age_ms(Some(max_age));
        }
        config.validate().context("Invalid dashboard configuration")?;

        Ok(Self {
            format: cli.format,
            config,
        })
    }
}

fn load_config(path: &Path) -> Result<DashboardConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse config {}", path.display()))
}

/// Reads and validates a market snapshot.
pub fn load_snapshot(path: &Path) -> Result<MarketSnapshot> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let snapshot: MarketSnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;
    snapshot.validate()?;
    debug!(
        pools = snapshot.pools.len(),
        borrowers = snapshot.borrowers.len(),
        taken_at = snapshot.taken_at,
        "loaded snapshot"
    );
    Ok(snapshot)
}

/// Prints either the rendered table or the JSON form of `value`.
pub(crate) fn emit<T: Serialize>(
    format: OutputFormat,
    value: &T,
    table: impl FnOnce() -> String,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!("{}", table());
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{}", json);
        }
    }
    Ok(())
}
