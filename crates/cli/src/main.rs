//! Margin Dash CLI - Inspect margin pool health and liquidation risk.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::{
    run_cliff, run_curve, run_distribution, run_pools, run_positions, run_stress, Settings,
};

fn main() -> Result<()> {
    // Logs go to stderr so JSON on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_cli(&cli)?;

    match &cli.command {
        Commands::Pools(args) => run_pools(args, &settings)?,
        Commands::Positions(args) => run_positions(args, &settings)?,
        Commands::Stress(args) => run_stress(args, &settings)?,
        Commands::Cliff(args) => run_cliff(args, &settings)?,
        Commands::Distribution(args) => run_distribution(args, &settings)?,
        Commands::Curve(args) => run_curve(args, &settings)?,
    }

    Ok(())
}
