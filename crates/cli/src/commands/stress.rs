//! Price shock commands.

use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use margin_dash_sim::{compute_report, simulate, PriceShock, RiskEngine};
use margin_dash_view::{DisplayMath, PositionView, StressView};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::cli::{CliffArgs, StressArgs};
use crate::output::{format_shock_comparison, format_stress_view};

use super::{emit, load_snapshot, Settings};

/// One position before and after a shock.
#[derive(Debug, Serialize)]
pub struct ShockComparison {
    pub asset: String,
    pub shock_pct: Decimal,
    pub before: PositionView,
    pub after: PositionView,
}

pub fn run_stress(args: &StressArgs, settings: &Settings) -> Result<()> {
    let snapshot = load_snapshot(&args.snapshot)?;
    let config = &settings.config;

    let account = snapshot
        .borrowers
        .iter()
        .find(|b| b.id == args.position)
        .ok_or_else(|| anyhow!("No position with id {}", args.position))?;

    let pools = snapshot.pools_at_snapshot(config.accrue_interest)?;
    let index: HashMap<_, _> = pools.iter().map(|p| (&p.asset, p)).collect();
    let position = account.to_margin_position(&index)?;

    let prices = snapshot.price_book(config.max_price_age_ms);
    let engine = RiskEngine::new(config.risk)?;
    let shock = PriceShock::new(args.asset.as_str(), DisplayMath::percent_to_bps(args.shock));

    let before = engine.evaluate(&position, &prices);
    let after = simulate(&engine, &position, &prices, &shock)
        .with_context(|| format!("Cannot shock {} by {}%", args.asset, args.shock))?;

    let comparison = ShockComparison {
        asset: args.asset.clone(),
        shock_pct: DisplayMath::bps_to_percent(shock.shock_bps),
        before: PositionView::from(&before),
        after: PositionView::from(&after),
    };

    emit(settings.format, &comparison, || {
        format_shock_comparison(
            &comparison.asset,
            comparison.shock_pct,
            &comparison.before,
            &comparison.after,
        )
    })
}

pub fn run_cliff(args: &CliffArgs, settings: &Settings) -> Result<()> {
    let snapshot = load_snapshot(&args.snapshot)?;
    let config = match &args.asset {
        Some(asset) => settings.config.clone().with_stress_asset(asset.as_str()),
        None => settings.config.clone(),
    };

    let report = compute_report(&snapshot, &config)?;
    let stress = report.stress.as_ref().map(StressView::from);

    emit(settings.format, &stress, || match &stress {
        Some(view) => format_stress_view(view),
        None => "No stress asset could be priced.".to_string(),
    })
}
