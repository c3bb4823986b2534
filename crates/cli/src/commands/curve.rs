//! Interest rate curve command.

use anyhow::{anyhow, Result};
use margin_dash_sim::{sample_curve, AssetId};
use margin_dash_view::{CurvePointView, DisplayMath};

use crate::cli::CurveArgs;
use crate::output::format_curve_table;

use super::{emit, load_snapshot, Settings};

pub fn run_curve(args: &CurveArgs, settings: &Settings) -> Result<()> {
    let snapshot = load_snapshot(&args.snapshot)?;
    let asset = AssetId::from(args.pool.as_str());
    let pool = snapshot
        .pool(&asset)
        .ok_or_else(|| anyhow!("No pool for asset {}", args.pool))?;

    let points: Vec<CurvePointView> =
        sample_curve(&pool.interest, pool.config.protocol_spread, args.steps)?
            .iter()
            .map(CurvePointView::from)
            .collect();
    let current = DisplayMath::fixed_to_decimal(u128::from(pool.state.utilization()?));

    emit(settings.format, &points, || {
        format_curve_table(&asset, &points, current)
    })
}
