//! Commands that render sections of the full dashboard report.

use anyhow::Result;
use margin_dash_sim::compute_report;
use margin_dash_view::{DashboardView, PositionStatus, PositionView};

use crate::cli::{PositionsArgs, SnapshotArgs};
use crate::output::{format_distribution, format_pools_table, format_positions_table};

use super::{emit, load_snapshot, Settings};

fn dashboard(path: &std::path::Path, settings: &Settings) -> Result<DashboardView> {
    let snapshot = load_snapshot(path)?;
    let report = compute_report(&snapshot, &settings.config)?;
    Ok(DashboardView::from(&report))
}

pub fn run_pools(args: &SnapshotArgs, settings: &Settings) -> Result<()> {
    let view = dashboard(&args.snapshot, settings)?;
    emit(settings.format, &view.pools, || format_pools_table(&view.pools))
}

pub fn run_positions(args: &PositionsArgs, settings: &Settings) -> Result<()> {
    let view = dashboard(&args.snapshot, settings)?;

    let positions: Vec<PositionView> = view
        .positions
        .iter()
        .filter(|p| !args.liquidatable || p.status == PositionStatus::Liquidatable)
        .cloned()
        .collect();

    emit(settings.format, &positions, || {
        format_positions_table(&positions, &view.summary)
    })
}

pub fn run_distribution(args: &SnapshotArgs, settings: &Settings) -> Result<()> {
    let view = dashboard(&args.snapshot, settings)?;
    emit(settings.format, &view.distribution, || {
        format_distribution(&view.distribution)
    })
}
