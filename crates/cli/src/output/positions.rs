//! Output formatting for borrower positions.

use colored::Colorize;
use margin_dash_view::{PositionStatus, PositionView, SummaryView};
use rust_decimal::Decimal;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use super::format::{format_pct, format_ratio, format_usd, truncate_id};

#[derive(Tabled)]
struct PositionRow {
    #[tabled(rename = "Position")]
    id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Collateral")]
    collateral: String,
    #[tabled(rename = "Debt")]
    debt: String,
    #[tabled(rename = "Risk Ratio")]
    risk_ratio: String,
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "Reward")]
    reward: String,
}

#[derive(Tabled)]
struct ComparisonRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Before")]
    before: String,
    #[tabled(rename = "After")]
    after: String,
}

impl From<&PositionView> for PositionRow {
    fn from(p: &PositionView) -> Self {
        Self {
            id: truncate_id(&p.id),
            status: p.status.as_str().to_string(),
            collateral: format_usd(p.collateral_usd),
            debt: format_usd(p.debt_usd),
            risk_ratio: format_ratio(p.risk_ratio, p.debt_usd),
            distance: format_pct(p.distance_to_liquidation),
            reward: format_usd(p.estimated_reward_usd),
        }
    }
}

fn status_label(status: PositionStatus) -> String {
    match status {
        PositionStatus::Healthy => "healthy".green().to_string(),
        PositionStatus::Liquidatable => "LIQUIDATABLE".red().bold().to_string(),
        PositionStatus::Unknown => "unknown".yellow().to_string(),
    }
}

pub fn format_positions_table(positions: &[PositionView], summary: &SummaryView) -> String {
    let mut output = format!(
        "Positions: {}  Liquidatable: {}  Unevaluable: {}\nTotal debt: {}  Debt at risk: {}\n\n",
        summary.positions,
        if summary.liquidatable > 0 {
            summary.liquidatable.to_string().as_str().red().bold().to_string()
        } else {
            summary.liquidatable.to_string()
        },
        summary.unevaluable,
        format_usd(Some(summary.total_debt_usd)),
        format_usd(Some(summary.debt_at_risk_usd)),
    );

    if positions.is_empty() {
        output.push_str("No positions found.");
        return output;
    }

    let rows: Vec<PositionRow> = positions.iter().map(PositionRow::from).collect();
    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::left()));
    output.push_str(&table.to_string());

    let unevaluable: Vec<_> = positions.iter().filter(|p| p.reason.is_some()).collect();
    if !unevaluable.is_empty() {
        output.push_str(&format!("\n\n{}\n", "Unevaluable".yellow().bold()));
        for p in unevaluable {
            output.push_str(&format!(
                "  {}: {}\n",
                truncate_id(&p.id),
                p.reason.as_deref().unwrap_or_default()
            ));
        }
    }

    output
}

pub fn format_shock_comparison(
    asset: &str,
    shock_pct: Decimal,
    before: &PositionView,
    after: &PositionView,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}\n", "=".repeat(60)));
    output.push_str(&format!("{}\n", format!("Position {}", before.id).as_str().bold()));
    output.push_str(&format!("{}\n\n", "=".repeat(60)));
    output.push_str(&format!(
        "  Shock:  {} {}\n",
        asset,
        format_pct(Some(shock_pct))
    ));
    output.push_str(&format!(
        "  Status: {} -> {}\n\n",
        status_label(before.status),
        status_label(after.status)
    ));

    let rows = vec![
        ComparisonRow {
            metric: "Collateral",
            before: format_usd(before.collateral_usd),
            after: format_usd(after.collateral_usd),
        },
        ComparisonRow {
            metric: "Debt",
            before: format_usd(before.debt_usd),
            after: format_usd(after.debt_usd),
        },
        ComparisonRow {
            metric: "Risk Ratio",
            before: format_ratio(before.risk_ratio, before.debt_usd),
            after: format_ratio(after.risk_ratio, after.debt_usd),
        },
        ComparisonRow {
            metric: "Distance",
            before: format_pct(before.distance_to_liquidation),
            after: format_pct(after.distance_to_liquidation),
        },
        ComparisonRow {
            metric: "Reward",
            before: format_usd(before.estimated_reward_usd),
            after: format_usd(after.estimated_reward_usd),
        },
    ];
    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::left()));
    output.push_str(&table.to_string());

    if let Some(reason) = after.reason.as_deref() {
        output.push_str(&format!("\n\n{} {}", "Unevaluable:".yellow().bold(), reason));
    }

    output
}
