//! Risk histogram and stress scan output.

use colored::Colorize;
use margin_dash_view::{BucketView, StressView};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use super::format::{format_pct, format_usd, parse_hex_color};

const BAR_WIDTH: usize = 40;

#[derive(Tabled)]
struct StressRow {
    #[tabled(rename = "Shock")]
    shock: String,
    #[tabled(rename = "Debt at Risk")]
    debt_at_risk: String,
    #[tabled(rename = "Liquidatable")]
    liquidatable: usize,
    #[tabled(rename = "Unevaluable")]
    unevaluable: usize,
}

fn bar(count: usize, max: usize, color: &str) -> String {
    if count == 0 || max == 0 {
        return String::new();
    }
    let width = (count * BAR_WIDTH / max).max(1);
    let bar = "█".repeat(width);
    match parse_hex_color(color) {
        Some((r, g, b)) => bar.as_str().truecolor(r, g, b).to_string(),
        None => bar,
    }
}

/// Renders the risk buckets as a horizontal histogram.
pub fn format_distribution(buckets: &[BucketView]) -> String {
    let max = buckets.iter().map(|b| b.count).max().unwrap_or(0);
    if max == 0 {
        return "No evaluable positions.".to_string();
    }
    let label_width = buckets.iter().map(|b| b.label.len()).max().unwrap_or(0);

    let mut output = format!("{}\n", "Risk Ratio Distribution".cyan().bold());
    for bucket in buckets {
        output.push_str(&format!(
            "  {:>width$} │ {} {} ({})\n",
            bucket.label,
            bar(bucket.count, max, &bucket.color),
            bucket.count,
            format_usd(Some(bucket.total_debt_usd)),
            width = label_width
        ));
    }
    output
}

pub fn format_stress_view(view: &StressView) -> String {
    let rows: Vec<StressRow> = view
        .curve
        .iter()
        .map(|p| StressRow {
            shock: format_pct(Some(p.shock_pct)),
            debt_at_risk: format_usd(Some(p.debt_at_risk_usd)),
            liquidatable: p.liquidatable,
            unevaluable: p.unevaluable,
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::left()));

    let verdict = match &view.cliff {
        Some(cliff) => format!(
            "Liquidation cliff at {}: debt at risk grows {:.2}x ({} -> {})",
            format_pct(Some(cliff.shock_pct)),
            cliff.debt_multiplier.round_dp(2),
            format_usd(Some(cliff.debt_before_usd)),
            format_usd(Some(cliff.debt_after_usd)),
        )
        .as_str()
        .red()
        .bold()
        .to_string(),
        None => "No liquidation cliff in the scanned range."
            .green()
            .to_string(),
    };

    format!(
        "{}\n\n{}\n\n{}",
        format!("Stress scan: {}", view.asset).as_str().cyan().bold(),
        table,
        verdict
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use margin_dash_sim::AssetId;
    use margin_dash_view::{CliffView, StressPointView};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn bucket(label: &str, count: usize) -> BucketView {
        BucketView {
            label: label.to_string(),
            count,
            total_debt_usd: Decimal::from(count) * dec!(1000),
            color: "#22c55e".to_string(),
        }
    }

    fn point(shock_pct: Decimal, debt: Decimal) -> StressPointView {
        StressPointView {
            shock_pct,
            debt_at_risk_usd: debt,
            liquidatable: 0,
            unevaluable: 0,
        }
    }

    #[test]
    fn test_bar_scales_to_max() {
        assert_eq!(bar(0, 10, "#000000"), "");
        assert!(bar(10, 10, "not-a-color").chars().count() == BAR_WIDTH);
        assert_eq!(bar(1, 1000, "not-a-color").chars().count(), 1);
    }

    #[test]
    fn test_distribution_empty() {
        assert_eq!(
            format_distribution(&[bucket("<1.00", 0)]),
            "No evaluable positions."
        );
    }

    #[test]
    fn test_distribution_lines() {
        let out = format_distribution(&[bucket("<1.00", 1), bucket(">=2.00", 6)]);
        assert!(out.contains("Risk Ratio Distribution"));
        assert!(out.contains(" <1.00 │"));
        assert!(out.contains(">=2.00 │"));
        assert!(out.contains("6 ($6.00K)"));
    }

    #[test]
    fn test_stress_view_with_cliff() {
        let view = StressView {
            asset: AssetId::from("SUI"),
            curve: vec![point(dec!(-16), dec!(2000)), point(dec!(-18), dec!(14000))],
            cliff: Some(CliffView {
                shock_pct: dec!(-18),
                debt_multiplier: dec!(7),
                debt_before_usd: dec!(2000),
                debt_after_usd: dec!(14000),
            }),
        };
        let out = format_stress_view(&view);
        assert!(out.contains("Stress scan: SUI"));
        assert!(out.contains("-16.00%"));
        assert!(out.contains("Liquidation cliff at -18.00%"));
        assert!(out.contains("7.00x"));
        assert!(out.contains("$2.00K -> $14.00K"));
    }

    #[test]
    fn test_stress_view_without_cliff() {
        let view = StressView {
            asset: AssetId::from("SUI"),
            curve: vec![point(Decimal::ZERO, Decimal::ZERO)],
            cliff: None,
        };
        assert!(format_stress_view(&view).contains("No liquidation cliff"));
    }
}
