//! Number formatting shared by the table renderers.

use rust_decimal::{Decimal, RoundingStrategy};

fn two_dp(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn compact(value: Decimal, prefix: &str) -> String {
    let million = Decimal::from(1_000_000u32);
    let sign = if value.is_sign_negative() && !value.is_zero() {
        "-"
    } else {
        ""
    };
    let abs = value.abs();
    if abs >= million {
        format!("{sign}{prefix}{:.2}M", two_dp(abs / million))
    } else if abs >= Decimal::ONE_THOUSAND {
        format!("{sign}{prefix}{:.2}K", two_dp(abs / Decimal::ONE_THOUSAND))
    } else {
        format!("{sign}{prefix}{:.2}", two_dp(abs))
    }
}

pub fn format_usd(value: Option<Decimal>) -> String {
    match value {
        Some(v) => compact(v, "$"),
        None => "-".to_string(),
    }
}

/// Token amount in whole units.
pub fn format_amount(value: Decimal) -> String {
    compact(value, "")
}

/// Formats a fraction as a percentage (0.25 -> "25.00%").
pub fn format_fraction_pct(fraction: Decimal) -> String {
    format!("{:.2}%", two_dp(fraction * Decimal::ONE_HUNDRED))
}

/// Formats a value that is already in percent.
pub fn format_pct(percent: Option<Decimal>) -> String {
    match percent {
        Some(p) => format!("{:.2}%", two_dp(p)),
        None => "-".to_string(),
    }
}

/// Risk ratio as a multiple; debt-free positions read "no debt".
pub fn format_ratio(ratio: Option<Decimal>, debt_usd: Option<Decimal>) -> String {
    match (ratio, debt_usd) {
        (Some(_), Some(debt)) if debt.is_zero() => "no debt".to_string(),
        (Some(r), _) => format!("{:.2}x", two_dp(r)),
        (None, _) => "-".to_string(),
    }
}

/// Shortens long hex identifiers to `0x1234...5678`.
pub fn truncate_id(id: &str) -> String {
    if id.len() > 14 && id.is_ascii() {
        format!("{}...{}", &id[..6], &id[id.len() - 4..])
    } else {
        id.to_string()
    }
}

/// Parses a `#rrggbb` color.
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}
