//! Table formatting for pools and rate curves.

use margin_dash_sim::AssetId;
use margin_dash_view::{CurvePointView, PoolView};
use rust_decimal::Decimal;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use super::format::{format_amount, format_fraction_pct, truncate_id};

#[derive(Tabled)]
struct PoolRow {
    #[tabled(rename = "Asset")]
    asset: String,
    #[tabled(rename = "Supply")]
    supply: String,
    #[tabled(rename = "Borrow")]
    borrow: String,
    #[tabled(rename = "Utilization")]
    utilization: String,
    #[tabled(rename = "Borrow APR")]
    borrow_apr: String,
    #[tabled(rename = "Supply APR")]
    supply_apr: String,
    #[tabled(rename = "Available")]
    available: String,
    #[tabled(rename = "Max Borrow")]
    max_borrowable: String,
    #[tabled(rename = "Cap Headroom")]
    cap_headroom: String,
    #[tabled(rename = "Suppliers")]
    suppliers: usize,
}

#[derive(Tabled)]
struct CurveRow {
    #[tabled(rename = "Utilization")]
    utilization: String,
    #[tabled(rename = "Borrow APR")]
    borrow_apr: String,
    #[tabled(rename = "Supply APR")]
    supply_apr: String,
}

#[derive(Tabled)]
struct SupplierRow {
    #[tabled(rename = "Pool")]
    pool: String,
    #[tabled(rename = "Owner")]
    owner: String,
    #[tabled(rename = "Balance")]
    balance: String,
    #[tabled(rename = "Referral")]
    referral: String,
}

fn styled(mut table: Table) -> String {
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::left()));
    table.to_string()
}

pub fn format_pools_table(pools: &[PoolView]) -> String {
    if pools.is_empty() {
        return "No pools found.".to_string();
    }

    let rows: Vec<PoolRow> = pools
        .iter()
        .map(|p| PoolRow {
            asset: p.asset.to_string(),
            supply: format_amount(p.supply),
            borrow: format_amount(p.borrow),
            utilization: format_fraction_pct(p.utilization),
            borrow_apr: format_fraction_pct(p.borrow_apr),
            supply_apr: format_fraction_pct(p.supply_apr),
            available: format_amount(p.available_liquidity),
            max_borrowable: format_amount(p.max_borrowable),
            cap_headroom: format_amount(p.supply_cap_headroom),
            suppliers: p.suppliers.len(),
        })
        .collect();

    let suppliers: Vec<SupplierRow> = pools
        .iter()
        .flat_map(|p| {
            p.suppliers.iter().map(|s| SupplierRow {
                pool: p.asset.to_string(),
                owner: truncate_id(&s.owner),
                balance: format_amount(s.balance),
                referral: s.referral.clone().unwrap_or_else(|| "-".to_string()),
            })
        })
        .collect();

    let pools_table = styled(Table::new(rows));
    if suppliers.is_empty() {
        return pools_table;
    }
    format!("{}\n\n{}", pools_table, styled(Table::new(suppliers)))
}

pub fn format_curve_table(asset: &AssetId, points: &[CurvePointView], current: Decimal) -> String {
    let rows: Vec<CurveRow> = points
        .iter()
        .map(|p| CurveRow {
            utilization: format_fraction_pct(p.utilization),
            borrow_apr: format_fraction_pct(p.borrow_apr),
            supply_apr: format_fraction_pct(p.supply_apr),
        })
        .collect();

    format!(
        "Rate curve for {} (current utilization {})\n\n{}",
        asset,
        format_fraction_pct(current),
        styled(Table::new(rows))
    )
}
