//! Snapshot-to-report pipeline.
//!
//! A [`MarketSnapshot`] is one atomic, already-decoded view of every pool,
//! borrower, supplier and price. [`compute_report`] turns it into a
//! [`DashboardReport`] in a single pass; [`Dashboard`] does the same while
//! reusing evaluations from earlier snapshots through an [`EvaluationCache`].
//!
//! Invalid pools fail the whole report. A borrower that cannot be resolved or
//! priced only marks that one position unevaluable.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::{EvaluationCache, SnapshotKey};
use crate::distribution::{bucket, BucketBoundaries, RiskDistributionBucket};
use crate::error::SimError;
use crate::pool::{Pool, PoolMetrics, Position};
use crate::price::{AssetAmount, AssetId, PriceBook, PriceQuote};
use crate::risk::{Evaluation, MarginPosition, RiskEngine, RiskParams};
use crate::stress::{dominant_collateral_asset, stress_scan, CliffReport, StressConfig, StressPoint};

/// Default staleness window for price quotes (5 minutes)
pub const DEFAULT_MAX_PRICE_AGE_MS: u64 = 5 * 60 * 1000;

/// Borrow shares held against one pool
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BorrowShares {
    pub asset: AssetId,
    pub shares: u64,
}

/// A borrower's margin account as recorded on chain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BorrowerAccount {
    pub id: String,
    #[serde(default)]
    pub collateral: Vec<AssetAmount>,
    #[serde(default)]
    pub borrows: Vec<BorrowShares>,
}

impl BorrowerAccount {
    /// Resolves borrow shares to debt amounts through each pool's ledger.
    pub fn to_margin_position(&self, pools: &HashMap<&AssetId, &Pool>) -> Result<MarginPosition, SimError> {
        let debt = self
            .borrows
            .iter()
            .map(|b| {
                let pool = pools.get(&b.asset).ok_or_else(|| SimError::UnknownPool {
                    asset: b.asset.clone(),
                })?;
                pool.debt_for_shares(b.shares)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MarginPosition {
            id: self.id.clone(),
            collateral: self.collateral.clone(),
            debt,
        })
    }
}

/// A supplier's position in one pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyRecord {
    pub owner: String,
    pub asset: AssetId,
    #[serde(flatten)]
    pub position: Position,
}

/// Everything the dashboard reads, captured at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Capture time in milliseconds
    pub taken_at: u64,
    pub pools: Vec<Pool>,
    #[serde(default)]
    pub borrowers: Vec<BorrowerAccount>,
    #[serde(default)]
    pub suppliers: Vec<SupplyRecord>,
    pub prices: Vec<PriceQuote>,
}

impl MarketSnapshot {
    /// Checks every pool and rejects duplicate pools or borrower ids.
    pub fn validate(&self) -> Result<(), SimError> {
        let mut assets = HashSet::new();
        for pool in &self.pools {
            pool.validate()?;
            if !assets.insert(&pool.asset) {
                return Err(SimError::invalid_snapshot(format!("duplicate pool {}", pool.asset)));
            }
        }
        let mut ids = HashSet::new();
        for account in &self.borrowers {
            if !ids.insert(account.id.as_str()) {
                return Err(SimError::invalid_snapshot(format!(
                    "duplicate borrower {}",
                    account.id
                )));
            }
        }
        Ok(())
    }

    pub fn pool(&self, asset: &AssetId) -> Option<&Pool> {
        self.pools.iter().find(|p| &p.asset == asset)
    }

    /// Pool states as of `taken_at`, projecting interest forward when
    /// `accrue` is set.
    pub fn pools_at_snapshot(&self, accrue: bool) -> Result<Vec<Pool>, SimError> {
        if !accrue {
            return Ok(self.pools.clone());
        }
        self.pools
            .iter()
            .map(|p| {
                Ok(Pool {
                    state: p.accrue_interest(self.taken_at)?,
                    ..p.clone()
                })
            })
            .collect()
    }

    /// Builds the price book, rejecting quotes older than `max_age_ms`.
    pub fn price_book(&self, max_age_ms: Option<u64>) -> PriceBook {
        let book = PriceBook::new(self.prices.iter().cloned());
        match max_age_ms {
            Some(max_age) => book.with_max_age(self.taken_at, max_age),
            None => book,
        }
    }
}

/// Report settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub risk: RiskParams,
    /// `None` accepts quotes of any age
    pub max_price_age_ms: Option<u64>,
    pub stress: StressConfig,
    /// Asset shocked by the stress scan; defaults to the largest collateral asset
    pub stress_asset: Option<AssetId>,
    pub bucket_boundaries: BucketBoundaries,
    /// Project pool states forward to the snapshot time before valuing debt
    pub accrue_interest: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            risk: RiskParams::default(),
            max_price_age_ms: Some(DEFAULT_MAX_PRICE_AGE_MS),
            stress: StressConfig::default(),
            stress_asset: None,
            bucket_boundaries: BucketBoundaries::default(),
            accrue_interest: true,
        }
    }
}

impl DashboardConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_risk(mut self, risk: RiskParams) -> Self {
        self.risk = risk;
        self
    }

    pub fn with_max_price_age_ms(mut self, max_age_ms: Option<u64>) -> Self {
        self.max_price_age_ms = max_age_ms;
        self
    }

    pub fn with_stress(mut self, stress: StressConfig) -> Self {
        self.stress = stress;
        self
    }

    pub fn with_stress_asset(mut self, asset: impl Into<AssetId>) -> Self {
        self.stress_asset = Some(asset.into());
        self
    }

    pub fn with_bucket_boundaries(mut self, boundaries: BucketBoundaries) -> Self {
        self.bucket_boundaries = boundaries;
        self
    }

    pub fn with_accrue_interest(mut self, accrue: bool) -> Self {
        self.accrue_interest = accrue;
        self
    }

    pub fn validate(&self) -> Result<(), SimError> {
        self.risk.validate()?;
        self.stress.validate()
    }
}

/// A supplier's balance in a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierBalance {
    pub owner: String,
    pub shares: u64,
    pub balance: u64,
    pub referral: Option<String>,
}

/// Per-pool section of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolReport {
    /// Pool as valued, after any interest accrual
    pub pool: Pool,
    pub metrics: PoolMetrics,
    pub available_liquidity: u64,
    pub max_borrowable: u64,
    pub supply_cap_headroom: u64,
    pub suppliers: Vec<SupplierBalance>,
}

/// Stress scan of one asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StressReport {
    pub asset: AssetId,
    /// Each point's `unevaluable` also counts accounts whose pools could not
    /// be resolved, so it never drops below the report's unevaluable count
    pub curve: Vec<StressPoint>,
    pub cliff: Option<CliffReport>,
}

/// Everything the dashboard shows for one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardReport {
    pub taken_at: u64,
    pub pools: Vec<PoolReport>,
    pub evaluations: Vec<Evaluation>,
    pub distribution: Vec<RiskDistributionBucket>,
    /// `None` when there is no stress asset or it has no price
    pub stress: Option<StressReport>,
}

impl DashboardReport {
    pub fn evaluation(&self, position_id: &str) -> Option<&Evaluation> {
        self.evaluations.iter().find(|e| e.position_id() == position_id)
    }

    pub fn liquidatable(&self) -> impl Iterator<Item = &Evaluation> {
        self.evaluations.iter().filter(|e| e.is_liquidatable())
    }

    pub fn unevaluable_count(&self) -> usize {
        self.evaluations.iter().filter(|e| !e.is_evaluable()).count()
    }

    /// Total debt across evaluable positions, scaled by `FLOAT_SCALING`
    pub fn total_debt_usd(&self) -> u128 {
        self.evaluations
            .iter()
            .filter_map(Evaluation::as_evaluable)
            .fold(0u128, |acc, p| acc.saturating_add(p.debt_usd))
    }

    pub fn cliff(&self) -> Option<&CliffReport> {
        self.stress.as_ref().and_then(|s| s.cliff.as_ref())
    }
}

/// Computes the full dashboard report for `snapshot`.
pub fn compute_report(snapshot: &MarketSnapshot, config: &DashboardConfig) -> Result<DashboardReport, SimError> {
    let prepared = Prepared::new(snapshot, config)?;
    let index = prepared.index();

    let resolved: Vec<Result<MarginPosition, SimError>> = snapshot
        .borrowers
        .iter()
        .map(|a| a.to_margin_position(&index))
        .collect();
    let positions: Vec<MarginPosition> = resolved.iter().filter_map(|r| r.as_ref().ok()).cloned().collect();

    let mut evaluated = prepared
        .engine
        .evaluate_all(&positions, &prepared.prices)
        .into_iter();
    let evaluations = snapshot
        .borrowers
        .iter()
        .zip(resolved)
        .filter_map(|(account, resolved)| match resolved {
            Ok(_) => evaluated.next(),
            Err(reason) => Some(unresolved(account, reason)),
        })
        .collect();

    prepared.assemble(snapshot, config, &positions, evaluations)
}

/// Report builder that keeps evaluations across snapshots
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    config: DashboardConfig,
    cache: EvaluationCache,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            config,
            cache: EvaluationCache::new(),
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn cache(&self) -> &EvaluationCache {
        &self.cache
    }

    /// Same result as [`compute_report`], reusing cached evaluations whose
    /// inputs have not changed and evicting positions no longer present.
    pub fn compute(&mut self, snapshot: &MarketSnapshot) -> Result<DashboardReport, SimError> {
        let prepared = Prepared::new(snapshot, &self.config)?;
        let index = prepared.index();

        let mut positions = Vec::with_capacity(snapshot.borrowers.len());
        let mut evaluations = Vec::with_capacity(snapshot.borrowers.len());
        for account in &snapshot.borrowers {
            let key = SnapshotKey::for_account(account, &index, &prepared.prices, &self.config.risk);
            let resolved = account.to_margin_position(&index);
            let evaluation = self.cache.get_or_insert_with(&account.id, key, || match &resolved {
                Ok(position) => prepared.engine.evaluate(position, &prepared.prices),
                Err(reason) => unresolved(account, reason.clone()),
            });
            if let Ok(position) = resolved {
                positions.push(position);
            }
            evaluations.push(evaluation);
        }
        self.cache
            .retain_ids(snapshot.borrowers.iter().map(|a| a.id.as_str()));

        prepared.assemble(snapshot, &self.config, &positions, evaluations)
    }
}

fn unresolved(account: &BorrowerAccount, reason: SimError) -> Evaluation {
    warn!(position = %account.id, %reason, "position is unevaluable");
    Evaluation::Unevaluable {
        position_id: account.id.clone(),
        reason,
    }
}

/// Validated inputs shared by both report paths
struct Prepared {
    pools: Vec<Pool>,
    prices: PriceBook,
    engine: RiskEngine,
}

impl Prepared {
    fn new(snapshot: &MarketSnapshot, config: &DashboardConfig) -> Result<Self, SimError> {
        config.validate()?;
        snapshot.validate()?;

        Ok(Self {
            pools: snapshot.pools_at_snapshot(config.accrue_interest)?,
            prices: snapshot.price_book(config.max_price_age_ms),
            engine: RiskEngine::new(config.risk)?,
        })
    }

    fn index(&self) -> HashMap<&AssetId, &Pool> {
        self.pools.iter().map(|p| (&p.asset, p)).collect()
    }

    fn assemble(
        &self,
        snapshot: &MarketSnapshot,
        config: &DashboardConfig,
        positions: &[MarginPosition],
        evaluations: Vec<Evaluation>,
    ) -> Result<DashboardReport, SimError> {
        let pools = self
            .pools
            .iter()
            .map(|pool| pool_report(pool, &snapshot.suppliers))
            .collect::<Result<Vec<_>, _>>()?;

        for supplier in &snapshot.suppliers {
            if !self.pools.iter().any(|p| p.asset == supplier.asset) {
                warn!(owner = %supplier.owner, asset = %supplier.asset, "supply position in unknown pool");
            }
        }

        let distribution = bucket(
            evaluations.iter().filter_map(Evaluation::as_evaluable),
            &config.bucket_boundaries,
        );

        let asset = config
            .stress_asset
            .clone()
            .or_else(|| dominant_collateral_asset(&evaluations));
        let unresolved = evaluations.len().saturating_sub(positions.len());
        let stress = match asset {
            Some(asset) => self.stress(positions, unresolved, asset, &config.stress)?,
            None => None,
        };

        Ok(DashboardReport {
            taken_at: snapshot.taken_at,
            pools,
            evaluations,
            distribution,
            stress,
        })
    }

    fn stress(
        &self,
        positions: &[MarginPosition],
        unresolved: usize,
        asset: AssetId,
        config: &StressConfig,
    ) -> Result<Option<StressReport>, SimError> {
        let (mut curve, cliff) = match stress_scan(&self.engine, positions, &self.prices, &asset, config) {
            Ok(scan) => scan,
            Err(reason @ SimError::MissingPrice { .. }) => {
                warn!(asset = %asset, %reason, "skipping stress scan");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        for point in &mut curve {
            point.unevaluable += unresolved;
        }
        Ok(Some(StressReport { asset, curve, cliff }))
    }
}

fn pool_report(pool: &Pool, suppliers: &[SupplyRecord]) -> Result<PoolReport, SimError> {
    let suppliers = suppliers
        .iter()
        .filter(|s| s.asset == pool.asset)
        .map(|s| {
            Ok(SupplierBalance {
                owner: s.owner.clone(),
                shares: s.position.shares,
                balance: pool.position_balance(&s.position)?,
                referral: s.position.referral.clone(),
            })
        })
        .collect::<Result<Vec<_>, SimError>>()?;

    Ok(PoolReport {
        metrics: pool.metrics()?,
        available_liquidity: pool.available_liquidity(),
        max_borrowable: pool.max_borrowable()?,
        supply_cap_headroom: pool.supply_cap_headroom(),
        suppliers,
        pool: pool.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::irm::InterestConfig;
    use crate::math::{FLOAT_SCALING_U128, YEAR_MS};
    use crate::pool::{PoolConfig, PoolState};

    const USD: u128 = FLOAT_SCALING_U128;

    fn usdc_pool() -> Pool {
        Pool {
            asset: AssetId::from("USDC"),
            decimals: 6,
            state: PoolState {
                supply: 1_000_000_000,
                borrow: 500_000_000,
                supply_shares: 1_000_000_000,
                borrow_shares: 500_000_000,
                last_update_timestamp: 0,
            },
            config: PoolConfig {
                supply_cap: 10_000_000_000,
                max_utilization_rate: 900_000_000,
                protocol_spread: 100_000_000,
                min_borrow: 1_000_000,
            },
            interest: InterestConfig {
                base_rate: 20_000_000,
                base_slope: 60_000_000,
                optimal_utilization: 700_000_000,
                excess_slope: 150_000_000,
            },
        }
    }

    fn quote(asset: &str, usd_price: u64, as_of: u64) -> PriceQuote {
        PriceQuote {
            asset_id: AssetId::from(asset),
            usd_price,
            price_decimals: 9,
            as_of_timestamp: as_of,
        }
    }

    fn borrower(id: &str, sui: u64, usdc_shares: u64) -> BorrowerAccount {
        BorrowerAccount {
            id: id.to_string(),
            collateral: vec![AssetAmount::new("SUI", sui * 1_000_000_000, 9)],
            borrows: vec![BorrowShares {
                asset: AssetId::from("USDC"),
                shares: usdc_shares * 1_000_000,
            }],
        }
    }

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot {
            taken_at: 10_000,
            pools: vec![usdc_pool()],
            borrowers: vec![borrower("alice", 150, 100), borrower("bob", 110, 100)],
            suppliers: vec![SupplyRecord {
                owner: "carol".to_string(),
                asset: AssetId::from("USDC"),
                position: Position {
                    shares: 1_000_000,
                    referral: Some("ref-1".to_string()),
                },
            }],
            prices: vec![quote("SUI", 1_000_000_000, 9_000), quote("USDC", 1_000_000_000, 9_000)],
        }
    }

    fn config() -> DashboardConfig {
        DashboardConfig::new().with_accrue_interest(false)
    }

    #[test]
    fn test_compute_report() {
        let report = compute_report(&snapshot(), &config()).unwrap();

        assert_eq!(report.pools.len(), 1);
        let pool = &report.pools[0];
        assert_eq!(pool.metrics.utilization, 500_000_000);
        assert_eq!(pool.available_liquidity, 500_000_000);
        assert_eq!(pool.suppliers[0].balance, 1_000_000);
        assert_eq!(pool.suppliers[0].referral.as_deref(), Some("ref-1"));

        let alice = report.evaluation("alice").unwrap().as_evaluable().unwrap();
        assert_eq!(alice.debt_usd, 100 * USD);
        assert_eq!(alice.risk_ratio, 1_500_000_000);
        // bob: 1.1 <= 1.2
        assert!(report.evaluation("bob").unwrap().is_liquidatable());
        assert_eq!(report.liquidatable().count(), 1);
        assert_eq!(report.total_debt_usd(), 200 * USD);

        assert_eq!(report.distribution.iter().map(|b| b.count).sum::<usize>(), 2);
        assert_eq!(report.distribution[0].count, 1);

        let stress = report.stress.as_ref().unwrap();
        assert_eq!(stress.asset, AssetId::from("SUI"));
        assert_eq!(stress.curve.len(), 26);
    }

    #[test]
    fn test_unknown_pool_marks_one_position() {
        let mut snap = snapshot();
        snap.borrowers[1].borrows[0].asset = AssetId::from("WETH");
        let report = compute_report(&snap, &config()).unwrap();
        assert!(report.evaluation("alice").unwrap().is_evaluable());
        assert_eq!(
            report.evaluation("bob").unwrap().reason(),
            Some(&SimError::UnknownPool {
                asset: AssetId::from("WETH")
            })
        );
        assert_eq!(report.unevaluable_count(), 1);
    }

    #[test]
    fn test_stress_curve_counts_unresolved_accounts() {
        let mut snap = snapshot();
        snap.borrowers[1].borrows[0].asset = AssetId::from("WETH");
        let config = config().with_stress_asset("SUI");
        let report = compute_report(&snap, &config).unwrap();
        let stress = report.stress.as_ref().unwrap();
        assert!(!stress.curve.is_empty());
        assert!(stress
            .curve
            .iter()
            .all(|p| p.unevaluable == report.unevaluable_count()));

        let cached = Dashboard::new(config).unwrap().compute(&snap).unwrap();
        assert_eq!(cached.stress, report.stress);
    }

    #[test]
    fn test_invalid_pool_is_fatal() {
        let mut snap = snapshot();
        snap.pools[0].state.borrow = snap.pools[0].state.supply + 1;
        assert!(matches!(
            compute_report(&snap, &config()),
            Err(SimError::InvalidSnapshot { .. })
        ));
    }

    #[test]
    fn test_duplicate_borrowers_rejected() {
        let mut snap = snapshot();
        snap.borrowers.push(borrower("alice", 1, 1));
        assert!(matches!(snap.validate(), Err(SimError::InvalidSnapshot { .. })));
    }

    #[test]
    fn test_stale_prices_make_positions_unevaluable() {
        let config = config().with_max_price_age_ms(Some(500));
        let report = compute_report(&snapshot(), &config).unwrap();
        assert_eq!(report.unevaluable_count(), 2);
        assert!(report.distribution.iter().all(|b| b.count == 0));
    }

    #[test]
    fn test_unpriced_stress_asset_skips_scan() {
        let config = config().with_stress_asset("WETH");
        let report = compute_report(&snapshot(), &config).unwrap();
        assert!(report.stress.is_none());
    }

    #[test]
    fn test_interest_accrues_to_snapshot_time() {
        let mut snap = snapshot();
        snap.taken_at = YEAR_MS;
        for quote in &mut snap.prices {
            quote.as_of_timestamp = YEAR_MS;
        }
        let report = compute_report(&snap, &DashboardConfig::new()).unwrap();
        // 50% utilization: 0.02 + 0.06 * 0.5 = 5% on 500 USDC
        assert_eq!(report.pools[0].pool.state.borrow, 525_000_000);
        let alice = report.evaluation("alice").unwrap().as_evaluable().unwrap();
        assert_eq!(alice.debt_usd, 105 * USD);
    }

    #[test]
    fn test_dashboard_matches_compute_report() {
        let mut dashboard = Dashboard::new(config()).unwrap();
        let snap = snapshot();
        let cached = dashboard.compute(&snap).unwrap();
        assert_eq!(cached, compute_report(&snap, &config()).unwrap());
        assert_eq!(dashboard.cache().stats().misses, 2);

        let again = dashboard.compute(&snap).unwrap();
        assert_eq!(again, cached);
        assert_eq!(dashboard.cache().stats().hits, 2);
    }

    #[test]
    fn test_dashboard_recomputes_changed_positions() {
        let mut dashboard = Dashboard::new(config()).unwrap();
        let mut snap = snapshot();
        dashboard.compute(&snap).unwrap();

        snap.borrowers[0].collateral[0].amount /= 2;
        snap.borrowers.remove(1);
        let report = dashboard.compute(&snap).unwrap();

        let alice = report.evaluation("alice").unwrap().as_evaluable().unwrap();
        assert_eq!(alice.collateral_usd, 75 * USD);
        assert_eq!(dashboard.cache().len(), 1);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let json = r#"{ "max_price_age_ms": 1000, "stress_asset": "SUI" }"#;
        let config: DashboardConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_price_age_ms, Some(1_000));
        assert_eq!(config.stress_asset, Some(AssetId::from("SUI")));
        assert_eq!(config.stress, StressConfig::default());
        assert!(config.accrue_interest);
    }
}
