//! Content-keyed cache of position evaluations.
//!
//! Entries are keyed by position id and tagged with a [`SnapshotKey`], a hash
//! of every input the evaluation read: the account itself, the states of the
//! pools it borrows from, the quotes (with timestamps) of every asset it holds
//! or owes, and the risk parameters. A changed key means the cached
//! evaluation is discarded and recomputed.

use std::collections::hash_map::{DefaultHasher, Entry};
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

use tracing::debug;

use crate::pool::Pool;
use crate::price::{AssetId, PriceBook};
use crate::risk::{Evaluation, RiskParams};
use crate::snapshot::BorrowerAccount;

/// Hash of the inputs that determine one position's evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotKey(u64);

impl SnapshotKey {
    pub fn for_account(
        account: &BorrowerAccount,
        pools: &HashMap<&AssetId, &Pool>,
        prices: &PriceBook,
        params: &RiskParams,
    ) -> Self {
        let mut hasher = DefaultHasher::new();
        account.hash(&mut hasher);
        for borrow in &account.borrows {
            pools
                .get(&borrow.asset)
                .map(|p| (p.decimals, p.state))
                .hash(&mut hasher);
        }
        // A quote turning stale hashes as None
        let assets = account
            .collateral
            .iter()
            .map(|c| &c.asset)
            .chain(account.borrows.iter().map(|b| &b.asset));
        for asset in assets {
            prices.quote(asset).ok().hash(&mut hasher);
        }
        params.hash(&mut hasher);
        Self(hasher.finish())
    }
}

/// Hit and miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    key: SnapshotKey,
    evaluation: Evaluation,
}

/// Evaluations from earlier snapshots, reused while their inputs are unchanged
#[derive(Debug, Clone, Default)]
pub struct EvaluationCache {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl EvaluationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the cached evaluation if it was computed under `key`.
    pub fn get(&self, position_id: &str, key: SnapshotKey) -> Option<&Evaluation> {
        self.entries
            .get(position_id)
            .filter(|e| e.key == key)
            .map(|e| &e.evaluation)
    }

    /// Returns the cached evaluation for `position_id`, recomputing it with
    /// `evaluate` when absent or when `key` has changed.
    pub fn get_or_insert_with(
        &mut self,
        position_id: &str,
        key: SnapshotKey,
        evaluate: impl FnOnce() -> Evaluation,
    ) -> Evaluation {
        match self.entries.entry(position_id.to_string()) {
            Entry::Occupied(mut slot) => {
                if slot.get().key == key {
                    self.hits += 1;
                    return slot.get().evaluation.clone();
                }
                debug!(position = position_id, "cached evaluation invalidated");
                self.misses += 1;
                let evaluation = evaluate();
                slot.insert(CacheEntry {
                    key,
                    evaluation: evaluation.clone(),
                });
                evaluation
            }
            Entry::Vacant(slot) => {
                self.misses += 1;
                let evaluation = evaluate();
                slot.insert(CacheEntry {
                    key,
                    evaluation: evaluation.clone(),
                });
                evaluation
            }
        }
    }

    /// Drops one entry. Returns whether it was present.
    pub fn invalidate(&mut self, position_id: &str) -> bool {
        self.entries.remove(position_id).is_some()
    }

    /// Evicts every position not in `live`. Returns the number evicted.
    pub fn retain_ids<'a>(&mut self, live: impl IntoIterator<Item = &'a str>) -> usize {
        let live: HashSet<&str> = live.into_iter().collect();
        let before = self.entries.len();
        self.entries.retain(|id, _| live.contains(id.as_str()));
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, "evicted positions absent from snapshot");
        }
        evicted
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use crate::irm::InterestConfig;
    use crate::pool::{PoolConfig, PoolState};
    use crate::price::{AssetAmount, PriceQuote};
    use crate::snapshot::BorrowShares;

    fn pool() -> Pool {
        Pool {
            asset: AssetId::from("USDC"),
            decimals: 6,
            state: PoolState {
                supply: 1_000,
                borrow: 500,
                supply_shares: 1_000,
                borrow_shares: 500,
                last_update_timestamp: 0,
            },
            config: PoolConfig {
                supply_cap: 10_000,
                max_utilization_rate: 900_000_000,
                protocol_spread: 0,
                min_borrow: 1,
            },
            interest: InterestConfig {
                base_rate: 0,
                base_slope: 0,
                optimal_utilization: 800_000_000,
                excess_slope: 0,
            },
        }
    }

    fn account() -> BorrowerAccount {
        BorrowerAccount {
            id: "alice".to_string(),
            collateral: vec![AssetAmount::new("SUI", 100, 9)],
            borrows: vec![BorrowShares {
                asset: AssetId::from("USDC"),
                shares: 10,
            }],
        }
    }

    fn prices(sui_as_of: u64) -> PriceBook {
        PriceBook::new(vec![
            PriceQuote {
                asset_id: AssetId::from("SUI"),
                usd_price: 1,
                price_decimals: 0,
                as_of_timestamp: sui_as_of,
            },
            PriceQuote {
                asset_id: AssetId::from("USDC"),
                usd_price: 1,
                price_decimals: 0,
                as_of_timestamp: 0,
            },
        ])
    }

    fn key(pool: &Pool, prices: &PriceBook, params: &RiskParams) -> SnapshotKey {
        let pools = HashMap::from([(&pool.asset, pool)]);
        SnapshotKey::for_account(&account(), &pools, prices, params)
    }

    fn marker(id: &str) -> Evaluation {
        Evaluation::Unevaluable {
            position_id: id.to_string(),
            reason: SimError::DivisionByZero,
        }
    }

    #[test]
    fn test_key_is_stable() {
        let pool = pool();
        let params = RiskParams::default();
        assert_eq!(key(&pool, &prices(0), &params), key(&pool, &prices(0), &params));
    }

    #[test]
    fn test_key_changes_with_inputs() {
        let pool = pool();
        let params = RiskParams::default();
        let base = key(&pool, &prices(0), &params);

        let mut moved = pool.clone();
        moved.state.borrow += 1;
        assert_ne!(base, key(&moved, &prices(0), &params));

        // Same price, newer timestamp
        assert_ne!(base, key(&pool, &prices(1), &params));

        let stricter = RiskParams {
            liquidation_threshold: params.liquidation_threshold + 1,
            ..params
        };
        assert_ne!(base, key(&pool, &prices(0), &stricter));
    }

    #[test]
    fn test_key_ignores_unrelated_pools() {
        let pool = pool();
        let mut other = pool.clone();
        other.asset = AssetId::from("WETH");
        let params = RiskParams::default();

        let alone = HashMap::from([(&pool.asset, &pool)]);
        let both = HashMap::from([(&pool.asset, &pool), (&other.asset, &other)]);
        assert_eq!(
            SnapshotKey::for_account(&account(), &alone, &prices(0), &params),
            SnapshotKey::for_account(&account(), &both, &prices(0), &params)
        );
    }

    #[test]
    fn test_hit_reuses_evaluation() {
        let mut cache = EvaluationCache::new();
        let k = key(&pool(), &prices(0), &RiskParams::default());
        cache.get_or_insert_with("alice", k, || marker("first"));
        let again = cache.get_or_insert_with("alice", k, || marker("second"));
        assert_eq!(again.position_id(), "first");
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                entries: 1
            }
        );
    }

    #[test]
    fn test_changed_key_recomputes() {
        let mut cache = EvaluationCache::new();
        let params = RiskParams::default();
        cache.get_or_insert_with("alice", key(&pool(), &prices(0), &params), || marker("old"));
        let k2 = key(&pool(), &prices(5), &params);
        let fresh = cache.get_or_insert_with("alice", k2, || marker("new"));
        assert_eq!(fresh.position_id(), "new");
        assert_eq!(cache.get("alice", k2).map(Evaluation::position_id), Some("new"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_retain_evicts_absent_positions() {
        let mut cache = EvaluationCache::new();
        let k = key(&pool(), &prices(0), &RiskParams::default());
        cache.get_or_insert_with("alice", k, || marker("a"));
        cache.get_or_insert_with("bob", k, || marker("b"));
        assert_eq!(cache.retain_ids(["alice"]), 1);
        assert!(cache.get("bob", k).is_none());
        assert!(cache.get("alice", k).is_some());
        assert!(cache.invalidate("alice"));
        assert!(cache.is_empty());
    }
}
