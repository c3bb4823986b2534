//! Histogram of positions by risk ratio.

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::math::{format_fixed, FLOAT_SCALING};
use crate::risk::AtRiskPosition;

/// Ascending risk-ratio boundaries, scaled by [`FLOAT_SCALING`]
///
/// `n` boundaries split the ratio axis into `n + 1` buckets. Each bucket
/// includes its lower bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u64>", into = "Vec<u64>")]
pub struct BucketBoundaries(Vec<u64>);

impl BucketBoundaries {
    pub fn new(boundaries: Vec<u64>) -> Result<Self, SimError> {
        if boundaries.is_empty() {
            return Err(SimError::InvalidBuckets {
                reason: "at least one boundary is required".to_string(),
            });
        }
        if let Some(pair) = boundaries.windows(2).find(|w| w[0] >= w[1]) {
            return Err(SimError::InvalidBuckets {
                reason: format!(
                    "boundaries must be strictly increasing, found {} then {}",
                    pair[0], pair[1]
                ),
            });
        }
        Ok(Self(boundaries))
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    /// Number of buckets produced.
    pub fn bucket_count(&self) -> usize {
        self.0.len() + 1
    }

    fn index_of(&self, position: &AtRiskPosition) -> usize {
        if position.is_liquidatable {
            return 0;
        }
        self.0
            .partition_point(|&b| u128::from(b) <= position.risk_ratio)
    }
}

impl Default for BucketBoundaries {
    fn default() -> Self {
        Self(vec![
            FLOAT_SCALING,
            1_100_000_000,
            1_250_000_000,
            1_500_000_000,
            2 * FLOAT_SCALING,
        ])
    }
}

impl TryFrom<Vec<u64>> for BucketBoundaries {
    type Error = SimError;

    fn try_from(value: Vec<u64>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BucketBoundaries> for Vec<u64> {
    fn from(value: BucketBoundaries) -> Self {
        value.0
    }
}

/// One bar of the risk histogram
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskDistributionBucket {
    pub label: String,
    /// Inclusive lower bound; `None` for the first bucket
    pub lower: Option<u64>,
    /// Exclusive upper bound; `None` for the last bucket
    pub upper: Option<u64>,
    pub count: usize,
    pub total_debt_usd: u128,
    /// `#rrggbb`, red for the riskiest bucket through green for the safest
    pub color: String,
}

/// Buckets positions by risk ratio.
///
/// Liquidatable positions always land in the first bucket, whatever their
/// ratio. Empty buckets are kept with a zero count.
pub fn bucket<'a>(
    positions: impl IntoIterator<Item = &'a AtRiskPosition>,
    boundaries: &BucketBoundaries,
) -> Vec<RiskDistributionBucket> {
    let bounds = boundaries.as_slice();
    let last = bounds.len();
    let mut buckets: Vec<RiskDistributionBucket> = (0..=last)
        .map(|i| {
            let lower = i.checked_sub(1).and_then(|j| bounds.get(j).copied());
            let upper = bounds.get(i).copied();
            RiskDistributionBucket {
                label: label(lower, upper),
                lower,
                upper,
                count: 0,
                total_debt_usd: 0,
                color: color(i, last),
            }
        })
        .collect();

    for position in positions {
        if let Some(b) = buckets.get_mut(boundaries.index_of(position)) {
            b.count += 1;
            b.total_debt_usd = b.total_debt_usd.saturating_add(position.debt_usd);
        }
    }
    buckets
}

fn label(lower: Option<u64>, upper: Option<u64>) -> String {
    let fmt = |v: u64| format_fixed(u128::from(v));
    match (lower, upper) {
        (None, Some(hi)) => format!("<{}", fmt(hi)),
        (Some(lo), Some(hi)) => format!("{}-{}", fmt(lo), fmt(hi)),
        (Some(lo), None) => format!(">={}", fmt(lo)),
        (None, None) => "all".to_string(),
    }
}

// Linear red -> green ramp
fn color(index: usize, last: usize) -> String {
    if last == 0 {
        return "#00ff00".to_string();
    }
    let green = index * 255 / last;
    let red = 255 - green;
    format!("#{red:02x}{green:02x}00")
}
