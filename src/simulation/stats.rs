//! Per-generation statistics.

use serde::{Deserialize, Serialize};

use super::runner::Runner;

/// Number of values in a [`PercentileSummary`].
pub const PERCENTILE_POINTS: usize = 11;

/// Eleven points of a rank-ordered distribution, from maximum to minimum.
///
/// For `n` values sorted best first, the points are read at positions
/// `0, n/10, n/5, (n/10)*3, (n/5)*2, n/2, (n/5)*3, (n/10)*7, (n/5)*4,
/// (n/10)*9` and `n - 1`, using integer division.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileSummary {
    /// Values at the positions listed above.
    pub values: [f64; PERCENTILE_POINTS],
}

/// Positions read by [`PercentileSummary::from_sorted`] for `n` values.
pub fn percentile_positions(n: usize) -> [usize; PERCENTILE_POINTS] {
    [
        0,
        n / 10,
        n / 5,
        n / 10 * 3,
        n / 5 * 2,
        n / 2,
        n / 5 * 3,
        n / 10 * 7,
        n / 5 * 4,
        n / 10 * 9,
        n.saturating_sub(1),
    ]
}

impl PercentileSummary {
    /// Reads the summary from values sorted in descending order.
    ///
    /// Returns `None` for an empty slice.
    pub fn from_sorted(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let positions = percentile_positions(values.len());
        Some(Self {
            values: positions.map(|i| values[i]),
        })
    }

    /// Highest value.
    pub fn max(&self) -> f64 {
        self.values[0]
    }

    /// Value at position `n / 2`.
    pub fn median(&self) -> f64 {
        self.values[5]
    }

    /// Lowest value.
    pub fn min(&self) -> f64 {
        self.values[PERCENTILE_POINTS - 1]
    }
}

/// Which snapshot of a generation to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapshotRank {
    /// Last in rank order.
    Worst,
    /// Rank `n / 2`.
    Median,
    /// First in rank order.
    Best,
}

/// Copies of the worst, median and best runner of one generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSnapshot {
    /// Last in rank order.
    pub worst: Runner,
    /// Rank `n / 2`.
    pub median: Runner,
    /// First in rank order.
    pub best: Runner,
}

impl GenerationSnapshot {
    /// Clones the snapshot runners from a ranked, non-empty population.
    pub fn from_ranked(runners: &[Runner]) -> Option<Self> {
        Some(Self {
            best: runners.first()?.clone(),
            median: runners[runners.len() / 2].clone(),
            worst: runners.last()?.clone(),
        })
    }

    /// The runner stored for `rank`.
    pub fn get(&self, rank: SnapshotRank) -> &Runner {
        match rank {
            SnapshotRank::Worst => &self.worst,
            SnapshotRank::Median => &self.median,
            SnapshotRank::Best => &self.best,
        }
    }
}
