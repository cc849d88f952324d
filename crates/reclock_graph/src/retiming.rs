//! Retiming vectors: per-node integer lags.

use crate::graph::RetimeGraph;
use crate::ids::NodeId;
use serde::{Deserialize, Serialize};

/// A retiming vector: one integer lag per node, indexed by [`NodeId`].
///
/// Applying a retiming `r` transforms every edge weight `w(u→v)` into
/// `w(u→v) + r(u) − r(v)`. The virtual host node is not represented; its lag
/// is 0 by definition, and every algorithm that produces a `Retiming`
/// re-bases its solution so that invariant holds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retiming {
    lags: Vec<i64>,
}

impl Retiming {
    /// Creates the identity retiming over `n` nodes (all lags zero).
    pub fn zero(n: usize) -> Self {
        Self { lags: vec![0; n] }
    }

    /// Creates a retiming from a dense lag vector.
    pub fn from_lags(lags: Vec<i64>) -> Self {
        Self { lags }
    }

    /// Returns the lag of `node`, or 0 if the vector does not cover it.
    ///
    /// Out-of-range lookups happen when a vector computed on a
    /// sharing-augmented duplicate is applied to the original graph; the
    /// extra `Ignore` entries simply never get asked for.
    pub fn lag(&self, node: NodeId) -> i64 {
        self.lags.get(node.index()).copied().unwrap_or(0)
    }

    /// Sets the lag of `node`.
    ///
    /// # Panics
    ///
    /// Panics if the vector does not cover `node`.
    pub fn set_lag(&mut self, node: NodeId, lag: i64) {
        self.lags[node.index()] = lag;
    }

    /// Number of nodes covered.
    pub fn len(&self) -> usize {
        self.lags.len()
    }

    /// Returns `true` if the vector covers no nodes.
    pub fn is_empty(&self) -> bool {
        self.lags.is_empty()
    }

    /// Returns `true` if every lag is zero.
    pub fn is_identity(&self) -> bool {
        self.lags.iter().all(|&l| l == 0)
    }

    /// Number of nodes with a non-zero lag.
    pub fn retimed_node_count(&self) -> usize {
        self.lags.iter().filter(|&&l| l != 0).count()
    }

    /// The largest lag in the vector (0 for an empty vector).
    pub fn max_lag(&self) -> i64 {
        self.lags.iter().copied().max().unwrap_or(0)
    }

    /// The smallest lag in the vector (0 for an empty vector).
    pub fn min_lag(&self) -> i64 {
        self.lags.iter().copied().min().unwrap_or(0)
    }

    /// Returns the vector with every lag negated.
    pub fn negated(&self) -> Self {
        Self {
            lags: self.lags.iter().map(|&l| -l).collect(),
        }
    }

    /// Returns the vector with `offset` subtracted from every lag.
    pub fn translated(&self, offset: i64) -> Self {
        Self {
            lags: self.lags.iter().map(|&l| l - offset).collect(),
        }
    }

    /// Returns the vector truncated to the first `n` nodes (used to strip
    /// `Ignore`-node entries before applying to the original graph).
    pub fn truncated(&self, n: usize) -> Self {
        Self {
            lags: self.lags.iter().take(n).copied().collect(),
        }
    }

    /// Checks legality against a graph: every retimed edge weight must be
    /// non-negative.
    pub fn is_legal(&self, graph: &RetimeGraph) -> bool {
        graph
            .edges()
            .all(|(_, e)| e.weight + self.lag(e.from) - self.lag(e.to) >= 0)
    }

    /// Iterates over `(node, lag)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, i64)> + '_ {
        self.lags
            .iter()
            .enumerate()
            .map(|(i, &l)| (NodeId::from_raw(i as u32), l))
    }
}
