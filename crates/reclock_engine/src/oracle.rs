//! The replay oracle seam.
//!
//! Shifting registers backward across the circuit boundary needs knowledge
//! the graph does not carry: the primary-input sequence that drives the
//! circuit from an earlier "ancestor" state into its designated reset state,
//! and the register values of that ancestor state. A sequential-equivalence
//! engine owns that knowledge; this trait is its seam.

use reclock_common::Logic;
use reclock_graph::{EdgeId, NodeId, RetimeGraph};
use std::collections::HashMap;

/// Everything initial-state reconstruction needs to rewind the circuit.
#[derive(Clone, Debug, Default)]
pub struct ReplayTrace {
    /// One value map per replayed clock cycle, oldest first. A primary
    /// input missing from a map is driven unknown for that cycle.
    pub inputs: Vec<HashMap<NodeId, Logic>>,
    /// Register values of the ancestor state, oldest first per edge, for
    /// the original (pre-retiming) edge weights. Edges missing from the map
    /// power up unknown.
    pub ancestor: HashMap<EdgeId, Vec<Logic>>,
}

/// Supplier of replay sequences for initial-state reconstruction.
pub trait ReplayOracle {
    /// Produces an ancestor state and `n_shift` input vectors driving the
    /// circuit from it back to reset, or `None` when no such sequence
    /// exists within the oracle's bounded search.
    fn replay(&self, graph: &RetimeGraph, n_shift: usize) -> Option<ReplayTrace>;
}
