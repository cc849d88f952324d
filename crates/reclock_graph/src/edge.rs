//! Edge records: directed connections carrying registers.

use crate::ids::{EdgeId, NodeId, RegisterId};
use reclock_common::Logic;
use serde::{Deserialize, Serialize};

/// A directed edge in the retiming graph.
///
/// The edge runs from the output of `from` into fan-in position
/// `sink_fanin_index` of `to`, and carries `weight` registers. `breadth` is
/// the fractional register-sharing weight used for register-count accounting
/// across fanout points; a plain two-point net has breadth 1.
///
/// `initial_values` caches the reset value of each register on the edge,
/// oldest first (index 0 is consumed first by the sink). It is `None` until
/// initial-state reconstruction has run, and is invalidated whenever a
/// retiming moves registers across either endpoint. When present, its length
/// equals `weight`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetimeEdge {
    /// The unique ID of this edge.
    pub id: EdgeId,
    /// The source node.
    pub from: NodeId,
    /// The sink node.
    pub to: NodeId,
    /// Which fan-in position of the sink this edge feeds.
    pub sink_fanin_index: usize,
    /// Number of registers currently on this edge.
    pub weight: i64,
    /// Fractional register-sharing weight for register-count accounting.
    pub breadth: f64,
    /// Reset values of the registers on this edge, oldest first.
    pub initial_values: Option<Vec<Logic>>,
    /// Handles of the concrete netlist registers this edge represents.
    ///
    /// Populated by the netlist-to-graph collaborator; empty once the
    /// collaborator detaches.
    pub registers: Vec<RegisterId>,
}

impl RetimeEdge {
    /// Returns `true` if the initial values are consistent with the weight.
    ///
    /// Absent values are consistent by definition ("not yet computed").
    pub fn initial_values_consistent(&self) -> bool {
        match &self.initial_values {
            None => true,
            Some(values) => values.len() as i64 == self.weight,
        }
    }

    /// Drops any cached initial values (used after the edge's register count
    /// changes).
    pub fn invalidate_initial_values(&mut self) {
        self.initial_values = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reclock_common::Logic;

    fn edge(weight: i64) -> RetimeEdge {
        RetimeEdge {
            id: EdgeId::from_raw(0),
            from: NodeId::from_raw(0),
            to: NodeId::from_raw(1),
            sink_fanin_index: 0,
            weight,
            breadth: 1.0,
            initial_values: None,
            registers: Vec::new(),
        }
    }

    #[test]
    fn absent_values_are_consistent() {
        assert!(edge(3).initial_values_consistent());
    }

    #[test]
    fn matching_values_are_consistent() {
        let mut e = edge(2);
        e.initial_values = Some(vec![Logic::Zero, Logic::One]);
        assert!(e.initial_values_consistent());
    }

    #[test]
    fn mismatched_values_are_inconsistent() {
        let mut e = edge(2);
        e.initial_values = Some(vec![Logic::Zero]);
        assert!(!e.initial_values_consistent());
    }

    #[test]
    fn invalidate_clears() {
        let mut e = edge(1);
        e.initial_values = Some(vec![Logic::One]);
        e.invalidate_initial_values();
        assert!(e.initial_values.is_none());
    }
}
