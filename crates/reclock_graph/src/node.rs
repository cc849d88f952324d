//! Node records: combinational gates, primary I/O, and sharing bookkeeping.

use crate::ids::{EdgeId, NodeId};
use reclock_common::{Ident, Logic};
use serde::{Deserialize, Serialize};

/// The functional type of a retiming graph node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum NodeKind {
    /// A combinational gate internal to the circuit.
    Internal,
    /// A primary input of the circuit (no fan-in allowed).
    PrimaryInput,
    /// A primary output of the circuit (no fan-out allowed).
    PrimaryOutput,
    /// A bookkeeping node inserted to model register sharing across a fanout
    /// point for the min-register LP. Never appears in the retimed netlist.
    Ignore,
}

/// The combinational function computed by an internal node.
///
/// Only the initial-state reconstruction evaluates node functions; the
/// feasibility algorithms care solely about delays and weights. Fan-in values
/// are presented in `sink_fanin_index` order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum NodeFunction {
    /// Constant output regardless of inputs.
    Const(Logic),
    /// Identity of the single input.
    Buf,
    /// Negation of the single input.
    Not,
    /// N-ary AND.
    And,
    /// N-ary OR.
    Or,
    /// N-ary NAND.
    Nand,
    /// N-ary NOR.
    Nor,
    /// N-ary XOR (parity).
    Xor,
    /// N-ary XNOR (inverted parity).
    Xnor,
}

impl NodeFunction {
    /// Evaluates the function over the given fan-in values.
    ///
    /// An empty input slice yields the identity element of the gate (or the
    /// constant itself); unknown inputs propagate per the [`Logic`] truth
    /// tables.
    pub fn eval(self, inputs: &[Logic]) -> Logic {
        match self {
            NodeFunction::Const(v) => v,
            NodeFunction::Buf => inputs.first().copied().unwrap_or(Logic::X),
            NodeFunction::Not => !inputs.first().copied().unwrap_or(Logic::X),
            NodeFunction::And => inputs.iter().copied().fold(Logic::One, |a, b| a & b),
            NodeFunction::Or => inputs.iter().copied().fold(Logic::Zero, |a, b| a | b),
            NodeFunction::Nand => !inputs.iter().copied().fold(Logic::One, |a, b| a & b),
            NodeFunction::Nor => !inputs.iter().copied().fold(Logic::Zero, |a, b| a | b),
            NodeFunction::Xor => inputs.iter().copied().fold(Logic::Zero, |a, b| a ^ b),
            NodeFunction::Xnor => !inputs.iter().copied().fold(Logic::Zero, |a, b| a ^ b),
        }
    }
}

/// A node in the retiming graph.
///
/// `delay` and `area` are opaque annotations supplied by the external
/// netlist-to-graph collaborator (library lookup or unit model). `user_time`
/// is an optional externally specified arrival time (primary inputs) or
/// required time (primary outputs). The scaled integer copies of delay and
/// user time are populated only while the min-register LP builds its mixed
/// integer/real tableau.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetimeNode {
    /// The unique ID of this node (its stable arena index).
    pub id: NodeId,
    /// Interned name of this node.
    pub name: Ident,
    /// The functional type of this node.
    pub kind: NodeKind,
    /// Propagation delay through this node (`final_delay`).
    pub delay: f64,
    /// Area annotation (`final_area`).
    pub area: f64,
    /// Externally specified arrival/required time, if any.
    pub user_time: Option<f64>,
    /// Combinational function, needed only for initial-state reconstruction.
    pub function: Option<NodeFunction>,
    /// Incoming edges, ordered by `sink_fanin_index`.
    pub fanins: Vec<EdgeId>,
    /// Outgoing edges.
    pub fanouts: Vec<EdgeId>,
    /// Scaled integer delay, valid only inside the min-register LP.
    pub scaled_delay: i64,
    /// Scaled integer user time, valid only inside the min-register LP.
    pub scaled_user_time: i64,
}

impl RetimeNode {
    /// Returns `true` for primary inputs.
    pub fn is_primary_input(&self) -> bool {
        self.kind == NodeKind::PrimaryInput
    }

    /// Returns `true` for primary outputs.
    pub fn is_primary_output(&self) -> bool {
        self.kind == NodeKind::PrimaryOutput
    }

    /// Returns `true` for sharing bookkeeping nodes.
    pub fn is_ignore(&self) -> bool {
        self.kind == NodeKind::Ignore
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reclock_common::Logic::*;

    #[test]
    fn eval_not() {
        assert_eq!(NodeFunction::Not.eval(&[Zero]), One);
        assert_eq!(NodeFunction::Not.eval(&[One]), Zero);
        assert_eq!(NodeFunction::Not.eval(&[X]), X);
    }

    #[test]
    fn eval_and_or() {
        assert_eq!(NodeFunction::And.eval(&[One, One, One]), One);
        assert_eq!(NodeFunction::And.eval(&[One, Zero, X]), Zero);
        assert_eq!(NodeFunction::Or.eval(&[Zero, Zero, One]), One);
        assert_eq!(NodeFunction::Or.eval(&[Zero, X]), X);
    }

    #[test]
    fn eval_nand_nor() {
        assert_eq!(NodeFunction::Nand.eval(&[One, One]), Zero);
        assert_eq!(NodeFunction::Nand.eval(&[One, Zero]), One);
        assert_eq!(NodeFunction::Nor.eval(&[Zero, Zero]), One);
        assert_eq!(NodeFunction::Nor.eval(&[One, Zero]), Zero);
    }

    #[test]
    fn eval_parity() {
        assert_eq!(NodeFunction::Xor.eval(&[One, One, One]), One);
        assert_eq!(NodeFunction::Xor.eval(&[One, One]), Zero);
        assert_eq!(NodeFunction::Xnor.eval(&[One, One]), One);
    }

    #[test]
    fn eval_const_ignores_inputs() {
        assert_eq!(NodeFunction::Const(One).eval(&[Zero, Zero]), One);
        assert_eq!(NodeFunction::Const(X).eval(&[]), X);
    }

    #[test]
    fn eval_unknown_poisons_and_only_when_undecided() {
        // A dominating Zero still wins over X.
        assert_eq!(NodeFunction::And.eval(&[Zero, X]), Zero);
        assert_eq!(NodeFunction::Or.eval(&[One, X]), One);
        assert_eq!(NodeFunction::Xor.eval(&[One, X]), X);
    }

    #[test]
    fn eval_buf_empty_is_unknown() {
        assert_eq!(NodeFunction::Buf.eval(&[]), X);
    }
}
