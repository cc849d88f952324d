//! The retiming graph: arena-backed nodes and edges with retiming operations.

use crate::arena::Arena;
use crate::edge::RetimeEdge;
use crate::ids::{EdgeId, NodeId};
use crate::node::{NodeFunction, NodeKind, RetimeNode};
use crate::retiming::Retiming;
use reclock_common::{Ident, Interner};
use reclock_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use serde::{Deserialize, Serialize};

/// A retiming graph for a single synchronous circuit.
///
/// Built once from an external netlist, duplicated before each optimistic
/// feasibility attempt (failed attempts are simply dropped), and mutated in
/// place only when a retiming has been accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetimeGraph {
    nodes: Arena<NodeId, RetimeNode>,
    edges: Arena<EdgeId, RetimeEdge>,
}

impl RetimeGraph {
    /// Creates an empty retiming graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node and returns its ID.
    pub fn add_node(&mut self, name: Ident, kind: NodeKind, delay: f64, area: f64) -> NodeId {
        let id = NodeId::from_raw(self.nodes.len() as u32);
        self.nodes.alloc(RetimeNode {
            id,
            name,
            kind,
            delay,
            area,
            user_time: None,
            function: None,
            fanins: Vec::new(),
            fanouts: Vec::new(),
            scaled_delay: 0,
            scaled_user_time: 0,
        })
    }

    /// Adds a directed edge and returns its ID.
    ///
    /// Idempotent: if an edge with identical endpoints, fan-in index, and
    /// weight already exists, the existing edge is returned instead of a
    /// duplicate being created.
    pub fn add_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        sink_fanin_index: usize,
        weight: i64,
        breadth: f64,
    ) -> EdgeId {
        for &eid in &self.nodes[from].fanouts {
            let e = &self.edges[eid];
            if e.to == to && e.sink_fanin_index == sink_fanin_index && e.weight == weight {
                return eid;
            }
        }
        let id = EdgeId::from_raw(self.edges.len() as u32);
        self.edges.alloc(RetimeEdge {
            id,
            from,
            to,
            sink_fanin_index,
            weight,
            breadth,
            initial_values: None,
            registers: Vec::new(),
        });
        self.nodes[from].fanouts.push(id);
        let fanins = &mut self.nodes[to].fanins;
        fanins.push(id);
        // Keep fan-ins ordered by position so function evaluation sees its
        // inputs in the right order.
        let edges = &self.edges;
        fanins.sort_by_key(|&e| edges[e].sink_fanin_index);
        id
    }

    /// Sets the externally specified arrival/required time of a node.
    pub fn set_user_time(&mut self, node: NodeId, user_time: Option<f64>) {
        self.nodes[node].user_time = user_time;
    }

    /// Sets the combinational function of a node.
    pub fn set_function(&mut self, node: NodeId, function: NodeFunction) {
        self.nodes[node].function = Some(function);
    }

    /// Returns the node with the given ID.
    pub fn node(&self, id: NodeId) -> &RetimeNode {
        &self.nodes[id]
    }

    /// Returns the node with the given ID, mutably.
    pub fn node_mut(&mut self, id: NodeId) -> &mut RetimeNode {
        &mut self.nodes[id]
    }

    /// Returns the edge with the given ID.
    pub fn edge(&self, id: EdgeId) -> &RetimeEdge {
        &self.edges[id]
    }

    /// Returns the edge with the given ID, mutably.
    pub fn edge_mut(&mut self, id: EdgeId) -> &mut RetimeEdge {
        &mut self.edges[id]
    }

    /// Total number of nodes (including any `Ignore` nodes).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes excluding `Ignore` bookkeeping nodes.
    pub fn real_node_count(&self) -> usize {
        self.nodes.iter().filter(|(_, n)| !n.is_ignore()).count()
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Iterates over `(id, node)` pairs.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &RetimeNode)> {
        self.nodes.iter()
    }

    /// Iterates over `(id, edge)` pairs.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &RetimeEdge)> {
        self.edges.iter()
    }

    /// Iterates over all node IDs.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        self.nodes.ids()
    }

    /// Iterates over all edge IDs.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> {
        self.edges.ids()
    }

    /// All primary input node IDs.
    pub fn primary_inputs(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.is_primary_input())
            .map(|(id, _)| id)
            .collect()
    }

    /// All primary output node IDs.
    pub fn primary_outputs(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.is_primary_output())
            .map(|(id, _)| id)
            .collect()
    }

    /// Produces an isomorphic copy preserving all indices and annotations.
    ///
    /// Every feasibility attempt works on a duplicate so a failed attempt can
    /// be discarded without touching the live graph.
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    /// Applies a single node's lag: fan-in edge weights are incremented and
    /// fan-out edge weights decremented by `lag`. Cached initial values on
    /// the touched edges are invalidated. A zero lag is a no-op.
    pub fn retime_node(&mut self, node: NodeId, lag: i64) {
        if lag == 0 {
            return;
        }
        let fanins = self.nodes[node].fanins.clone();
        let fanouts = self.nodes[node].fanouts.clone();
        for eid in fanins {
            let e = &mut self.edges[eid];
            e.weight += lag;
            e.invalidate_initial_values();
        }
        for eid in fanouts {
            let e = &mut self.edges[eid];
            e.weight -= lag;
            e.invalidate_initial_values();
        }
    }

    /// Applies a retiming vector edge-wise: `w(u→v) += r(u) − r(v)`.
    ///
    /// Initial values are invalidated only on edges whose weight actually
    /// changes.
    pub fn apply_retiming(&mut self, retiming: &Retiming) {
        for (_, e) in self.edges.iter_mut() {
            let delta = retiming.lag(e.from) - retiming.lag(e.to);
            if delta != 0 {
                e.weight += delta;
                e.invalidate_initial_values();
            }
        }
    }

    /// Returns `true` if any edge currently has a negative weight.
    pub fn has_negative_weight(&self) -> bool {
        self.edges.iter().any(|(_, e)| e.weight < 0)
    }

    /// The smallest fan-in edge weight of `node`, or `None` if it has no
    /// fan-ins.
    pub fn min_fanin_weight(&self, node: NodeId) -> Option<i64> {
        self.nodes[node]
            .fanins
            .iter()
            .map(|&e| self.edges[e].weight)
            .min()
    }

    /// Returns `true` if any outgoing edge of `node` carries a register.
    pub fn has_registered_fanout(&self, node: NodeId) -> bool {
        self.nodes[node]
            .fanouts
            .iter()
            .any(|&e| self.edges[e].weight >= 1)
    }

    /// Total effective register count: `Σ breadth × weight` over all edges.
    pub fn total_register_breadth(&self) -> f64 {
        self.edges
            .iter()
            .map(|(_, e)| e.breadth * e.weight as f64)
            .sum()
    }

    /// Checks the structural invariants, emitting a diagnostic for each
    /// violation. Returns `true` if the graph is clean.
    ///
    /// Invariants: primary inputs have no fan-in, primary outputs no
    /// fan-out, no edge has a negative weight, and cached initial values
    /// (when present) match their edge's weight.
    pub fn check(&self, interner: &Interner, sink: &DiagnosticSink) -> bool {
        let mut clean = true;
        for (_, node) in self.nodes.iter() {
            if node.is_primary_input() && !node.fanins.is_empty() {
                clean = false;
                sink.emit(
                    Diagnostic::error(
                        DiagnosticCode::new(Category::Graph, 1),
                        "primary input has fan-in",
                    )
                    .with_entity(interner.resolve(node.name)),
                );
            }
            if node.is_primary_output() && !node.fanouts.is_empty() {
                clean = false;
                sink.emit(
                    Diagnostic::error(
                        DiagnosticCode::new(Category::Graph, 2),
                        "primary output has fan-out",
                    )
                    .with_entity(interner.resolve(node.name)),
                );
            }
        }
        for (_, edge) in self.edges.iter() {
            if edge.weight < 0 {
                clean = false;
                sink.emit(
                    Diagnostic::error(
                        DiagnosticCode::new(Category::Graph, 3),
                        format!("edge weight {} is negative", edge.weight),
                    )
                    .with_entity(self.edge_label(edge, interner)),
                );
            }
            if !edge.initial_values_consistent() {
                clean = false;
                sink.emit(
                    Diagnostic::error(
                        DiagnosticCode::new(Category::Graph, 4),
                        "initial value count does not match edge weight",
                    )
                    .with_entity(self.edge_label(edge, interner)),
                );
            }
        }
        clean
    }

    fn edge_label(&self, edge: &RetimeEdge, interner: &Interner) -> String {
        format!(
            "{}->{}",
            interner.resolve(self.nodes[edge.from].name),
            interner.resolve(self.nodes[edge.to].name)
        )
    }
}
