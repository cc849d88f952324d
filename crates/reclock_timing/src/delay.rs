//! Arrival-time propagation and cycle-delay evaluation.
//!
//! Combinational paths are exactly the zero-weight edges of the retiming
//! graph: a register on an edge cuts the path. Arrival times are computed by
//! iterative relaxation over the zero-weight edges until a fixed point, which
//! a legal graph (no zero-weight cycles) reaches within `node_count` passes.

use reclock_common::{InternalError, ReclockResult};
use reclock_graph::{NodeKind, RetimeGraph, RetimeNode};

/// The delay a signal accumulates when it leaves `node`.
///
/// Primary inputs fold their externally specified arrival offset into the
/// departure so downstream logic sees it for free.
fn departure_offset(node: &RetimeNode) -> f64 {
    if node.is_primary_input() {
        node.delay + node.user_time.unwrap_or(0.0)
    } else {
        node.delay
    }
}

/// Computes the worst-case arrival time at the output of every node for the
/// graph's current edge weights, indexed by node.
///
/// Fails if relaxation has not converged after `node_count` passes, which can
/// only happen when a cycle carries no register at all.
pub fn arrival_times(graph: &RetimeGraph) -> ReclockResult<Vec<f64>> {
    let mut arrival: Vec<f64> = graph.nodes().map(|(_, n)| departure_offset(n)).collect();
    for _ in 0..=graph.node_count() {
        let mut changed = false;
        for (_, edge) in graph.edges() {
            if edge.weight != 0 {
                continue;
            }
            let candidate =
                arrival[edge.from.index()] + departure_offset(graph.node(edge.to));
            if candidate > arrival[edge.to.index()] {
                arrival[edge.to.index()] = candidate;
                changed = true;
            }
        }
        if !changed {
            return Ok(arrival);
        }
    }
    Err(InternalError::new(
        "arrival times did not converge: graph has a register-free cycle",
    ))
}

/// The minimum clock period the graph supports with its current register
/// placement.
///
/// Every node contributes its arrival time, plus `register_delay` when a
/// register sits directly on one of its fan-outs (the path must also traverse
/// the register), minus the required-time credit of a constrained primary
/// output.
pub fn cycle_delay(graph: &RetimeGraph, register_delay: f64) -> ReclockResult<f64> {
    let arrival = arrival_times(graph)?;
    let mut worst: f64 = 0.0;
    for (id, node) in graph.nodes() {
        if node.is_ignore() {
            continue;
        }
        let mut t = arrival[id.index()];
        if graph.has_registered_fanout(id) {
            t += register_delay;
        }
        if node.is_primary_output() {
            if let Some(required) = node.user_time {
                t -= required;
            }
        }
        worst = worst.max(t);
    }
    Ok(worst)
}

/// A lower bound on any achievable clock period: no retiming can split a
/// single gate, so the slowest internal node is unbeatable.
pub fn cycle_lower_bound(graph: &RetimeGraph) -> f64 {
    graph
        .nodes()
        .filter(|(_, n)| n.kind == NodeKind::Internal)
        .map(|(_, n)| n.delay)
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reclock_common::Interner;
    use reclock_graph::NodeId;

    fn pipeline(interner: &Interner) -> (RetimeGraph, Vec<NodeId>) {
        // in (PI) -> a(2) -> b(3) -> out (PO), register between a and b
        let mut g = RetimeGraph::new();
        let pi = g.add_node(
            interner.get_or_intern("in"),
            NodeKind::PrimaryInput,
            0.0,
            0.0,
        );
        let a = g.add_node(interner.get_or_intern("a"), NodeKind::Internal, 2.0, 1.0);
        let b = g.add_node(interner.get_or_intern("b"), NodeKind::Internal, 3.0, 1.0);
        let po = g.add_node(
            interner.get_or_intern("out"),
            NodeKind::PrimaryOutput,
            0.0,
            0.0,
        );
        g.add_edge(pi, a, 0, 0, 1.0);
        g.add_edge(a, b, 0, 1, 1.0);
        g.add_edge(b, po, 0, 0, 1.0);
        (g, vec![pi, a, b, po])
    }

    #[test]
    fn arrival_respects_register_cut() {
        let interner = Interner::new();
        let (g, n) = pipeline(&interner);
        let arr = arrival_times(&g).unwrap();
        assert_eq!(arr[n[1].index()], 2.0); // in -> a
        assert_eq!(arr[n[2].index()], 3.0); // register resets the path
        assert_eq!(arr[n[3].index()], 3.0); // b -> out, zero weight
    }

    #[test]
    fn arrival_accumulates_on_zero_weight_path() {
        let interner = Interner::new();
        let (mut g, n) = pipeline(&interner);
        // Move the register off a->b: now in->a->b is combinational.
        let ab = g.node(n[1]).fanouts[0];
        let bo = g.node(n[3]).fanins[0];
        g.edge_mut(ab).weight = 0;
        g.edge_mut(bo).weight = 1;
        let arr = arrival_times(&g).unwrap();
        assert_eq!(arr[n[2].index()], 5.0);
    }

    #[test]
    fn cycle_delay_includes_register_crossing() {
        let interner = Interner::new();
        let (g, _) = pipeline(&interner);
        assert_eq!(cycle_delay(&g, 0.0).unwrap(), 3.0);
        // a (arrival 2) crosses the a->b register; with a slow enough
        // register that path dominates b's combinational 3.0.
        assert_eq!(cycle_delay(&g, 2.0).unwrap(), 4.0);
    }

    #[test]
    fn pi_user_time_shifts_arrival() {
        let interner = Interner::new();
        let (mut g, n) = pipeline(&interner);
        g.set_user_time(n[0], Some(1.5));
        let arr = arrival_times(&g).unwrap();
        assert_eq!(arr[n[1].index()], 3.5);
    }

    #[test]
    fn po_user_time_credits_required_path() {
        let interner = Interner::new();
        let (mut g, n) = pipeline(&interner);
        g.set_user_time(n[3], Some(2.0));
        // out's contribution drops from 3.0 to 1.0; a's register crossing
        // (2.0 + register_delay) dominates once register_delay > 1.
        assert_eq!(cycle_delay(&g, 2.0).unwrap(), 4.0);
    }

    #[test]
    fn lower_bound_is_slowest_gate() {
        let interner = Interner::new();
        let (g, _) = pipeline(&interner);
        assert_eq!(cycle_lower_bound(&g), 3.0);
    }

    #[test]
    fn register_free_cycle_is_an_error() {
        let interner = Interner::new();
        let mut g = RetimeGraph::new();
        let a = g.add_node(interner.get_or_intern("a"), NodeKind::Internal, 1.0, 1.0);
        let b = g.add_node(interner.get_or_intern("b"), NodeKind::Internal, 1.0, 1.0);
        g.add_edge(a, b, 0, 0, 1.0);
        g.add_edge(b, a, 0, 0, 1.0);
        assert!(arrival_times(&g).is_err());
    }

    #[test]
    fn registered_cycle_converges() {
        let interner = Interner::new();
        let mut g = RetimeGraph::new();
        let a = g.add_node(interner.get_or_intern("a"), NodeKind::Internal, 1.0, 1.0);
        let b = g.add_node(interner.get_or_intern("b"), NodeKind::Internal, 2.0, 1.0);
        g.add_edge(a, b, 0, 0, 1.0);
        g.add_edge(b, a, 0, 1, 1.0);
        let arr = arrival_times(&g).unwrap();
        assert_eq!(arr[a.index()], 1.0);
        assert_eq!(arr[b.index()], 3.0);
    }
}
