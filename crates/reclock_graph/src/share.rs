//! Register-sharing bookkeeping nodes for the min-register LP.
//!
//! A node driving several fan-outs shares one physical register bank across
//! all of them: retiming the driver moves the *same* registers past every
//! fan-out, and the bank's depth is the maximum fan-out weight, not the sum.
//! The LP cannot express a max directly, so each multi-fanout point gets an
//! `Ignore` node wired as the classic sharing gadget: one mirror edge from
//! every fan-out node into the `Ignore` node, weighted
//! `max_fanout_weight − edge_weight`, with the breadth of the original and
//! mirror edges split evenly across the fan-outs. The LP objective then
//! counts the shared bank exactly once.
//!
//! MILP and Nanni feasibility do not need the gadget and must not see it.

use crate::graph::RetimeGraph;
use crate::ids::NodeId;
use crate::node::NodeKind;
use reclock_common::Interner;

/// Inserts an `Ignore` sharing node behind every multi-fanout node.
///
/// Operates in place (intended for a duplicate, not the live graph) and
/// returns the number of sharing nodes added. Idempotent in effect: `Ignore`
/// nodes themselves have single-fanout mirror edges only, so a second pass
/// adds nothing new for them.
pub fn insert_sharing(graph: &mut RetimeGraph, interner: &Interner) -> usize {
    let candidates: Vec<NodeId> = graph
        .nodes()
        .filter(|(_, n)| !n.is_ignore() && n.fanouts.len() > 1)
        .map(|(id, _)| id)
        .collect();

    let mut added = 0;
    for v in candidates {
        let fanouts = graph.node(v).fanouts.clone();
        let k = fanouts.len() as f64;
        let max_weight = fanouts
            .iter()
            .map(|&e| graph.edge(e).weight)
            .max()
            .unwrap_or(0);

        let name = format!("{}$share", interner.resolve(graph.node(v).name));
        let share = graph.add_node(interner.get_or_intern(&name), NodeKind::Ignore, 0.0, 0.0);
        added += 1;

        for (position, &eid) in fanouts.iter().enumerate() {
            let (sink, weight, breadth) = {
                let e = graph.edge(eid);
                (e.to, e.weight, e.breadth)
            };
            let shared_breadth = breadth / k;
            graph.edge_mut(eid).breadth = shared_breadth;
            graph.add_edge(sink, share, position, max_weight - weight, shared_breadth);
        }
    }
    added
}
