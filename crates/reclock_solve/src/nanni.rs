//! Iterative forward-retiming feasibility (Nanni's algorithm).
//!
//! Each round retimes every node whose arrival time exceeds the target
//! forward by one, then compensates the circuit boundary: all remaining
//! primary outputs are delayed by one and the zero-weight input cone is
//! pulled forward by one so primary inputs keep pace. Registers therefore
//! only ever migrate from the input side toward the outputs; a target that
//! needs backward motion is reported infeasible even when the MILP would
//! find a retiming. The iteration count is bounded by the node count.

use crate::Feasibility;
use reclock_common::ReclockResult;
use reclock_graph::{NodeId, RetimeGraph, Retiming};
use reclock_timing::arrival_times;

const EPS: f64 = 1e-9;

/// Tests whether `target` is achievable by forward retiming alone.
pub fn solve(graph: &RetimeGraph, target: f64) -> ReclockResult<Feasibility> {
    let n = graph.node_count();
    let mut work = graph.duplicate();
    let mut forward = vec![0i64; n];
    let mut iterations = 0i64;

    loop {
        let arrival = arrival_times(&work)?;
        let mut slow = vec![false; n];
        let mut any_slow = false;
        for (id, node) in work.nodes() {
            let mut t = arrival[id.index()];
            if node.is_primary_output() {
                t -= node.user_time.unwrap_or(0.0);
            }
            if t > target + EPS {
                if node.is_primary_input() {
                    // A primary input's arrival is fixed; no register
                    // placement can lower it.
                    return Ok(Feasibility::Infeasible);
                }
                slow[id.index()] = true;
                any_slow = true;
            }
        }
        if !any_slow {
            break;
        }
        if iterations == n as i64 {
            return Ok(Feasibility::Infeasible);
        }
        iterations += 1;

        for v in 0..n {
            if slow[v] {
                let id = NodeId::from_raw(v as u32);
                work.retime_node(id, 1);
                forward[v] += 1;
            }
        }

        // Delay all outputs: primary outputs not already moved above keep
        // pace with the ones that were.
        for po in work.primary_outputs() {
            if !slow[po.index()] {
                work.retime_node(po, 1);
                forward[po.index()] += 1;
            }
        }

        // Speed up all inputs: pull the zero-weight input cone forward as a
        // unit, so the interior edge weights cancel and only registers at
        // the cone boundary actually move.
        let cone = zero_weight_cone(&work);
        for &v in &cone {
            if work.node(v).is_primary_output() && slow[v.index()] {
                // The input cone reaches straight through to a slow output;
                // the excess delay cannot be absorbed by forward motion.
                return Ok(Feasibility::Infeasible);
            }
        }
        for &v in &cone {
            work.retime_node(v, 1);
            forward[v.index()] += 1;
        }
    }

    // Primary inputs moved once per round; translating by the common input
    // lag leaves the boundary where it started.
    let lags: Vec<i64> = forward.iter().map(|&f| iterations - f).collect();
    Ok(Feasibility::Feasible(Retiming::from_lags(lags)))
}

/// Nodes reachable from a primary input through zero-weight edges, the
/// inputs themselves included.
fn zero_weight_cone(graph: &RetimeGraph) -> Vec<NodeId> {
    let mut in_cone = vec![false; graph.node_count()];
    let mut stack = graph.primary_inputs();
    for &pi in &stack {
        in_cone[pi.index()] = true;
    }
    let mut cone = Vec::new();
    while let Some(v) = stack.pop() {
        cone.push(v);
        for &eid in &graph.node(v).fanouts {
            let e = graph.edge(eid);
            if e.weight == 0 && !in_cone[e.to.index()] {
                in_cone[e.to.index()] = true;
                stack.push(e.to);
            }
        }
    }
    cone
}
