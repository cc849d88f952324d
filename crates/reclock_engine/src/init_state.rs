//! Initial-state reconstruction: assigning reset values to moved registers.
//!
//! A forward-retimed register's reset value is whatever the gate it crossed
//! would have computed from the old reset values, so forward motion is a
//! bounded forward simulation. Backward motion cannot be simulated out of
//! thin air; instead the whole vector is shifted forward by the most
//! negative lag and the replay oracle supplies the pre-reset "ancestor"
//! state plus the input vectors that drive the circuit from it back to
//! reset. The simulation consumes fan-in register values oldest-first and
//! appends computed outputs newest-first, and as a side effect walks every
//! edge weight from its original to its retimed value.

use crate::oracle::ReplayOracle;
use reclock_common::{InternalError, Logic, ReclockResult};
use reclock_graph::{NodeId, NodeKind, RetimeGraph, Retiming};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Result of a reconstruction attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitOutcome {
    /// The graph now carries the retimed weights and concrete (possibly
    /// unknown) reset values.
    Initialized,
    /// The oracle could not supply a replay sequence; the graph is
    /// untouched.
    CannotInitialize,
}

/// Applies `retiming` to `graph` while computing reset values for every
/// register, consulting `oracle` when registers move backward across the
/// circuit boundary.
pub fn reconstruct(
    graph: &mut RetimeGraph,
    retiming: &Retiming,
    oracle: Option<&dyn ReplayOracle>,
) -> ReclockResult<InitOutcome> {
    if retiming.is_identity() {
        return Ok(InitOutcome::Initialized);
    }
    let n = graph.node_count();
    let rewind = -retiming.min_lag().min(0);
    let n_shift = (retiming.max_lag() + rewind).max(0) as usize;

    // Per-edge register queues, oldest first, seeded with the reset values
    // of the original weights.
    let mut queues: Vec<VecDeque<Logic>> = Vec::with_capacity(graph.edge_count());
    let mut inputs = Vec::new();
    if rewind > 0 {
        let Some(oracle) = oracle else {
            return Ok(InitOutcome::CannotInitialize);
        };
        let Some(trace) = oracle.replay(graph, n_shift) else {
            return Ok(InitOutcome::CannotInitialize);
        };
        if (trace.inputs.len() as i64) < rewind {
            return Ok(InitOutcome::CannotInitialize);
        }
        for (id, edge) in graph.edges() {
            let mut values: VecDeque<Logic> = trace
                .ancestor
                .get(&id)
                .map(|v| v.iter().copied().collect())
                .unwrap_or_default();
            values.resize(edge.weight.max(0) as usize, Logic::X);
            queues.push(values);
        }
        inputs = trace.inputs;
    } else {
        for (_, edge) in graph.edges() {
            let mut values: VecDeque<Logic> = edge
                .initial_values
                .as_ref()
                .map(|v| v.iter().copied().collect())
                .unwrap_or_default();
            values.resize(edge.weight.max(0) as usize, Logic::X);
            queues.push(values);
        }
    }

    // remaining(v) = −(lag(v) + rewind): the number of forward steps still
    // owed, counted up toward zero.
    let mut remaining: Vec<i64> = (0..n)
        .map(|v| -(retiming.lag(NodeId::from_raw(v as u32)) + rewind))
        .collect();
    let mut replay_cursor = vec![0usize; n];
    let ready = |graph: &RetimeGraph, queues: &[VecDeque<Logic>], v: NodeId| {
        graph
            .node(v)
            .fanins
            .iter()
            .all(|&e| !queues[e.index()].is_empty())
    };
    let mut stack: Vec<NodeId> = graph
        .node_ids()
        .filter(|&v| remaining[v.index()] < 0 && ready(graph, &queues, v))
        .collect();

    while let Some(v) = stack.pop() {
        if remaining[v.index()] >= 0 || !ready(graph, &queues, v) {
            // Satisfied already, or waiting on a fan-in producer that will
            // push it again.
            continue;
        }
        let need = -remaining[v.index()];
        let available = graph
            .node(v)
            .fanins
            .iter()
            .map(|&e| queues[e.index()].len() as i64)
            .min();
        let local_shift = available.map_or(need, |a| a.min(need));
        if local_shift <= 0 {
            return Err(InternalError::new(
                "replay simulation stalled on an unproducible register value",
            ));
        }

        let node = graph.node(v);
        match node.kind {
            NodeKind::PrimaryInput => {
                for _ in 0..local_shift {
                    let value = inputs
                        .get(replay_cursor[v.index()])
                        .and_then(|m| m.get(&v))
                        .copied()
                        .unwrap_or(Logic::X);
                    replay_cursor[v.index()] += 1;
                    for &e in &node.fanouts {
                        queues[e.index()].push_back(value);
                    }
                }
            }
            NodeKind::PrimaryOutput => {
                for _ in 0..local_shift {
                    for &e in &node.fanins {
                        queues[e.index()].pop_front();
                    }
                }
            }
            NodeKind::Internal => {
                for _ in 0..local_shift {
                    let mut values = Vec::with_capacity(node.fanins.len());
                    for &e in &node.fanins {
                        values.push(
                            queues[e.index()]
                                .pop_front()
                                .ok_or_else(|| InternalError::new("fan-in queue underflow"))?,
                        );
                    }
                    let out = node.function.map(|f| f.eval(&values)).unwrap_or(Logic::X);
                    for &e in &node.fanouts {
                        queues[e.index()].push_back(out);
                    }
                }
            }
            NodeKind::Ignore => {
                return Err(InternalError::new(
                    "sharing bookkeeping node present in a live graph",
                ));
            }
        }
        remaining[v.index()] += local_shift;

        let fanouts = graph.node(v).fanouts.clone();
        for e in fanouts {
            let sink = graph.edge(e).to;
            if remaining[sink.index()] < 0 {
                stack.push(sink);
            }
        }
        if remaining[v.index()] < 0 {
            stack.push(v);
        }
    }

    for (v, &r) in remaining.iter().enumerate() {
        if r != 0 {
            return Err(InternalError::new(format!(
                "node {v} ended replay with counter {r}, expected 0",
            )));
        }
    }

    // The queues now hold the retimed register contents; fold them back
    // into the edges.
    for id in graph.edge_ids().collect::<Vec<_>>() {
        let queue = std::mem::take(&mut queues[id.index()]);
        let edge = graph.edge_mut(id);
        let expected = edge.weight + retiming.lag(edge.from) - retiming.lag(edge.to);
        if queue.len() as i64 != expected {
            return Err(InternalError::new(format!(
                "edge ended replay with {} values, expected weight {expected}",
                queue.len(),
            )));
        }
        if edge.weight != expected {
            edge.weight = expected;
            edge.registers.clear();
        }
        edge.initial_values = Some(queue.into_iter().collect());
    }
    Ok(InitOutcome::Initialized)
}

/// The unknown-state fallback: applies the retiming and marks the reset
/// value of every register without one as unknown.
pub fn apply_with_unknown_state(graph: &mut RetimeGraph, retiming: &Retiming) {
    graph.apply_retiming(retiming);
    for id in graph.edge_ids().collect::<Vec<_>>() {
        let edge = graph.edge_mut(id);
        if edge.initial_values.is_none() {
            edge.initial_values = Some(vec![Logic::X; edge.weight.max(0) as usize]);
            edge.registers.clear();
        }
    }
}
