//! The all-pairs weight/delay table used by the period constraints of the
//! min-register LP.
//!
//! `W[i][j]` is the minimum number of registers on any path from position `i`
//! to position `j`; `D[i][j]` is the worst-case combinational delay along a
//! minimum-weight path. Two extra positions model the external environment:
//! a host source feeding every primary input and a host sink fed by every
//! primary output, so paths through the outside world constrain the LP like
//! any other path.
//!
//! The closure runs Floyd–Warshall over lexicographic `(weight, delay)`
//! labels where the delay component is kept *negated* (so the plain
//! lexicographic minimum picks the smallest weight and, among ties, the
//! largest delay). [`WdTable::compute`] then converts each label into the
//! path delay `delay(j) − d` that the LP consumes.

use reclock_graph::{NodeId, RetimeGraph, RetimeNode};
use serde::{Deserialize, Serialize};

/// Weight reserved for unconnected position pairs.
pub const UNREACHABLE_WEIGHT: i64 = i64::MAX;

/// One cell of the weight/delay table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WdEntry {
    /// Minimum register count over all connecting paths.
    pub weight: i64,
    /// During closure: negated accumulated departure delay along a
    /// minimum-weight path. After conversion: the worst-case path delay.
    pub delay: f64,
}

impl WdEntry {
    /// Returns `true` if at least one path connects the pair.
    pub fn is_reachable(&self) -> bool {
        self.weight != UNREACHABLE_WEIGHT
    }
}

/// The dense `(n+2) × (n+2)` weight/delay table of a retiming graph.
///
/// Positions `0..n` are the graph's nodes by index; position `n` is the host
/// source and `n+1` the host sink.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WdTable {
    node_count: usize,
    entries: Vec<WdEntry>,
}

impl WdTable {
    /// Number of positions (nodes plus the two host positions).
    pub fn positions(&self) -> usize {
        self.node_count + 2
    }

    /// The host-source position (feeds all primary inputs).
    pub fn host_source(&self) -> usize {
        self.node_count
    }

    /// The host-sink position (fed by all primary outputs).
    pub fn host_sink(&self) -> usize {
        self.node_count + 1
    }

    /// The table position of a graph node.
    pub fn position(&self, node: NodeId) -> usize {
        node.index()
    }

    /// The entry for the ordered position pair `(i, j)`.
    pub fn entry(&self, i: usize, j: usize) -> WdEntry {
        self.entries[i * self.positions() + j]
    }

    fn entry_mut(&mut self, i: usize, j: usize) -> &mut WdEntry {
        let p = self.positions();
        &mut self.entries[i * p + j]
    }

    /// Relaxes `(i, j)` with a candidate label: smaller weight wins, and a
    /// smaller (more negative) delay breaks ties toward the worst path.
    fn relax(&mut self, i: usize, j: usize, weight: i64, delay: f64) {
        let cur = self.entry_mut(i, j);
        if weight < cur.weight || (weight == cur.weight && delay < cur.delay) {
            *cur = WdEntry { weight, delay };
        }
    }

    /// Builds the unconverted closure: delays are still negated departure
    /// sums. Exposed separately because the closure's diagonal carries a
    /// useful sanity invariant (`weight == 0`, `delay <= 0`).
    pub fn closure(graph: &RetimeGraph) -> Self {
        let n = graph.node_count();
        let positions = n + 2;
        let mut table = WdTable {
            node_count: n,
            entries: vec![
                WdEntry {
                    weight: UNREACHABLE_WEIGHT,
                    delay: 0.0,
                };
                positions * positions
            ],
        };
        for i in 0..positions {
            *table.entry_mut(i, i) = WdEntry {
                weight: 0,
                delay: 0.0,
            };
        }

        // Edge labels carry the plain source delay; externally specified
        // arrival/required offsets enter only through the host edges below,
        // so host-anchored paths see them exactly once.
        for (_, edge) in graph.edges() {
            let from: &RetimeNode = graph.node(edge.from);
            table.relax(edge.from.index(), edge.to.index(), edge.weight, -from.delay);
        }
        let host_source = table.host_source();
        let host_sink = table.host_sink();
        for pi in graph.primary_inputs() {
            let offset = graph.node(pi).user_time.unwrap_or(0.0);
            table.relax(host_source, pi.index(), 0, -offset);
        }
        for po in graph.primary_outputs() {
            let node = graph.node(po);
            let credit = node.delay - node.user_time.unwrap_or(0.0);
            table.relax(po.index(), host_sink, 0, -credit);
        }

        for k in 0..positions {
            for i in 0..positions {
                let ik = table.entry(i, k);
                if !ik.is_reachable() {
                    continue;
                }
                for j in 0..positions {
                    let kj = table.entry(k, j);
                    if !kj.is_reachable() {
                        continue;
                    }
                    table.relax(i, j, ik.weight + kj.weight, ik.delay + kj.delay);
                }
            }
        }
        table
    }

    /// Builds the finished table: closure plus conversion of every reachable
    /// label into the worst-case path delay `delay(j) − d`, where the host
    /// positions contribute no delay of their own.
    pub fn compute(graph: &RetimeGraph) -> Self {
        let mut table = Self::closure(graph);
        let positions = table.positions();
        for j in 0..positions {
            let own_delay = if j < table.node_count {
                graph.node(NodeId::from_raw(j as u32)).delay
            } else {
                0.0
            };
            for i in 0..positions {
                let cell = table.entry_mut(i, j);
                if cell.is_reachable() {
                    cell.delay = own_delay - cell.delay;
                }
            }
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reclock_common::Interner;
    use reclock_graph::NodeKind;

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
    fn closure_diagonal_invariant() {
        let interner = Interner::new();
        let (g, _) = pipeline(&interner);
        let table = WdTable::closure(&g);
        for i in 0..table.positions() {
            let d = table.entry(i, i);
            assert_eq!(d.weight, 0);
            assert!(d.delay <= 0.0);
        }
    }

    #[test]
    fn path_weights_count_registers() {
        let interner = Interner::new();
        let (g, n) = pipeline(&interner);
        let t = WdTable::compute(&g);
        assert_eq!(t.entry(n[0].index(), n[1].index()).weight, 0);
        assert_eq!(t.entry(n[0].index(), n[2].index()).weight, 1);
        assert_eq!(t.entry(n[0].index(), n[3].index()).weight, 1);
        assert_eq!(t.entry(t.host_source(), t.host_sink()).weight, 1);
    }

    #[test]
    fn path_delays_sum_gate_delays() {
        let interner = Interner::new();
        let (g, n) = pipeline(&interner);
        let t = WdTable::compute(&g);
        // in -> a: delays 0 + 2
        assert_eq!(t.entry(n[0].index(), n[1].index()).delay, 2.0);
        // in -> a -> b: 0 + 2 + 3 along the unique (1-register) path
        assert_eq!(t.entry(n[0].index(), n[2].index()).delay, 5.0);
        // host source through the whole pipeline to host sink
        assert_eq!(t.entry(t.host_source(), t.host_sink()).delay, 5.0);
    }

    #[test]
    fn converted_diagonal_is_own_delay() {
        let interner = Interner::new();
        let (g, n) = pipeline(&interner);
        let t = WdTable::compute(&g);
        assert_eq!(t.entry(n[1].index(), n[1].index()).delay, 2.0);
        assert_eq!(t.entry(n[2].index(), n[2].index()).delay, 3.0);
        assert_eq!(t.entry(t.host_source(), t.host_source()).delay, 0.0);
    }

    #[test]
    fn unreachable_pairs_flagged() {
        let interner = Interner::new();
        let (g, n) = pipeline(&interner);
        let t = WdTable::compute(&g);
        assert!(!t.entry(n[3].index(), n[0].index()).is_reachable());
    }

    #[test]
    fn min_weight_beats_shorter_delay() {
        // Two a->c paths: direct with 1 register (delay 2+1), through b with
        // 0 registers (delay 2+4+1). The 0-register path must win.
        let interner = Interner::new();
        let mut g = RetimeGraph::new();
        let a = g.add_node(interner.get_or_intern("a"), NodeKind::Internal, 2.0, 1.0);
        let b = g.add_node(interner.get_or_intern("b"), NodeKind::Internal, 4.0, 1.0);
        let c = g.add_node(interner.get_or_intern("c"), NodeKind::Internal, 1.0, 1.0);
        g.add_edge(a, c, 0, 1, 1.0);
        g.add_edge(a, b, 0, 0, 1.0);
        g.add_edge(b, c, 1, 0, 1.0);
        let t = WdTable::compute(&g);
        let e = t.entry(a.index(), c.index());
        assert_eq!(e.weight, 0);
        assert_eq!(e.delay, 7.0);
    }

    #[test]
    fn weight_tie_takes_worst_delay() {
        // Two zero-register a->c paths; the slower one (through b) defines D.
        let interner = Interner::new();
        let mut g = RetimeGraph::new();
        let a = g.add_node(interner.get_or_intern("a"), NodeKind::Internal, 2.0, 1.0);
        let b = g.add_node(interner.get_or_intern("b"), NodeKind::Internal, 4.0, 1.0);
        let c = g.add_node(interner.get_or_intern("c"), NodeKind::Internal, 1.0, 1.0);
        g.add_edge(a, c, 0, 0, 1.0);
        g.add_edge(a, b, 0, 0, 1.0);
        g.add_edge(b, c, 1, 0, 1.0);
        let t = WdTable::compute(&g);
        let e = t.entry(a.index(), c.index());
        assert_eq!(e.weight, 0);
        assert_eq!(e.delay, 7.0);
    }

    #[test]
    fn user_times_shift_host_paths() {
        let interner = Interner::new();
        let (mut g, n) = pipeline(&interner);
        g.set_user_time(n[0], Some(1.0)); // input arrives late
        g.set_user_time(n[3], Some(0.5)); // output may be late by 0.5
        let t = WdTable::compute(&g);
        // host -> b: 1.0 (arrival) + 0 (in) + 2 (a) + 3 (b)
        assert_eq!(t.entry(t.host_source(), n[2].index()).delay, 6.0);
        // b -> host sink: 3 (b) + 0 (out) - 0.5 credit
        assert_eq!(t.entry(n[2].index(), t.host_sink()).delay, 2.5);
    }
}
