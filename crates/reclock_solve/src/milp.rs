//! Leiserson–Saxe mixed integer/real feasibility test.
//!
//! For a target period `c`, the circuit admits a legal retiming with every
//! combinational path at most `c` exactly when a system of difference
//! constraints over one integer lag variable `r(v)` and one real
//! arrival-fraction variable `ρ(v)` per node (plus the host pair) is
//! satisfiable. Each constraint `x_j − x_i ≤ a` becomes an arc `i → j` of
//! length `a` in an auxiliary graph, and the system is solved by fixed-point
//! relaxation from all-zero potentials, flooring every update to an integer
//! vertex. Divergence past the most negative possible simple-path sum, or a
//! round budget overrun, proves a negative cycle, i.e. infeasibility.

use crate::Feasibility;
use reclock_common::{InternalError, ReclockResult};
use reclock_graph::{RetimeGraph, Retiming};

const EPS: f64 = 1e-9;

struct Arc {
    from: usize,
    to: usize,
    length: f64,
}

/// The auxiliary constraint graph: integer vertices `0..n` (node lags) and
/// `2n` (host lag), real vertices `n..2n` and `2n + 1`.
struct ConstraintGraph {
    vertex_count: usize,
    node_count: usize,
    arcs: Vec<Arc>,
}

impl ConstraintGraph {
    fn is_integer(&self, vertex: usize) -> bool {
        vertex < self.node_count || vertex == 2 * self.node_count
    }

    fn host_int(&self) -> usize {
        2 * self.node_count
    }

    /// Emits the constraint `x[to] − x[from] ≤ length`.
    fn constrain(&mut self, from: usize, to: usize, length: f64) {
        self.arcs.push(Arc { from, to, length });
    }

    fn build(graph: &RetimeGraph, target: f64) -> Self {
        let n = graph.node_count();
        let mut cg = ConstraintGraph {
            vertex_count: 2 * n + 2,
            node_count: n,
            arcs: Vec::with_capacity(2 * graph.edge_count() + 2 * n + 8),
        };
        let int = |v: usize| v;
        let real = |v: usize| n + v;
        let host_int = 2 * n;
        let host_real = 2 * n + 1;

        // Per edge u→v: r(u) − r(v) ≤ w and ρ(u) − ρ(v) ≤ w − d(v)/c.
        for (_, e) in graph.edges() {
            let u = e.from.index();
            let v = e.to.index();
            let w = e.weight as f64;
            cg.constrain(int(v), int(u), w);
            cg.constrain(real(v), real(u), w - graph.node(e.to).delay / target);
        }

        // Per node, with ρ(v) = r(v) + arrival(v)/c: arrival(v) ≤ c gives
        // ρ(v) − r(v) ≤ 1, and arrival(v) ≥ d(v) gives r(v) − ρ(v) ≤ −d(v)/c.
        // A user arrival time delays a primary input's departure (lower
        // bound tightens); a user required time extends a primary output's
        // deadline (upper bound loosens).
        for (_, node) in graph.nodes() {
            let v = node.id.index();
            let mut lower = node.delay;
            let mut deadline = 1.0;
            if node.is_primary_input() {
                lower += node.user_time.unwrap_or(0.0);
            }
            if node.is_primary_output() {
                deadline += node.user_time.unwrap_or(0.0) / target;
            }
            cg.constrain(int(v), real(v), deadline);
            cg.constrain(real(v), int(v), -lower / target);
        }
        cg.constrain(host_int, host_real, 1.0);
        cg.constrain(host_real, host_int, 0.0);

        // Primary I/O lags are pinned to the host lag.
        for (_, node) in graph.nodes() {
            if node.is_primary_input() || node.is_primary_output() {
                let v = node.id.index();
                cg.constrain(int(v), host_int, 0.0);
                cg.constrain(host_int, int(v), 0.0);
            }
        }
        cg
    }
}

/// Tests whether `target` is achievable, returning the lag vector that
/// achieves it (host lag 0) or a definitive infeasible result.
pub fn solve(graph: &RetimeGraph, target: f64) -> ReclockResult<Feasibility> {
    if target <= 0.0 {
        return Ok(Feasibility::Infeasible);
    }
    if graph.node_count() == 0 {
        return Ok(Feasibility::Feasible(Retiming::zero(0)));
    }
    let cg = ConstraintGraph::build(graph, target);
    let vcount = cg.vertex_count;

    let max_len = cg
        .arcs
        .iter()
        .fold(0.0f64, |a, arc| a.max(arc.length.abs()));
    // Any potential reachable without a negative cycle stays above this.
    let divergence_floor = -2.0 * vcount as f64 * (max_len + 1.0);
    // Integer potentials step by whole units and are bounded below, real
    // potentials settle within a sweep per vertex once the integers stop;
    // a feasible system therefore converges well inside this budget.
    let round_budget = vcount * vcount * (max_len.ceil() as usize + 2) + 8;

    let mut potential = vec![0.0f64; vcount];
    let mut converged = false;
    'rounds: for _ in 0..round_budget {
        let mut changed = false;
        for arc in &cg.arcs {
            let mut candidate = potential[arc.from] + arc.length;
            if cg.is_integer(arc.to) {
                candidate = candidate.floor();
            }
            if candidate < potential[arc.to] - EPS {
                if candidate < divergence_floor {
                    return Ok(Feasibility::Infeasible);
                }
                potential[arc.to] = candidate;
                changed = true;
            }
        }
        if !changed {
            converged = true;
            break 'rounds;
        }
    }
    if !converged {
        return Ok(Feasibility::Infeasible);
    }

    if violated(&cg, &potential) {
        return Ok(Feasibility::Infeasible);
    }

    // Reduced costs must be non-negative once the potentials settle; a
    // negative one here is a relaxation bug, not a property of the circuit.
    for arc in &cg.arcs {
        let slack = arc.length + potential[arc.from] - potential[arc.to];
        if slack < -EPS {
            return Err(InternalError::new(format!(
                "negative constraint slack {slack} after relaxation",
            )));
        }
    }

    // Settle-smallest-first tightening of the real components: one linear
    // scan per vertex instead of a priority queue, matching the amortized
    // bound of the fractional phase.
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); vcount];
    for (i, arc) in cg.arcs.iter().enumerate() {
        outgoing[arc.from].push(i);
    }
    let mut settled = vec![false; vcount];
    for _ in 0..vcount {
        let mut pick: Option<usize> = None;
        for v in 0..vcount {
            if !settled[v] && pick.map_or(true, |p| potential[v] < potential[p]) {
                pick = Some(v);
            }
        }
        let Some(v) = pick else { break };
        settled[v] = true;
        for &i in &outgoing[v] {
            let arc = &cg.arcs[i];
            let mut candidate = potential[v] + arc.length;
            if cg.is_integer(arc.to) {
                candidate = candidate.floor();
            }
            if candidate < potential[arc.to] - EPS {
                potential[arc.to] = candidate;
            }
        }
    }
    if violated(&cg, &potential) {
        return Ok(Feasibility::Infeasible);
    }

    // Integer potentials are lags in the r(u) − r(v) ≤ w convention; re-base
    // on the host and negate into the public w + r(u) − r(v) convention.
    let host = potential[cg.host_int()];
    let lags: Vec<i64> = (0..graph.node_count())
        .map(|v| (host - potential[v]).round() as i64)
        .collect();
    Ok(Feasibility::Feasible(Retiming::from_lags(lags)))
}

fn violated(cg: &ConstraintGraph, potential: &[f64]) -> bool {
    cg.arcs
        .iter()
        .any(|arc| potential[arc.to] > potential[arc.from] + arc.length + EPS)
}
