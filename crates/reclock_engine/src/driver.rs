//! The retiming driver: legalization, target selection, binary search over
//! the clock period, and finalization of the winning vector.

use crate::init_state::{self, InitOutcome};
use crate::options::RetimeOptions;
use crate::oracle::ReplayOracle;
use crate::report::{RetimeOutcome, RetimeResult};
use reclock_common::{InternalError, Interner, ReclockResult};
use reclock_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use reclock_graph::{insert_sharing, RetimeGraph, Retiming};
use reclock_solve::{milp, Feasibility};
use reclock_timing::{cycle_delay, cycle_lower_bound};

const EPS: f64 = 1e-9;

/// Restores every edge weight to a non-negative value without worsening the
/// cycle delay beyond the tolerance.
///
/// External graph construction (e.g. folding a netlist whose registers sit
/// inside fanout cones) can leave individual edges with negative weights
/// even though the circuit as a whole is consistent. A retiming at the
/// current cycle delay always exists for such graphs, so an infeasible
/// answer here is an internal fault, not a circuit property.
pub fn legalize(graph: &mut RetimeGraph, options: &RetimeOptions) -> ReclockResult<Retiming> {
    if !graph.has_negative_weight() {
        return Ok(Retiming::zero(graph.node_count()));
    }
    let current = cycle_delay(graph, options.register_delay)?;
    let target = current + options.tolerance - options.register_delay;
    match milp::solve(graph, target)? {
        Feasibility::Feasible(vector) => {
            graph.apply_retiming(&vector);
            if graph.has_negative_weight() {
                return Err(InternalError::new(
                    "negative edge weight survived legalization",
                ));
            }
            Ok(vector)
        }
        Feasibility::Infeasible => Err(InternalError::new(
            "legalization at the current cycle delay reported infeasible",
        )),
    }
}

/// One feasibility probe at a fixed period.
///
/// Solves on a duplicate (with the sharing gadget inserted when the strategy
/// minimizes registers), validates the returned vector, and measures the
/// period it actually realizes. Returns `None` when the solver reports the
/// target infeasible.
fn attempt(
    graph: &RetimeGraph,
    interner: &Interner,
    options: &RetimeOptions,
    attempting: f64,
) -> ReclockResult<Option<(Retiming, f64)>> {
    let mut work = graph.duplicate();
    if options.algorithm.minimizes_registers() {
        insert_sharing(&mut work, interner);
    }
    // Solvers bound pure combinational propagation; the register crossing
    // charge comes off the top.
    let solver_target = attempting - options.register_delay;
    match options.algorithm.solve(&work, solver_target)? {
        Feasibility::Infeasible => Ok(None),
        Feasibility::Feasible(vector) => {
            let vector = vector.truncated(graph.node_count());
            if !vector.is_legal(graph) {
                return Err(InternalError::new("solver returned an illegal retiming"));
            }
            let mut trial = graph.duplicate();
            trial.apply_retiming(&vector);
            let realized = cycle_delay(&trial, options.register_delay)?;
            if realized > attempting + EPS {
                return Err(InternalError::new(format!(
                    "solver accepted period {attempting} but the retimed graph realizes {realized}",
                )));
            }
            Ok(Some((vector, realized)))
        }
    }
}

fn not_needed(graph: &RetimeGraph, current: f64) -> RetimeResult {
    RetimeResult {
        feasible: true,
        achieved_period: current,
        retiming: Retiming::zero(graph.node_count()),
        can_initialize: true,
        outcome: RetimeOutcome::NotNeeded,
    }
}

/// Retimes `graph` in place according to `options`.
///
/// With a target period, a single feasibility probe decides the outcome;
/// without one, a binary search between the largest gate delay and the
/// current cycle delay finds the minimum achievable period within the
/// tolerance. The register-minimizing strategy probes once at the target (or
/// the current period when no target is given) and keeps whichever vector
/// the LP chose.
///
/// The graph is mutated only when a vector is accepted end to end,
/// including initial-state reconstruction; a reconstruction failure either
/// abandons the move or, when `keep_unknown_state` is set, applies it with
/// unknown reset values and a warning.
pub fn retime(
    graph: &mut RetimeGraph,
    interner: &Interner,
    options: &RetimeOptions,
    oracle: Option<&dyn ReplayOracle>,
    sink: &DiagnosticSink,
) -> ReclockResult<RetimeResult> {
    if graph.has_negative_weight() {
        legalize(graph, options)?;
    }
    let current = cycle_delay(graph, options.register_delay)?;

    if !options.algorithm.minimizes_registers() {
        if let Some(target) = options.target_period {
            if current <= target + EPS {
                return Ok(not_needed(graph, current));
            }
        }
    }

    let best = if options.algorithm.minimizes_registers() {
        let target = options.target_period.unwrap_or(current);
        attempt(graph, interner, options, target)?
    } else if let Some(target) = options.target_period {
        attempt(graph, interner, options, target)?
    } else {
        // Open-ended search. No retiming can beat the slowest gate, so probe
        // the floor first; only on a miss is the bisection worth running.
        let floor = cycle_lower_bound(graph);
        match attempt(graph, interner, options, floor)? {
            Some(hit) => Some(hit),
            None => {
                let mut failed = floor;
                let mut ceiling = current;
                let mut best = None;
                while ceiling - failed > options.tolerance {
                    let midpoint = 0.5 * (ceiling + failed);
                    match attempt(graph, interner, options, midpoint)? {
                        Some((vector, realized)) => {
                            ceiling = realized.min(midpoint);
                            best = Some((vector, realized));
                        }
                        None => failed = midpoint,
                    }
                }
                best
            }
        }
    };

    let Some((vector, period)) = best else {
        if options.target_period.is_some() || options.algorithm.minimizes_registers() {
            return Ok(RetimeResult {
                feasible: false,
                achieved_period: current,
                retiming: Retiming::zero(graph.node_count()),
                can_initialize: true,
                outcome: RetimeOutcome::Infeasible,
            });
        }
        // The open search found nothing below the current period.
        return Ok(not_needed(graph, current));
    };

    if vector.is_identity() {
        return Ok(not_needed(graph, current));
    }

    match init_state::reconstruct(graph, &vector, oracle)? {
        InitOutcome::Initialized => Ok(RetimeResult {
            feasible: true,
            achieved_period: period,
            retiming: vector,
            can_initialize: true,
            outcome: RetimeOutcome::Retimed {
                period,
                initialized: true,
            },
        }),
        InitOutcome::CannotInitialize if options.keep_unknown_state => {
            init_state::apply_with_unknown_state(graph, &vector);
            sink.emit(Diagnostic::warning(
                DiagnosticCode::new(Category::Reset, 1),
                "initial register states could not be reconstructed; reset values are unknown",
            ));
            Ok(RetimeResult {
                feasible: true,
                achieved_period: period,
                retiming: vector,
                can_initialize: false,
                outcome: RetimeOutcome::Retimed {
                    period,
                    initialized: false,
                },
            })
        }
        InitOutcome::CannotInitialize => {
            sink.emit(Diagnostic::warning(
                DiagnosticCode::new(Category::Reset, 2),
                format!("retiming to period {period} abandoned: initial states not reconstructible"),
            ));
            Ok(RetimeResult {
                feasible: true,
                achieved_period: current,
                retiming: Retiming::zero(graph.node_count()),
                can_initialize: false,
                outcome: RetimeOutcome::Abandoned { period },
            })
        }
    }
}
