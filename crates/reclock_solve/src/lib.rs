//! Feasibility and optimization algorithms for the Reclock engine.
//!
//! Three interchangeable strategies answer "is clock period `c` achievable,
//! and with what lags?": the Leiserson–Saxe mixed integer/real relaxation
//! ([`milp`], complete), Nanni's iterative forward retiming ([`nanni`], fast
//! but forward-only), and the register-minimizing LP ([`minreg`], which also
//! optimizes register count at the target). All three speak the same
//! [`Feasibility`] vocabulary: an infeasible target is an ordinary answer,
//! never an error.

#![warn(missing_docs)]

pub mod milp;
pub mod minreg;
pub mod nanni;
pub mod simplex;

use reclock_common::ReclockResult;
use reclock_graph::{RetimeGraph, Retiming};
use serde::{Deserialize, Serialize};

/// Answer of a feasibility attempt at a fixed target period.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Feasibility {
    /// The target is achievable; the vector is legal and keeps the host
    /// (and primary I/O) lag at zero.
    Feasible(Retiming),
    /// No legal retiming meets the target.
    Infeasible,
}

impl Feasibility {
    /// Returns `true` for [`Feasibility::Feasible`].
    pub fn is_feasible(&self) -> bool {
        matches!(self, Feasibility::Feasible(_))
    }
}

/// The retiming strategy requested by the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    /// Leiserson–Saxe constraint-graph relaxation. Complete: reports
    /// infeasible only when no legal retiming meets the target.
    #[default]
    Milp,
    /// Nanni's iterative heuristic. Only moves registers forward, so it may
    /// report infeasible where [`Algorithm::Milp`] succeeds.
    Nanni,
    /// Register-count minimization at the target period. Requires the
    /// sharing gadget ([`reclock_graph::insert_sharing`]) on the graph it
    /// solves.
    MinRegister,
}

impl Algorithm {
    /// Whether this strategy optimizes register count (and therefore wants
    /// the sharing gadget inserted before solving).
    pub fn minimizes_registers(self) -> bool {
        matches!(self, Algorithm::MinRegister)
    }

    /// Runs the strategy against `graph` at `target`.
    pub fn solve(self, graph: &RetimeGraph, target: f64) -> ReclockResult<Feasibility> {
        match self {
            Algorithm::Milp => milp::solve(graph, target),
            Algorithm::Nanni => nanni::solve(graph, target),
            Algorithm::MinRegister => minreg::solve(graph, target),
        }
    }
}
