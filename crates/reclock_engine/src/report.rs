//! Result and outcome types returned to the driving command.

use reclock_graph::Retiming;
use serde::{Deserialize, Serialize};

/// What happened to the live graph, in the terms a driving command reports
/// to its user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RetimeOutcome {
    /// The graph already met the target; nothing was moved.
    NotNeeded,
    /// No legal retiming meets the requested target.
    Infeasible,
    /// A retiming was applied.
    Retimed {
        /// Realized clock period after the move.
        period: f64,
        /// `false` when initial register values had to be marked unknown.
        initialized: bool,
    },
    /// A feasible retiming was found but discarded because initial states
    /// could not be reconstructed and the caller did not opt into the
    /// unknown-state fallback. The graph is untouched.
    Abandoned {
        /// The period the discarded retiming would have realized.
        period: f64,
    },
}

/// Full result of a retiming run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetimeResult {
    /// Whether any feasible retiming for the request was found.
    pub feasible: bool,
    /// Clock period of the graph as the run left it.
    pub achieved_period: f64,
    /// The winning lag vector (identity when nothing moved).
    pub retiming: Retiming,
    /// Whether initial states could be reconstructed for the winning vector.
    pub can_initialize: bool,
    /// The user-visible outcome.
    pub outcome: RetimeOutcome,
}
