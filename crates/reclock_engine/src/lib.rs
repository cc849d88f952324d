//! The Reclock retiming engine: the caller-facing orchestration layer.
//!
//! Given a [`RetimeGraph`](reclock_graph::RetimeGraph) built from an external
//! netlist, [`retime`] finds a lag vector meeting the requested clock period
//! (or the minimum achievable one), reconstructs initial register states for
//! it, and applies it in place. Structural problems and noteworthy events are
//! reported through a [`DiagnosticSink`](reclock_diagnostics::DiagnosticSink);
//! internal-consistency faults surface as
//! [`InternalError`](reclock_common::InternalError).

#![warn(missing_docs)]

pub mod driver;
pub mod init_state;
pub mod options;
pub mod oracle;
pub mod report;

pub use driver::{legalize, retime};
pub use init_state::{apply_with_unknown_state, reconstruct, InitOutcome};
pub use options::RetimeOptions;
pub use oracle::{ReplayOracle, ReplayTrace};
pub use report::{RetimeOutcome, RetimeResult};

use reclock_common::{Interner, ReclockResult};
use reclock_diagnostics::DiagnosticSink;
use reclock_graph::RetimeGraph;

/// Cycle delay of the graph as it stands: the longest register-to-register,
/// input-to-register, register-to-output, or input-to-output combinational
/// path, with `register_delay` charged for each register crossing.
pub fn compute_cycle_delay(graph: &RetimeGraph, register_delay: f64) -> ReclockResult<f64> {
    reclock_timing::cycle_delay(graph, register_delay)
}

/// Checks the graph's structural invariants, emitting a diagnostic per
/// violation. Returns `true` when the graph is clean.
pub fn check_graph(graph: &RetimeGraph, interner: &Interner, sink: &DiagnosticSink) -> bool {
    graph.check(interner, sink)
}
