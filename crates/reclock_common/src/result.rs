//! Common result and error types for the Reclock engine.

/// The standard result type for fallible internal operations.
///
/// `Err` signals an internal-consistency violation (a bug in Reclock or a
/// malformed input graph), never an ordinary algorithmic outcome. An
/// infeasible clock period or an uninitializable retiming is reported
/// through plain return values, not through this type.
pub type ReclockResult<T> = Result<T, InternalError>;

/// An internal-consistency fault indicating a bug, not a property of the
/// circuit being retimed.
///
/// Typical sources: a feasibility algorithm producing a retiming whose
/// realized cycle delay disagrees with the delay analysis, a negative edge
/// weight surviving legalization, or a forward-simulation counter that does
/// not settle at zero.
#[derive(Debug, thiserror::Error)]
#[error("internal retiming fault: {message}")]
pub struct InternalError {
    /// Description of the fault.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal fault with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
