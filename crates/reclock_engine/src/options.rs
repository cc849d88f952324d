//! Caller-facing retiming options.

use reclock_solve::Algorithm;
use serde::{Deserialize, Serialize};

/// Options controlling a [`retime`](crate::retime) run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetimeOptions {
    /// Feasibility/optimization strategy.
    pub algorithm: Algorithm,
    /// Clock period to meet. `None` asks for the minimum achievable period
    /// (binary search), or for register minimization at the current period
    /// when the algorithm is [`Algorithm::MinRegister`].
    pub target_period: Option<f64>,
    /// Absolute convergence tolerance of the binary search.
    pub tolerance: f64,
    /// Propagation delay charged for crossing a register.
    pub register_delay: f64,
    /// When initial states cannot be reconstructed, keep the retiming and
    /// mark every register value unknown instead of abandoning it.
    pub keep_unknown_state: bool,
}

impl Default for RetimeOptions {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            target_period: None,
            tolerance: 0.01,
            register_delay: 0.0,
            keep_unknown_state: false,
        }
    }
}
