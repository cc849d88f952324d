//! Delay analysis and the weight/delay closure for the Reclock engine.
//!
//! [`delay`] evaluates arrival times and the achievable clock period of a
//! retiming graph for its *current* edge weights. [`wd`] computes the
//! all-pairs weight/delay table bounding legal register sharing: for every
//! ordered pair of positions, the minimum register count of any connecting
//! path and the worst-case combinational delay along a minimum-weight path.

#![warn(missing_docs)]

pub mod delay;
pub mod wd;

pub use delay::{arrival_times, cycle_delay, cycle_lower_bound};
pub use wd::{WdEntry, WdTable};
