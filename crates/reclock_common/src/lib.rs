//! Shared foundational types for the Reclock retiming engine.
//!
//! This crate provides interned identifiers for node names, three-state
//! register logic values, and the common result type used to report
//! internal-consistency faults.

#![warn(missing_docs)]

pub mod ident;
pub mod logic;
pub mod result;

pub use ident::{Ident, Interner};
pub use logic::Logic;
pub use result::{InternalError, ReclockResult};
