//! Diagnostic creation, severity management, and accumulation for Reclock.
//!
//! This crate provides structured [`Diagnostic`] messages with severity
//! levels and error codes, plus the thread-safe [`DiagnosticSink`] that
//! accumulates them while the retiming engine runs. Retiming has no source
//! files, so diagnostics carry the name of the offending graph entity
//! instead of a source span.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use severity::Severity;
pub use sink::DiagnosticSink;
