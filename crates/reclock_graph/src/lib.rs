//! Retiming graph model for the Reclock engine.
//!
//! A [`RetimeGraph`] is a directed graph of combinational nodes whose edges
//! carry a non-negative number of registers (the edge *weight*). Retiming
//! redistributes those registers without changing the circuit's observable
//! sequential behavior. This crate owns the graph representation and its
//! invariants:
//!
//! - every primary input has zero fan-in, every primary output zero fan-out;
//! - after legalization every edge weight is ≥ 0;
//! - an edge's cached initial (reset) values, when present, match its weight.
//!
//! Nodes and edges live in dense arenas indexed by `u32` ID newtypes, so a
//! graph duplicate is a plain clone that preserves all indices. The virtual
//! *host* node pair (circuit boundary) is not materialized here; solvers and
//! the weight/delay closure give it dedicated positions and pin its lag to 0.

#![warn(missing_docs)]

pub mod arena;
pub mod edge;
pub mod graph;
pub mod ids;
pub mod node;
pub mod retiming;
pub mod share;

pub use arena::{Arena, ArenaId};
pub use edge::RetimeEdge;
pub use graph::RetimeGraph;
pub use ids::{EdgeId, NodeId, RegisterId};
pub use node::{NodeFunction, NodeKind, RetimeNode};
pub use retiming::Retiming;
pub use share::insert_sharing;
