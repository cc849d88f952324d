//! Opaque ID newtypes for retiming graph entities.
//!
//! [`NodeId`], [`EdgeId`], and [`RegisterId`] are thin `u32` wrappers used as
//! arena indices. They are `Copy`, `Hash`, and `Serialize`/`Deserialize`.
//! `RegisterId` identifies a concrete register in the external netlist an
//! edge represents; the engine treats it as an opaque handle.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            /// Returns the index as a `usize` for direct table addressing.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl crate::arena::ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a node in the retiming graph.
    NodeId
);

define_id!(
    /// Opaque, copyable ID for an edge in the retiming graph.
    EdgeId
);

define_id!(
    /// Opaque handle to a concrete register in the external netlist.
    RegisterId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn node_id_roundtrip() {
        let id = NodeId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
        assert_eq!(id.index(), 42);
    }

    #[test]
    fn edge_id_equality() {
        let a = EdgeId::from_raw(7);
        let b = EdgeId::from_raw(7);
        let c = EdgeId::from_raw(8);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn node_id_hash_in_set() {
        let mut set = HashSet::new();
        set.insert(NodeId::from_raw(1));
        set.insert(NodeId::from_raw(2));
        set.insert(NodeId::from_raw(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn register_id_serde_roundtrip() {
        let id = RegisterId::from_raw(99);
        let json = serde_json::to_string(&id).unwrap();
        let restored: RegisterId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, restored);
    }

    #[test]
    fn id_debug_format() {
        let id = EdgeId::from_raw(42);
        let debug = format!("{id:?}");
        assert!(debug.contains("42"));
    }
}
