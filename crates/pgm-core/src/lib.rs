#![deny(missing_docs)]
#![doc = "Core object contract, identifiers, errors and deterministic randomness for the PGM runtime."]

use serde::{Deserialize, Serialize};

pub mod errors;
pub mod object;
pub mod rng;
mod value;

pub use errors::{ErrorInfo, PgmError};
pub use object::{
    downcast_factor, downcast_variable, AsAny, Component, Factor, Member, MemberLabel, MemberRole,
    Members, ObjectIdentity, ObjectRef, Variable,
};
pub use rng::{derive_substream_seed, RngHandle};
pub use value::VariableValue;

/// Identifier for a node within an accessibility graph.
///
/// Identifiers are dense indices assigned in discovery order, which makes them
/// a stable, deterministic ordering key across runs of the same model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Creates a new identifier from its raw integer representation.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw integer representation of the identifier.
    pub fn as_raw(&self) -> u64 {
        self.0
    }

    /// Returns the identifier as an arena index.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}
