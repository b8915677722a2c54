//! Vertex identifiers.
//!
//! A [`VertexId`] names one slot of the sequence for its whole life. It is
//! opaque to the reducer apart from its total order.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crdt::types::replica::ReplicaId;
use crate::crdt::types::timestamp::LamportTimestamp;

/// Globally unique, totally ordered identity of a vertex.
///
/// Newtype over [`LamportTimestamp`]; it inherits the timestamp's ordering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VertexId(pub LamportTimestamp);

/// An insert anchor: `None` is the head sentinel, the virtual position before
/// the first vertex.
pub type Anchor = Option<VertexId>;

impl VertexId {
    /// Creates an id with sequence number zero.
    pub fn new(counter: u64, replica_id: ReplicaId) -> Self {
        Self::new_with_sequence(counter, replica_id, 0)
    }

    pub fn new_with_sequence(counter: u64, replica_id: ReplicaId, sequence: u32) -> Self {
        VertexId(LamportTimestamp {
            counter,
            replica_id,
            sequence,
        })
    }

    pub fn timestamp(&self) -> LamportTimestamp {
        self.0
    }

    pub fn counter(&self) -> u64 {
        self.0.counter
    }

    pub fn replica_id(&self) -> ReplicaId {
        self.0.replica_id
    }
}

impl From<LamportTimestamp> for VertexId {
    fn from(timestamp: LamportTimestamp) -> Self {
        VertexId(timestamp)
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Source of fresh vertex ids.
///
/// Implementations must never hand out the same id twice, on this replica or
/// any other.
pub trait IdSource {
    fn next_id(&self) -> VertexId;
}

impl<S: IdSource + ?Sized> IdSource for &S {
    fn next_id(&self) -> VertexId {
        (**self).next_id()
    }
}
