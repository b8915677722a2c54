//! Lamport timestamps, the raw material of vertex ids.
//!
//! A [`LamportTimestamp`] is totally ordered and that order is identical on
//! every replica, which is what the reducer relies on to break ties between
//! concurrent inserts at the same anchor.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::crdt::types::replica::ReplicaId;

/// A logical counter stamped with the replica that produced it.
///
/// # Ordering
///
/// Timestamps compare by `counter`, then `sequence`, then `replica_id`. The
/// replica id is the final tie-breaker, so two replicas can never produce
/// timestamps that compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LamportTimestamp {
    /// The logical clock value when this timestamp was created
    pub counter: u64,
    /// The replica that created this timestamp
    pub replica_id: ReplicaId,
    /// Local issue order on the originating replica
    pub sequence: u32,
}

impl PartialOrd for LamportTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LamportTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.counter
            .cmp(&other.counter)
            .then_with(|| self.sequence.cmp(&other.sequence))
            .then_with(|| self.replica_id.cmp(&other.replica_id))
    }
}

impl fmt::Display for LamportTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}@{}", self.counter, self.sequence, self.replica_id)
    }
}
