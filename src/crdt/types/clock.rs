//! Thread-safe Lamport clock, the replica's identifier source.
//!
//! Ids minted by the clock only ever grow, and observing remote ids pulls the
//! counter forward, so an insert made after seeing a vertex always carries a
//! larger id than that vertex.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::crdt::error::RgaError;
use crate::crdt::types::replica::ReplicaId;
use crate::crdt::types::timestamp::LamportTimestamp;
use crate::crdt::types::vertex_id::{IdSource, VertexId};

/// Largest counter accepted from another replica. The space above it is left
/// to local ticks, so a clock that has seen any admissible id can still mint a
/// larger one.
pub const MAX_COUNTER: u64 = u64::MAX / 2;

/// A thread-safe clock for generating Lamport timestamps
#[derive(Debug)]
pub struct LamportClock {
    counter: AtomicU64,
    replica_id: ReplicaId,
    sequence: AtomicU64,
}

impl LamportClock {
    /// Creates a clock for `replica_id` starting at counter 0
    pub fn new(replica_id: ReplicaId) -> Self {
        LamportClock {
            counter: AtomicU64::new(0),
            replica_id,
            sequence: AtomicU64::new(0),
        }
    }

    /// Generates the next timestamp for this replica
    pub fn tick(&self) -> LamportTimestamp {
        let counter = match self.counter.fetch_update(
            AtomicOrdering::SeqCst,
            AtomicOrdering::SeqCst,
            |counter| counter.checked_add(1),
        ) {
            Ok(previous) => previous + 1,
            // Saturated; the sequence still orders and separates local ids
            Err(_) => u64::MAX,
        };
        let sequence = self.sequence.fetch_add(1, AtomicOrdering::SeqCst);

        LamportTimestamp {
            counter,
            replica_id: self.replica_id,
            sequence: sequence as u32,
        }
    }

    /// Advances the counter to at least `received.counter`. Never moves it back.
    ///
    /// Counters above [`MAX_COUNTER`] are refused and leave the clock as is.
    pub fn update(&self, received: LamportTimestamp) -> Result<(), RgaError> {
        if received.counter > MAX_COUNTER {
            return Err(RgaError::CounterOutOfRange {
                counter: received.counter,
            });
        }
        self.counter
            .fetch_max(received.counter, AtomicOrdering::SeqCst);
        Ok(())
    }

    /// Shorthand for [`update`](Self::update) with a vertex id seen in a message.
    pub fn observe(&self, id: VertexId) -> Result<(), RgaError> {
        self.update(id.timestamp())
    }

    /// Current counter value
    pub fn current_counter(&self) -> u64 {
        self.counter.load(AtomicOrdering::SeqCst)
    }

    /// Replica this clock mints ids for
    pub fn replica_id(&self) -> ReplicaId {
        self.replica_id
    }
}

impl IdSource for LamportClock {
    fn next_id(&self) -> VertexId {
        VertexId::from(self.tick())
    }
}
