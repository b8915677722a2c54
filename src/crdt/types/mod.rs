//! Identifier source for the RGA: replica ids, Lamport timestamps, vertex ids
//! and the clock that mints them.

pub mod clock;
pub mod replica;
pub mod timestamp;
pub mod vertex_id;

pub use clock::{LamportClock, MAX_COUNTER};
pub use replica::ReplicaId;
pub use timestamp::LamportTimestamp;
pub use vertex_id::{Anchor, IdSource, VertexId};
