//! Replica identifier.
//!
//! Every replica folding messages into its own state needs a distinct id so
//! that the vertex ids it mints never collide with another replica's.

/// Identifies one participant (replica) of a replicated sequence.
pub type ReplicaId = u64;
