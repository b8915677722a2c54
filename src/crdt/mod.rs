//! The RGA (Replicated Growable Array) state-reduction engine.
//!
//! State model, reducer, materializer, position resolver and mutators, plus
//! the identifier source and the [`Replica`] wrapper that owns a current
//! state.

pub mod error;
pub mod message;
pub mod mutators;
pub mod reducer;
pub mod replica;
pub mod state;
pub mod types;

pub use error::RgaError;
pub use message::{ChangeEvent, ChangeSink, EventLog, InsertOp, Message, NoopSink};
pub use mutators::Messages;
pub use reducer::{fold, reduce};
pub use replica::{Applied, Replica};
pub use state::{Chain, State};
pub use types::{
    Anchor, IdSource, LamportClock, LamportTimestamp, MAX_COUNTER, ReplicaId, VertexId,
};
