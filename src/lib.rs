//! # RGA reducer - Replicated Growable Array
//!
//! A Conflict-free Replicated Data Type (CRDT) for ordered sequences, such as
//! collaboratively edited text. Replicas edit independently and exchange
//! [`Message`]s; folding the same messages through [`reduce`] converges to the
//! same sequence on every replica, whatever the delivery order, as long as an
//! insert is delivered after the insert of its anchor.
//!
//! ## Pieces
//!
//! - [`State`]: added vertices, tombstones and the edge chain. Immutable from
//!   the caller's point of view; clones are O(1) and copy on write.
//! - [`reduce`]: folds one message into a state and reports [`ChangeEvent`]s
//!   to a [`ChangeSink`].
//! - [`State::value_of`] and [`State::position_of`]: materializer and position
//!   resolver.
//! - [`mutators`]: turn "insert at 3" or "remove vertex x" into messages
//!   without touching state.
//! - [`Replica`]: owns a current state and a [`LamportClock`] for local use.
//!
//! ## Example
//!
//! ```rust
//! use rga_reducer::{mutators, reduce, LamportClock, NoopSink, State};
//!
//! let clock = LamportClock::new(1);
//! let mut state = State::first();
//! for ch in "hello".chars() {
//!     let message = mutators::push(&state, ch, &clock);
//!     state = reduce(&message, state, &mut NoopSink);
//! }
//! for message in mutators::insert_at(&state, 0, '>', &clock).unwrap() {
//!     state = reduce(&message, state, &mut NoopSink);
//! }
//! assert_eq!(state.to_string(), ">hello");
//! ```

pub mod config;
pub mod crdt;
pub mod server;

pub use crdt::mutators;
pub use crdt::{
    Anchor, Applied, ChangeEvent, ChangeSink, EventLog, IdSource, InsertOp, LamportClock,
    LamportTimestamp, MAX_COUNTER, Message, Messages, NoopSink, Replica, ReplicaId, RgaError, State,
    VertexId, fold, reduce,
};
