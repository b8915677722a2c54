//! The RGA reducer: folds one message into a state.
//!
//! Reduction is a pure function of the message and the previous state. The
//! only side effect is the stream of [`ChangeEvent`]s handed to the sink.
//!
//! ```rust
//! use rga_reducer::{reduce, ChangeEvent, EventLog, Message, State, VertexId};
//!
//! let a = VertexId::new(1, 1);
//! let mut events = EventLog::new();
//! let state = reduce(&Message::insert(None, Some('a'), a), State::first(), &mut events);
//!
//! assert_eq!(state.to_string(), "a");
//! assert_eq!(events.0, vec![ChangeEvent::Insert { value: Some('a'), position: 0 }]);
//! ```

use std::sync::Arc;
use tracing::{debug, trace};

use crate::crdt::message::{ChangeEvent, ChangeSink, InsertOp, Message};
use crate::crdt::state::State;
use crate::crdt::types::VertexId;

/// Applies `message` to `previous` and returns the resulting state.
///
/// `previous` is taken by value; its collections are copied only if some
/// other clone still shares them, so states held elsewhere never change.
/// Events reach `sink` in order: the insert effect before the remove effect.
pub fn reduce<T, S>(message: &Message<T>, previous: State<T>, sink: &mut S) -> State<T>
where
    T: Clone,
    S: ChangeSink<T> + ?Sized,
{
    let mut state = previous;

    if let Some(op) = &message.insert {
        apply_insert(&mut state, op, sink);
    }
    if let Some(target) = message.remove {
        apply_remove(&mut state, target, sink);
    }

    state
}

/// Folds every message, oldest first, starting from [`State::first`].
pub fn fold<'a, T, S, I>(messages: I, sink: &mut S) -> State<T>
where
    T: Clone + 'a,
    S: ChangeSink<T> + ?Sized,
    I: IntoIterator<Item = &'a Message<T>>,
{
    messages
        .into_iter()
        .fold(State::first(), |state, message| {
            reduce(message, state, &mut *sink)
        })
}

fn apply_insert<T, S>(state: &mut State<T>, op: &InsertOp<T>, sink: &mut S)
where
    T: Clone,
    S: ChangeSink<T> + ?Sized,
{
    if !state.contains(op.after) {
        debug!(anchor = ?op.after, id = %op.id, "dropping insert with unknown anchor");
        return;
    }
    if state.added.contains_key(&op.id) {
        debug!(id = %op.id, "ignoring redelivered insert");
        return;
    }

    Arc::make_mut(&mut state.added).insert(op.id, op.value.clone());

    // Skip successors with larger ids: concurrent siblings sort descending.
    let mut left = op.after;
    let mut right = state.successor(left);
    while let Some(next) = right.filter(|next| state.added.contains_key(next) && *next > op.id) {
        left = Some(next);
        right = state.successor(left);
    }

    let edges = Arc::make_mut(&mut state.edges);
    edges.insert(left, op.id);
    match right {
        Some(right) => edges.insert(Some(op.id), right),
        None => edges.remove(&Some(op.id)),
    };

    trace!(id = %op.id, after = ?left, "spliced vertex");
    if let Some(position) = state.position_of(op.id) {
        sink.changed(ChangeEvent::Insert {
            value: op.value.clone(),
            position,
        });
    }
}

fn apply_remove<T, S>(state: &mut State<T>, target: VertexId, sink: &mut S)
where
    T: Clone,
    S: ChangeSink<T> + ?Sized,
{
    let position = state.position_of(target);
    sink.changed(ChangeEvent::Remove { position });
    if !state.removed.contains(&target) {
        Arc::make_mut(&mut state.removed).insert(target);
    }
    trace!(id = %target, ?position, "tombstoned vertex");
}
