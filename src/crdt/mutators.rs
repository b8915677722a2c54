//! Mutators: translate local intent into messages.
//!
//! Mutators only read the state they are given. Every message they return
//! must be fed through [`reduce`](crate::reduce), locally and on every other
//! replica, in the order returned.

use std::collections::VecDeque;

use crate::crdt::error::RgaError;
use crate::crdt::message::{InsertOp, Message};
use crate::crdt::state::State;
use crate::crdt::types::{Anchor, IdSource, VertexId};

/// Ordered multi-message output of [`set`] and [`insert_at`].
///
/// Consumed once, front to back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Messages<T>(VecDeque<Message<T>>);

impl<T> Messages<T> {
    /// Messages not yet consumed
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message<T>> {
        self.0.iter()
    }
}

impl<T> Iterator for Messages<T> {
    type Item = Message<T>;

    fn next(&mut self) -> Option<Message<T>> {
        self.0.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.0.len(), Some(self.0.len()))
    }
}

impl<T> ExactSizeIterator for Messages<T> {}

impl<T> From<Vec<Message<T>>> for Messages<T> {
    fn from(messages: Vec<Message<T>>) -> Self {
        Messages(messages.into())
    }
}

/// Insert `value` right after `before`, which must exist and be live. The
/// head (`None`) always qualifies.
pub fn add_right<T>(
    state: &State<T>,
    before: Anchor,
    value: T,
    ids: &impl IdSource,
) -> Option<Message<T>> {
    state
        .is_live(before)
        .then(|| Message::insert(before, Some(value), ids.next_id()))
}

/// Append `value` after the last vertex of the chain.
pub fn push<T>(state: &State<T>, value: T, ids: &impl IdSource) -> Message<T> {
    Message::insert(state.tail(), Some(value), ids.next_id())
}

/// Tombstone `vertex` if it exists and is still live.
pub fn remove<T>(state: &State<T>, vertex: VertexId) -> Option<Message<T>> {
    state.is_live(Some(vertex)).then(|| Message::remove(vertex))
}

/// Tombstone the `position`-th live vertex.
pub fn remove_at<T>(state: &State<T>, position: usize) -> Result<Message<T>, RgaError> {
    state
        .iter()
        .nth(position)
        .map(|(id, _)| Message::remove(id))
        .ok_or_else(|| RgaError::OutOfRange {
            position,
            len: state.live_len(),
        })
}

/// Overwrite the `position`-th live vertex with `value`.
///
/// An existing vertex is replaced by one message that inserts `value` right
/// after it and tombstones it. Past the end, the chain is padded with
/// placeholder vertices up to `position` first.
pub fn set<T>(state: &State<T>, position: usize, value: T, ids: &impl IdSource) -> Messages<T> {
    if let Some((target, _)) = state.iter().nth(position) {
        let op = InsertOp {
            after: Some(target),
            value: Some(value),
            id: ids.next_id(),
        };
        return vec![Message::replace(op, target)].into();
    }

    let (anchor, mut messages) = reach(state, position, ids);
    messages.push(Message::insert(anchor, Some(value), ids.next_id()));
    messages.into()
}

/// Insert `value` so that it becomes the `position`-th live vertex, padding
/// with placeholders when `position` lies past the end.
pub fn insert_at<T>(
    state: &State<T>,
    position: usize,
    value: T,
    ids: &impl IdSource,
) -> Option<Messages<T>> {
    let (anchor, mut messages) = reach(state, position, ids);
    if messages.is_empty() {
        return add_right(state, anchor, value, ids).map(|message| vec![message].into());
    }
    messages.push(Message::insert(anchor, Some(value), ids.next_id()));
    Some(messages.into())
}

/// Anchor after which exactly `count` live vertices precede, plus the
/// placeholder inserts needed when the live sequence is shorter than that.
fn reach<T>(state: &State<T>, count: usize, ids: &impl IdSource) -> (Anchor, Vec<Message<T>>) {
    if count == 0 {
        return (None, Vec::new());
    }
    if let Some((id, _)) = state.iter().nth(count - 1) {
        return (Some(id), Vec::new());
    }

    let mut anchor = state.tail();
    let missing = count - state.live_len();
    let mut padding = Vec::with_capacity(missing + 1);
    for _ in 0..missing {
        let id = ids.next_id();
        padding.push(Message::insert(anchor, None, id));
        anchor = Some(id);
    }
    (anchor, padding)
}
