//! Wire types exchanged between replicas and the change notifications the
//! reducer emits while folding them.

use serde::{Deserialize, Serialize};

use crate::crdt::types::{Anchor, VertexId};

/// Create vertex `id` holding `value`, immediately after `after`.
///
/// A `None` value is a placeholder vertex, created when a positional mutator
/// has to pad the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOp<T> {
    pub after: Anchor,
    pub value: Option<T>,
    pub id: VertexId,
}

/// One replicated operation message.
///
/// Either slot may be empty. When both are present the reducer applies the
/// insert first and the remove second.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert: Option<InsertOp<T>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove: Option<VertexId>,
}

impl<T> Message<T> {
    /// Insert-only message.
    pub fn insert(after: Anchor, value: Option<T>, id: VertexId) -> Self {
        Message {
            insert: Some(InsertOp { after, value, id }),
            remove: None,
        }
    }

    /// Remove-only message.
    pub fn remove(target: VertexId) -> Self {
        Message {
            insert: None,
            remove: Some(target),
        }
    }

    /// Insert `op`, then tombstone `target`, as a single message.
    pub fn replace(op: InsertOp<T>, target: VertexId) -> Self {
        Message {
            insert: Some(op),
            remove: Some(target),
        }
    }

    /// Every vertex id this message mentions.
    pub fn ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        let insert = self
            .insert
            .iter()
            .flat_map(|op| op.after.into_iter().chain(Some(op.id)));
        insert.chain(self.remove)
    }

    pub fn is_empty(&self) -> bool {
        self.insert.is_none() && self.remove.is_none()
    }
}

/// Externally observable effect of reducing one message.
///
/// Positions count every vertex in the chain, tombstones included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent<T> {
    Insert { value: Option<T>, position: usize },
    /// `position` is `None` when the target is not in the chain (yet).
    Remove { position: Option<usize> },
}

/// Receives change events synchronously, in emission order.
pub trait ChangeSink<T> {
    fn changed(&mut self, event: ChangeEvent<T>);
}

impl<T, F> ChangeSink<T> for F
where
    F: FnMut(ChangeEvent<T>),
{
    fn changed(&mut self, event: ChangeEvent<T>) {
        self(event)
    }
}

/// A sink that drops every event.
pub struct NoopSink;

impl<T> ChangeSink<T> for NoopSink {
    fn changed(&mut self, _event: ChangeEvent<T>) {}
}

/// A sink that records events, mostly useful in tests and for relaying
/// events after a reduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLog<T>(pub Vec<ChangeEvent<T>>);

impl<T> Default for EventLog<T> {
    fn default() -> Self {
        EventLog(Vec::new())
    }
}

impl<T> EventLog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> Vec<ChangeEvent<T>> {
        self.0
    }
}

impl<T> ChangeSink<T> for EventLog<T> {
    fn changed(&mut self, event: ChangeEvent<T>) {
        self.0.push(event);
    }
}
