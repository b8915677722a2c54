//! RGA state: added vertices, removed vertices and the edge chain.
//!
//! Also hosts the two read-only views of a state: the materializer
//! ([`State::value_of`]) and the position resolver ([`State::position_of`]).

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::crdt::types::{Anchor, VertexId};

/// The three-set RGA state.
///
/// * `added` maps every vertex ever created to its value (`None` for
///   placeholders). Append-only. The head sentinel is implicitly present.
/// * `removed` holds tombstoned ids, possibly ahead of their insert.
/// * `edges` maps a predecessor (or the head) to its successor, forming one
///   acyclic chain starting at the head.
///
/// The collections are shared behind [`Arc`] and copied on write, so cloning
/// a state is O(1) and a clone is never affected by reductions of another.
#[derive(Debug)]
pub struct State<T> {
    pub(crate) added: Arc<HashMap<VertexId, Option<T>>>,
    pub(crate) removed: Arc<HashSet<VertexId>>,
    pub(crate) edges: Arc<HashMap<Anchor, VertexId>>,
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        State {
            added: Arc::clone(&self.added),
            removed: Arc::clone(&self.removed),
            edges: Arc::clone(&self.edges),
        }
    }
}

impl<T> Default for State<T> {
    fn default() -> Self {
        Self::first()
    }
}

impl<T> State<T> {
    /// The empty seed state every replica folds from.
    pub fn first() -> Self {
        State {
            added: Arc::new(HashMap::new()),
            removed: Arc::new(HashSet::new()),
            edges: Arc::new(HashMap::new()),
        }
    }

    /// Whether `anchor` names a created vertex. The head always counts.
    pub fn contains(&self, anchor: Anchor) -> bool {
        match anchor {
            None => true,
            Some(id) => self.added.contains_key(&id),
        }
    }

    /// Whether `anchor` is tombstoned. The head never is.
    pub fn is_removed(&self, anchor: Anchor) -> bool {
        anchor.is_some_and(|id| self.removed.contains(&id))
    }

    /// A vertex that exists and is not tombstoned.
    pub fn is_live(&self, anchor: Anchor) -> bool {
        self.contains(anchor) && !self.is_removed(anchor)
    }

    /// Vertex directly after `anchor` in the chain, if any.
    pub fn successor(&self, anchor: Anchor) -> Option<VertexId> {
        self.edges.get(&anchor).copied()
    }

    /// Value stored for `id`; `Some(None)` is a placeholder.
    pub fn get(&self, id: VertexId) -> Option<Option<&T>> {
        self.added.get(&id).map(Option::as_ref)
    }

    /// Walks the chain from the head, tombstones included.
    pub fn chain(&self) -> Chain<'_, T> {
        Chain {
            state: self,
            cursor: None,
        }
    }

    /// Walks the live vertices in chain order with their values.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, Option<&T>)> + '_ {
        self.chain()
            .filter(|id| !self.removed.contains(id))
            .map(|id| (id, self.added.get(&id).and_then(Option::as_ref)))
    }

    /// Last vertex of the chain, or the head when the chain is empty.
    pub fn tail(&self) -> Anchor {
        self.chain().last()
    }

    /// Number of live vertices.
    pub fn live_len(&self) -> usize {
        self.iter().count()
    }

    /// Number of vertices in the chain, tombstones included.
    pub fn total_len(&self) -> usize {
        self.chain().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// 0-based index of `id` in the chain, counting tombstoned vertices, or
    /// `None` if the chain does not contain it.
    pub fn position_of(&self, id: VertexId) -> Option<usize> {
        self.chain().position(|it| it == id)
    }
}

impl<T: Clone> State<T> {
    /// Materializes the live sequence. Placeholders appear as `None`.
    pub fn value_of(&self) -> Vec<Option<T>> {
        self.iter().map(|(_, value)| value.cloned()).collect()
    }
}

impl fmt::Display for State<char> {
    /// Renders text, skipping placeholder vertices.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.iter()
            .filter_map(|(_, value)| value)
            .try_for_each(|ch| fmt::Write::write_char(f, *ch))
    }
}

impl<T: PartialEq> PartialEq for State<T> {
    fn eq(&self, other: &Self) -> bool {
        self.added == other.added && self.removed == other.removed && self.edges == other.edges
    }
}

impl<T: Eq> Eq for State<T> {}

/// Iterator over every vertex id of the chain, in order.
pub struct Chain<'a, T> {
    state: &'a State<T>,
    cursor: Anchor,
}

impl<T> Iterator for Chain<'_, T> {
    type Item = VertexId;

    fn next(&mut self) -> Option<VertexId> {
        let next = self.state.successor(self.cursor)?;
        self.cursor = Some(next);
        Some(next)
    }
}
