//! A replica: the current state of one participant plus its id source.
//!
//! The core functions are pure; `Replica` is the caller-side owner of the
//! "current state" variable. Each remote reduction or local edit holds the
//! state lock from start to finish, and the Lamport clock stays ahead of
//! every id the replica has seen.

use parking_lot::RwLock;
use std::convert::Infallible;
use tracing::{debug, info};

use crate::crdt::error::RgaError;
use crate::crdt::message::{ChangeEvent, ChangeSink, EventLog, Message};
use crate::crdt::mutators;
use crate::crdt::reducer::reduce;
use crate::crdt::state::State;
use crate::crdt::types::{Anchor, LamportClock, MAX_COUNTER, ReplicaId, VertexId};

/// Messages produced by a local edit together with the events their local
/// reduction emitted. The messages still have to reach the other replicas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied<T> {
    pub messages: Vec<Message<T>>,
    pub events: Vec<ChangeEvent<T>>,
}

impl<T> Default for Applied<T> {
    fn default() -> Self {
        Applied {
            messages: Vec::new(),
            events: Vec::new(),
        }
    }
}

/// One participant's current state and clock.
///
/// Reductions and local edits take the state's write lock for their whole
/// duration, so a mutator always runs against the state its messages are
/// folded into.
pub struct Replica<T> {
    clock: LamportClock,
    state: RwLock<State<T>>,
}

impl<T: Clone> Replica<T> {
    /// Creates an empty replica minting ids for `replica_id`
    pub fn new(replica_id: ReplicaId) -> Self {
        info!(replica_id, "creating replica");
        Replica {
            clock: LamportClock::new(replica_id),
            state: RwLock::new(State::first()),
        }
    }

    /// Gets the replica ID
    pub fn replica_id(&self) -> ReplicaId {
        self.clock.replica_id()
    }

    pub fn current_clock(&self) -> u64 {
        self.clock.current_counter()
    }

    /// A snapshot of the current state. Cheap; later edits do not affect it.
    pub fn state(&self) -> State<T> {
        self.state.read().clone()
    }

    pub fn value_of(&self) -> Vec<Option<T>> {
        self.state.read().value_of()
    }

    /// Reduces a message from another replica into the current state.
    ///
    /// A message naming an id whose counter exceeds [`MAX_COUNTER`] is
    /// refused before anything changes.
    pub fn apply<S>(&self, message: &Message<T>, sink: &mut S) -> Result<(), RgaError>
    where
        S: ChangeSink<T> + ?Sized,
    {
        if let Some(id) = message.ids().find(|id| id.counter() > MAX_COUNTER) {
            return Err(RgaError::CounterOutOfRange {
                counter: id.counter(),
            });
        }
        for id in message.ids() {
            self.clock.observe(id)?;
        }
        let mut state = self.state.write();
        let previous = std::mem::take(&mut *state);
        *state = reduce(message, previous, sink);
        Ok(())
    }

    /// Runs a mutator and folds its messages in under one write lock.
    fn edit<M, I, E>(&self, mutate: M) -> Result<Applied<T>, E>
    where
        M: FnOnce(&State<T>, &LamportClock) -> Result<I, E>,
        I: IntoIterator<Item = Message<T>>,
    {
        let mut state = self.state.write();
        let messages: Vec<Message<T>> = mutate(&*state, &self.clock)?.into_iter().collect();

        let mut events = EventLog::new();
        for message in &messages {
            let previous = std::mem::take(&mut *state);
            *state = reduce(message, previous, &mut events);
        }
        debug!(
            replica_id = self.replica_id(),
            messages = messages.len(),
            "applied local edit"
        );
        Ok(Applied {
            messages,
            events: events.into_inner(),
        })
    }

    pub fn add_right(&self, before: Anchor, value: T) -> Option<Applied<T>> {
        self.edit(|state, ids| mutators::add_right(state, before, value, ids).map(|message| [message]).ok_or(()))
            .ok()
    }

    pub fn push(&self, value: T) -> Applied<T> {
        let Ok(applied) = self.edit(|state, ids| {
            Ok::<_, Infallible>([mutators::push(state, value, ids)])
        });
        applied
    }

    pub fn remove(&self, vertex: VertexId) -> Option<Applied<T>> {
        self.edit(|state, _| mutators::remove(state, vertex).map(|message| [message]).ok_or(()))
            .ok()
    }

    pub fn remove_at(&self, position: usize) -> Result<Applied<T>, RgaError> {
        self.edit(|state, _| mutators::remove_at(state, position).map(|message| [message]))
    }

    pub fn set(&self, position: usize, value: T) -> Applied<T> {
        let Ok(applied) = self.edit(|state, ids| {
            Ok::<_, Infallible>(mutators::set(state, position, value, ids))
        });
        applied
    }

    pub fn insert_at(&self, position: usize, value: T) -> Option<Applied<T>> {
        self.edit(|state, ids| mutators::insert_at(state, position, value, ids).ok_or(()))
            .ok()
    }
}

impl Replica<char> {
    pub fn text(&self) -> String {
        self.state.read().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crdt::message::NoopSink;

    fn deliver(to: &Replica<char>, messages: &[Message<char>]) {
        for message in messages {
            to.apply(message, &mut NoopSink).unwrap();
        }
    }

    #[test]
    fn test_replica_creation() {
        let replica: Replica<char> = Replica::new(1);
        assert_eq!(replica.replica_id(), 1);
        assert_eq!(replica.current_clock(), 0);
        assert_eq!(replica.text(), "");
    }

    #[test]
    fn test_local_edits_report_events() {
        let replica = Replica::new(1);
        let applied = replica.push('a');
        assert_eq!(applied.messages.len(), 1);
        assert_eq!(
            applied.events,
            vec![ChangeEvent::Insert {
                value: Some('a'),
                position: 0
            }]
        );

        let applied = replica.remove_at(0).unwrap();
        assert_eq!(applied.events, vec![ChangeEvent::Remove { position: Some(0) }]);
        assert!(replica.remove_at(0).is_err());
    }

    #[test]
    fn test_clock_follows_remote_ids() {
        let alice = Replica::new(1);
        let bob = Replica::new(2);
        let mut log = Vec::new();
        for ch in "abc".chars() {
            log.extend(alice.push(ch).messages);
        }

        deliver(&bob, &log);
        assert_eq!(bob.current_clock(), 3);

        // Bob's head insert is newer than everything he has seen
        let edit = bob.insert_at(0, 'X').unwrap();
        deliver(&alice, &edit.messages);
        assert_eq!(alice.text(), "Xabc");
        assert_eq!(bob.text(), "Xabc");
    }

    #[test]
    fn test_snapshots_are_stable() {
        let replica = Replica::new(1);
        replica.push('a');
        let snapshot = replica.state();
        replica.push('b');

        assert_eq!(snapshot.to_string(), "a");
        assert_eq!(replica.text(), "ab");
    }

    #[test]
    fn test_add_right_and_remove_by_id() {
        let replica = Replica::new(1);
        let first = replica.push('a').messages[0].insert.clone().unwrap().id;
        replica.add_right(Some(first), 'b').unwrap();
        assert_eq!(replica.text(), "ab");

        replica.remove(first).unwrap();
        assert!(replica.remove(first).is_none());
        assert!(replica.add_right(Some(first), 'c').is_none());
        assert_eq!(replica.value_of(), vec![Some('b')]);
    }

    #[test]
    fn test_set_through_replica() {
        let replica = Replica::new(1);
        replica.set(1, 'b');
        replica.set(0, 'a');
        assert_eq!(replica.text(), "ab");
    }

    #[test]
    fn test_exhausting_counter_is_refused() {
        let replica = Replica::new(1);
        let hostile = Message::insert(None, Some('r'), VertexId::new(u64::MAX, 9));

        let err = replica.apply(&hostile, &mut NoopSink).unwrap_err();
        assert_eq!(err, RgaError::CounterOutOfRange { counter: u64::MAX });
        assert_eq!(replica.text(), "");
        assert_eq!(replica.current_clock(), 0);

        // The largest admitted counter still leaves room for newer local ids
        let edge = Message::insert(None, Some('r'), VertexId::new(MAX_COUNTER, 9));
        replica.apply(&edge, &mut NoopSink).unwrap();
        replica.insert_at(0, 'l').unwrap();
        assert_eq!(replica.text(), "lr");
    }

    #[test]
    fn test_concurrent_edits_are_serialized() {
        let replica = Replica::new(1);
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        replica.insert_at(0, 'x').unwrap();
                    }
                });
            }
        });

        let state = replica.state();
        assert_eq!(state.live_len(), 200);
        assert_eq!(state.total_len(), 200);
        assert_eq!(replica.current_clock(), 200);
    }
}
