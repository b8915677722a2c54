//! The relay hub: one hosted replica, the ordered message log and the
//! broadcast channel every websocket session listens on.

use chrono::{DateTime, Utc};
use crossbeam_skiplist::SkipMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::crdt::{
    Applied, ChangeEvent, EventLog, Message, Replica, ReplicaId, RgaError, VertexId,
};

/// One accepted message, in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub seq: u64,
    pub received_at: DateTime<Utc>,
    pub message: Message<char>,
}

/// Broadcast after every accepted edit or remote message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    /// Sequence number of the last message in `messages`
    pub seq: u64,
    pub messages: Vec<Message<char>>,
    pub events: Vec<ChangeEvent<char>>,
    pub content: String,
}

#[derive(Debug, Error)]
pub enum HubError {
    #[error(transparent)]
    Rga(#[from] RgaError),
    #[error("anchor is missing or removed")]
    Rejected,
    #[error("message carries no operation")]
    EmptyMessage,
    #[error("anchor {0} is not known here yet; resend after it")]
    UnknownAnchor(VertexId),
}

/// The relay's shared state. Every accepted message is reduced into the
/// hosted replica, logged and broadcast, in that order.
pub struct Hub {
    replica: Replica<char>,
    log: SkipMap<u64, LogEntry>,
    next_seq: AtomicU64,
    // Keeps log order equal to reduction order
    commit: Mutex<()>,
    updates: broadcast::Sender<Update>,
}

impl Hub {
    /// Creates a hub hosting an empty replica; `channel_capacity` bounds how
    /// far a session may lag behind the broadcast.
    pub fn new(replica_id: ReplicaId, channel_capacity: usize) -> Self {
        let (updates, _) = broadcast::channel(channel_capacity.max(1));
        Hub {
            replica: Replica::new(replica_id),
            log: SkipMap::new(),
            next_seq: AtomicU64::new(1),
            commit: Mutex::new(()),
            updates,
        }
    }

    /// The hosted replica
    pub fn replica(&self) -> &Replica<char> {
        &self.replica
    }

    pub fn content(&self) -> String {
        self.replica.text()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Update> {
        self.updates.subscribe()
    }

    /// Snapshot of the log, oldest first.
    pub fn log(&self) -> Vec<LogEntry> {
        self.log.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn log_len(&self) -> usize {
        self.log.len()
    }

    /// Runs a local edit against the hosted replica and publishes it.
    pub fn local<F>(&self, edit: F) -> Result<Update, HubError>
    where
        F: FnOnce(&Replica<char>) -> Result<Applied<char>, HubError>,
    {
        let _guard = self.commit.lock();
        let applied = edit(&self.replica)?;
        Ok(self.publish(applied))
    }

    /// Reduces a message produced by another replica and publishes it.
    ///
    /// Inserts whose anchor the hosted replica has not seen are refused
    /// instead of being dropped by the reducer, so the sender can resend
    /// once the anchor has arrived.
    pub fn apply_remote(&self, message: Message<char>) -> Result<Update, HubError> {
        if message.is_empty() {
            return Err(HubError::EmptyMessage);
        }
        let _guard = self.commit.lock();
        if let Some(after) = message.insert.as_ref().and_then(|op| op.after) {
            if !self.replica.state().contains(Some(after)) {
                return Err(HubError::UnknownAnchor(after));
            }
        }
        let mut events = EventLog::new();
        self.replica.apply(&message, &mut events)?;
        Ok(self.publish(Applied {
            messages: vec![message],
            events: events.into_inner(),
        }))
    }

    fn publish(&self, applied: Applied<char>) -> Update {
        let received_at = Utc::now();
        let mut seq = 0;
        for message in &applied.messages {
            seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
            self.log.insert(
                seq,
                LogEntry {
                    seq,
                    received_at,
                    message: message.clone(),
                },
            );
        }

        let update = Update {
            seq,
            messages: applied.messages,
            events: applied.events,
            content: self.replica.text(),
        };
        debug!(seq, events = update.events.len(), "publishing update");
        if self.updates.send(update.clone()).is_err() {
            trace!(seq, "no session is listening");
        }
        update
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_edits_are_logged_in_order() {
        let hub = Hub::new(1, 16);
        for ch in "hi".chars() {
            hub.local(|replica| Ok(replica.push(ch))).unwrap();
        }
        let update = hub
            .local(|replica| replica.insert_at(0, '>').ok_or(HubError::Rejected))
            .unwrap();

        assert_eq!(update.seq, 3);
        assert_eq!(update.content, ">hi");
        let seqs: Vec<u64> = hub.log().iter().map(|entry| entry.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[test]
    fn test_failed_edit_is_not_logged() {
        let hub = Hub::new(1, 16);
        let result = hub.local(|replica| Ok(replica.remove_at(0)?));

        assert!(matches!(
            result,
            Err(HubError::Rga(RgaError::OutOfRange { position: 0, len: 0 }))
        ));
        assert_eq!(hub.log_len(), 0);
    }

    #[test]
    fn test_replaying_the_log_converges() {
        let hub = Hub::new(1, 16);
        for ch in "abc".chars() {
            hub.local(|replica| Ok(replica.push(ch))).unwrap();
        }
        hub.local(|replica| Ok(replica.set(1, 'B'))).unwrap();

        let follower = Hub::new(2, 16);
        for entry in hub.log() {
            follower.apply_remote(entry.message).unwrap();
        }
        assert_eq!(follower.content(), "aBc");
        assert_eq!(follower.log_len(), hub.log_len());
    }

    #[test]
    fn test_empty_remote_message_is_rejected() {
        let hub = Hub::new(1, 16);
        let empty = Message {
            insert: None,
            remove: None,
        };
        assert!(matches!(hub.apply_remote(empty), Err(HubError::EmptyMessage)));
    }

    #[tokio::test]
    async fn test_subscribers_receive_updates() {
        let hub = Hub::new(1, 16);
        let mut updates = hub.subscribe();
        hub.local(|replica| Ok(replica.push('x'))).unwrap();

        let update = updates.recv().await.unwrap();
        assert_eq!(update.content, "x");
        assert_eq!(update.events.len(), 1);
    }

    #[test]
    fn test_insert_with_unknown_anchor_is_refused() {
        let hub = Hub::new(1, 16);
        let anchor = VertexId::new(7, 2);
        let orphan = Message::insert(Some(anchor), Some('z'), VertexId::new(8, 2));

        assert!(matches!(
            hub.apply_remote(orphan.clone()),
            Err(HubError::UnknownAnchor(id)) if id == anchor
        ));
        assert_eq!(hub.log_len(), 0);

        // Resending after the anchor arrives succeeds
        hub.apply_remote(Message::insert(None, Some('a'), anchor))
            .unwrap();
        let update = hub.apply_remote(orphan).unwrap();
        assert_eq!(update.content, "az");
        assert_eq!(update.events.len(), 1);
        assert_eq!(hub.log_len(), 2);
    }

    #[test]
    fn test_exhausting_counter_is_refused() {
        let hub = Hub::new(1, 16);
        let hostile = Message::insert(None, Some('r'), VertexId::new(u64::MAX, 9));

        assert!(matches!(
            hub.apply_remote(hostile),
            Err(HubError::Rga(RgaError::CounterOutOfRange { .. }))
        ));
        assert_eq!(hub.log_len(), 0);

        let update = hub
            .local(|replica| replica.insert_at(0, 'l').ok_or(HubError::Rejected))
            .unwrap();
        assert_eq!(update.content, "l");
    }
}
