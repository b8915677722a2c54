//! WebSocket session management for the relay.
//!
//! Each session receives the hosted document and its log on connect, then
//! every update the hub publishes. Clients edit either positionally
//! (`insert`, `push`, `delete`, `set`) against the hosted replica or by
//! forwarding raw messages from their own replica (`apply`).

use axum::extract::ws::{Message as WsMessage, WebSocket};
use chrono::Utc;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::crdt::{Message, ReplicaId};
use crate::server::hub::{HubError, LogEntry, Update};
use crate::server::routes::AppState;

type SessionResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Requests accepted from clients
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientOp {
    Insert { position: usize, character: char },
    Push { character: char },
    Delete { position: usize },
    Set { position: usize, character: char },
    Apply { message: Message<char> },
    GetContent,
}

/// Frames sent to clients
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Init {
        replica_id: ReplicaId,
        content: String,
        log: Vec<LogEntry>,
    },
    Update(Update),
    Content {
        content: String,
    },
    Error {
        message: String,
    },
}

pub struct WebSocketSession {
    socket: WebSocket,
    state: AppState,
    session_id: String,
}

impl WebSocketSession {
    pub fn new(socket: WebSocket, state: AppState, session_id: String) -> Self {
        Self {
            socket,
            state,
            session_id,
        }
    }

    /// Handle the WebSocket connection lifecycle
    pub async fn handle(self) {
        let WebSocketSession {
            socket,
            state,
            session_id,
        } = self;
        info!("WebSocket session {} established", session_id);

        let (mut sender, mut receiver) = socket.split();

        // Subscribe before the snapshot so no update falls in between
        let mut updates = state.subscribe();
        let init = ServerMessage::Init {
            replica_id: state.replica().replica_id(),
            content: state.content(),
            log: state.log(),
        };
        if let Err(e) = send_frame(&mut sender, &init).await {
            error!("Failed to send initial state to {}: {}", session_id, e);
            return;
        }

        let (replies, mut pending) = mpsc::unbounded_channel::<ServerMessage>();
        let writer_id = session_id.clone();
        let mut writer = tokio::spawn(async move {
            loop {
                let frame = tokio::select! {
                    update = updates.recv() => match update {
                        Ok(update) => ServerMessage::Update(update),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("Session {} lagged, {} updates dropped", writer_id, skipped);
                            continue;
                        }
                        Err(RecvError::Closed) => break,
                    },
                    reply = pending.recv() => match reply {
                        Some(reply) => reply,
                        None => break,
                    },
                };
                if let Err(e) = send_frame(&mut sender, &frame).await {
                    warn!("Failed to write to {}: {}", writer_id, e);
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                _ = &mut writer => break,
                msg = receiver.next() => match msg {
                    Some(Ok(WsMessage::Text(text))) => {
                        if let Some(reply) = handle_text(&state, &session_id, &text) {
                            if replies.send(reply).is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => {
                        info!("WebSocket session {} closed by client", session_id);
                        break;
                    }
                    Some(Ok(_)) => {
                        // Ping/pong are answered by the websocket layer
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", session_id, e);
                        break;
                    }
                },
            }
        }

        writer.abort();
        info!("WebSocket session {} ended", session_id);
    }
}

/// Processes one text frame. Returns a reply for this session only; accepted
/// edits reach every session through the hub's broadcast instead.
fn handle_text(state: &AppState, session_id: &str, text: &str) -> Option<ServerMessage> {
    let operation = match serde_json::from_str::<ClientOp>(text) {
        Ok(operation) => operation,
        Err(e) => {
            warn!("Failed to parse operation from {}: {}", session_id, e);
            return Some(ServerMessage::Error {
                message: format!("invalid operation: {e}"),
            });
        }
    };

    let result = match operation {
        ClientOp::Insert {
            position,
            character,
        } => state.local(|replica| {
            replica
                .insert_at(position, character)
                .ok_or(HubError::Rejected)
        }),
        ClientOp::Push { character } => state.local(|replica| Ok(replica.push(character))),
        ClientOp::Delete { position } => state.local(|replica| Ok(replica.remove_at(position)?)),
        ClientOp::Set {
            position,
            character,
        } => state.local(|replica| Ok(replica.set(position, character))),
        ClientOp::Apply { message } => state.apply_remote(message),
        ClientOp::GetContent => {
            return Some(ServerMessage::Content {
                content: state.content(),
            });
        }
    };

    match result {
        Ok(update) => {
            info!("Session {} committed up to seq {}", session_id, update.seq);
            None
        }
        Err(e) => {
            warn!("Session {} edit rejected: {}", session_id, e);
            Some(ServerMessage::Error {
                message: e.to_string(),
            })
        }
    }
}

async fn send_frame(
    sender: &mut SplitSink<WebSocket, WsMessage>,
    frame: &ServerMessage,
) -> SessionResult {
    let json = serde_json::to_string(frame)?;
    sender.send(WsMessage::Text(json)).await?;
    Ok(())
}

/// Generate a unique session ID
pub fn generate_session_id() -> String {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    let n = NEXT.fetch_add(1, Ordering::Relaxed);
    format!("session_{}_{}", Utc::now().timestamp_millis(), n)
}

/// Create and handle a new WebSocket session
pub async fn handle_websocket_connection(socket: WebSocket, state: AppState) {
    let session_id = generate_session_id();
    let session = WebSocketSession::new(socket, state, session_id);
    session.handle().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::hub::Hub;
    use std::sync::Arc;

    #[test]
    fn test_client_op_wire_format() {
        let op: ClientOp =
            serde_json::from_str(r#"{"type":"insert","position":2,"character":"x"}"#).unwrap();
        assert_eq!(
            op,
            ClientOp::Insert {
                position: 2,
                character: 'x'
            }
        );
        let op: ClientOp = serde_json::from_str(r#"{"type":"get_content"}"#).unwrap();
        assert_eq!(op, ClientOp::GetContent);
    }

    #[test]
    fn test_handle_text_replies() {
        let state: AppState = Arc::new(Hub::new(1, 16));

        assert_eq!(
            handle_text(&state, "s", r#"{"type":"push","character":"a"}"#),
            None
        );
        assert_eq!(
            handle_text(&state, "s", r#"{"type":"get_content"}"#),
            Some(ServerMessage::Content {
                content: "a".to_string()
            })
        );
        assert!(matches!(
            handle_text(&state, "s", r#"{"type":"delete","position":5}"#),
            Some(ServerMessage::Error { .. })
        ));
        assert!(matches!(
            handle_text(&state, "s", "not json"),
            Some(ServerMessage::Error { .. })
        ));
    }

    #[test]
    fn test_session_ids_differ() {
        assert_ne!(generate_session_id(), generate_session_id());
    }
}
