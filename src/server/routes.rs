//! HTTP routes of the relay server.

use axum::{
    Router,
    extract::{State, ws::WebSocketUpgrade},
    response::{Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::server::hub::{Hub, LogEntry};
use crate::server::websocket::handle_websocket_connection;

/// Shared application state
pub type AppState = Arc<Hub>;

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ContentResponse {
    pub content: String,
    pub live_len: usize,
    pub total_len: usize,
}

/// Basic health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running!".to_string(),
    })
}

/// Current materialized document
pub async fn content(State(state): State<AppState>) -> Json<ContentResponse> {
    let snapshot = state.replica().state();
    Json(ContentResponse {
        content: snapshot.to_string(),
        live_len: snapshot.live_len(),
        total_len: snapshot.total_len(),
    })
}

/// Every accepted message, oldest first
pub async fn log(State(state): State<AppState>) -> Json<Vec<LogEntry>> {
    Json(state.log())
}

/// WebSocket connection handler for collaborative editing
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_websocket_connection(socket, state))
}

/// Creates and configures the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/content", get(content))
        .route("/log", get(log))
        .route("/ws", get(ws_handler))
        .with_state(state)
}
