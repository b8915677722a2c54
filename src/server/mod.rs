//! Web server hosting one replica and relaying its messages.
//!
//! This is a demo transport: every accepted message is reduced into the
//! hosted replica, appended to an ordered log and broadcast to all connected
//! websocket sessions.

pub mod hub;
pub mod routes;
pub mod websocket;

pub use hub::{Hub, HubError, LogEntry, Update};
pub use routes::{AppState, create_router};
pub use websocket::{ClientOp, ServerMessage};

use tokio::net::TcpListener;
use tracing::info;

/// Serves the relay on an already bound listener until the server stops.
pub async fn run(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_router(state)).await
}
