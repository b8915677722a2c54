//! Main entry point for the RGA relay server.

use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rga_reducer::config::ServerConfig;
use rga_reducer::server::{self, Hub};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter)?)
        .init();

    info!("Starting RGA relay for replica {}...", config.replica_id);
    info!("Available endpoints:");
    info!("  GET  /health  - Health check");
    info!("  GET  /content - Materialized document");
    info!("  GET  /log     - Accepted messages");
    info!("  GET  /ws      - Collaborative editing session");

    let state = Arc::new(Hub::new(config.replica_id, config.channel_capacity));
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    server::run(listener, state).await?;
    Ok(())
}
