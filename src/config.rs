//! Command-line and environment configuration for the relay server.

use clap::Parser;
use std::net::SocketAddr;

use crate::crdt::ReplicaId;

#[derive(Parser, Debug, Clone)]
#[command(name = "rga-server")]
#[command(about = "Hosts an RGA replica and relays its messages over websockets", long_about = None)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "RGA_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Replica id of the hosted document
    #[arg(long, env = "RGA_REPLICA_ID", default_value_t = 1)]
    pub replica_id: ReplicaId,

    /// tracing filter directive, e.g. `info` or `rga_reducer=debug`
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_filter: String,

    /// Buffered updates per websocket session before it starts lagging
    #[arg(long, env = "RGA_CHANNEL_CAPACITY", default_value_t = 1024)]
    pub channel_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            replica_id: 1,
            log_filter: "info".to_string(),
            channel_capacity: 1024,
        }
    }
}
