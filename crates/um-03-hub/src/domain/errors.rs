//! Hub error types.

use crate::domain::config::ConfigError;
use std::net::SocketAddr;
use thiserror::Error;

/// Errors surfaced by the hub's server lifecycle.
///
/// Per-message and per-round failures are logged and never surface here.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}
