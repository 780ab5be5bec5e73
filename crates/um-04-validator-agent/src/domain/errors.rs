//! Agent error types.

use crate::domain::config::ConfigError;
use shared_crypto::CryptoError;
use std::time::Duration;
use thiserror::Error;
use um_01_protocol::ProtocolError;
use um_02_pending_calls::PendingError;

/// Errors that end a hub session. The agent reconnects after any of them.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Key error: {0}")]
    Key(#[from] CryptoError),

    #[error("Failed to connect to hub: {0}")]
    Connect(String),

    #[error("Connection error: {0}")]
    Transport(String),

    #[error("No signup acknowledgement within {0:?}")]
    SignupTimeout(Duration),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Signup tracking error: {0}")]
    Pending(#[from] PendingError),
}
