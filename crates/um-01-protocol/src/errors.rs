//! Protocol errors.

use thiserror::Error;

/// Errors from encoding or decoding wire messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Input is not a well-formed message of the expected direction.
    #[error("Malformed message: {0}")]
    Malformed(String),

    /// Message could not be serialized.
    #[error("Encoding failed: {0}")]
    Encoding(String),
}
