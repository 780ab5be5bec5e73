//! JSON codec: one JSON document per logical message, no further framing.

use crate::errors::ProtocolError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Decode a text frame into a message of the expected direction.
pub fn decode<M: DeserializeOwned>(text: &str) -> Result<M, ProtocolError> {
    serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

/// Encode a message into a text frame.
pub fn encode<M: Serialize>(message: &M) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(|e| ProtocolError::Encoding(e.to_string()))
}
