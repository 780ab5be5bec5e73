//! Canonical texts covered by signatures.
//!
//! Both sides must produce these byte-for-byte; any change breaks every
//! deployed validator.

use shared_types::CorrelationId;

/// Text a validator signs when signing up.
pub fn signup_text(callback_id: &CorrelationId, public_key: &str) -> String {
    format!("Signed message for {}, {}", callback_id, public_key)
}

/// Text a validator signs when replying to a validate request.
pub fn reply_text(callback_id: &CorrelationId) -> String {
    format!("Replying to {}", callback_id)
}
