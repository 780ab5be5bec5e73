//! Message payloads and direction envelopes.

use crate::canonical::{reply_text, signup_text};
use serde::{Deserialize, Serialize};
use shared_crypto::{sign_message, verify_message, Ed25519KeyPair};
use shared_types::{CorrelationId, TickStatus, ValidatorId, WebsiteId};

// =============================================================================
// VALIDATOR → HUB
// =============================================================================

/// Messages a validator sends to the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ValidatorMessage {
    Signup(SignupRequest),
    Validate(ValidateReply),
}

/// Signup request carrying a signature over [`signup_text`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub ip: String,
    pub public_key: String,
    pub callback_id: CorrelationId,
    pub signed_message: String,
}

impl SignupRequest {
    /// Build and sign a signup request with a fresh callback id.
    pub fn signed(keypair: &Ed25519KeyPair, ip: impl Into<String>) -> Self {
        let callback_id = CorrelationId::new();
        let public_key = keypair.public_key().to_hex();
        let signed_message = sign_message(&signup_text(&callback_id, &public_key), keypair);
        Self {
            ip: ip.into(),
            public_key,
            callback_id,
            signed_message,
        }
    }

    /// Check the signature against the claimed public key.
    pub fn verify(&self) -> bool {
        verify_message(
            &signup_text(&self.callback_id, &self.public_key),
            &self.signed_message,
            &self.public_key,
        )
    }
}

/// Result of a check, signed over [`reply_text`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateReply {
    pub callback_id: CorrelationId,
    pub status: TickStatus,
    #[serde(rename = "latency")]
    pub latency_ms: u64,
    pub website_id: WebsiteId,
    /// `None` when the validator answers before its signup was acknowledged.
    pub validator_id: Option<ValidatorId>,
    pub signed_message: String,
}

impl ValidateReply {
    /// Build and sign a reply to `request`.
    pub fn signed(
        request: &ValidateRequest,
        status: TickStatus,
        latency_ms: u64,
        validator_id: Option<ValidatorId>,
        keypair: &Ed25519KeyPair,
    ) -> Self {
        Self {
            callback_id: request.callback_id,
            status,
            latency_ms,
            website_id: request.website_id.clone(),
            validator_id,
            signed_message: sign_message(&reply_text(&request.callback_id), keypair),
        }
    }

    /// Check the signature against a known validator public key.
    pub fn verify(&self, public_key: &str) -> bool {
        verify_message(
            &reply_text(&self.callback_id),
            &self.signed_message,
            public_key,
        )
    }
}

// =============================================================================
// HUB → VALIDATOR
// =============================================================================

/// Messages the hub sends to a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum HubMessage {
    Signup(SignupAck),
    Validate(ValidateRequest),
}

/// Acknowledges a successful signup, echoing its callback id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupAck {
    pub validator_id: ValidatorId,
    pub callback_id: CorrelationId,
}

/// Asks a validator to check one website.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub url: String,
    pub callback_id: CorrelationId,
    pub website_id: WebsiteId,
}
