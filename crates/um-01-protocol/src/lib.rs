//! # Wire Protocol (UM-01)
//!
//! JSON messages exchanged over one long-lived WebSocket per validator.
//! Every message is an envelope `{"type": "signup" | "validate", "data": {...}}`.
//!
//! ```text
//! Validator                                    Hub
//!    │── signup   {ip, publicKey, callbackId, signedMessage} ──▶│
//!    │◀─ signup   {validatorId, callbackId} ─────────────────────│
//!    │◀─ validate {url, callbackId, websiteId} ──────────────────│
//!    │── validate {callbackId, status, latency, websiteId,       │
//!    │             validatorId, signedMessage} ─────────────────▶│
//! ```
//!
//! The same `type` tag is used in both directions, so the two directions are
//! modelled as separate enums: [`ValidatorMessage`] (validator → hub) and
//! [`HubMessage`] (hub → validator).
//!
//! `callbackId` is generated by whoever initiates a request and is the only
//! correlation key between that request and its reply.

pub mod canonical;
pub mod codec;
pub mod errors;
pub mod messages;

pub use canonical::{reply_text, signup_text};
pub use codec::{decode, encode};
pub use errors::ProtocolError;
pub use messages::{
    HubMessage, SignupAck, SignupRequest, ValidateReply, ValidateRequest, ValidatorMessage,
};
