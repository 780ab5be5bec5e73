//! # Text-Message Signing
//!
//! The protocol signs short UTF-8 texts and ships the signature as base64
//! alongside the signer's hex public key. `verify_message` is the single
//! trust gate on the hub side and never panics or errors: anything that
//! cannot be decoded is simply not a valid signature.

use crate::signatures::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use tracing::debug;

/// Sign `message` and return the base64 signature.
pub fn sign_message(message: &str, keypair: &Ed25519KeyPair) -> String {
    keypair.sign(message.as_bytes()).to_base64()
}

/// Verify a base64 `signature` over `message` against a hex `public_key`.
///
/// Fails closed: malformed keys, malformed signatures and verification
/// failures all yield `false`.
pub fn verify_message(message: &str, signature: &str, public_key: &str) -> bool {
    let key = match Ed25519PublicKey::from_hex(public_key) {
        Ok(key) => key,
        Err(e) => {
            debug!(error = %e, "Rejecting signature: bad public key");
            return false;
        }
    };
    let sig = match Ed25519Signature::from_base64(signature) {
        Ok(sig) => sig,
        Err(e) => {
            debug!(error = %e, "Rejecting signature: bad signature encoding");
            return false;
        }
    };
    key.verify(message.as_bytes(), &sig).is_ok()
}
