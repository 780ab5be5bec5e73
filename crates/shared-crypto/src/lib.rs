//! # Shared Crypto - Validator Identity Primitives
//!
//! ## Components
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `signatures` | Ed25519 keypair, public key and signature types with wire encodings |
//! | `identity` | Text-message `sign_message` / `verify_message` used by the protocol |
//! | `keystore` | Loading, parsing and generating validator key material |
//!
//! ## Wire Encodings
//!
//! - Public key: lowercase hex of the 32-byte key. This string is the
//!   validator's durable identity.
//! - Signature: standard base64 of the 64-byte signature.
//!
//! ## Security Properties
//!
//! - **Ed25519**: Deterministic nonces, no RNG dependency when signing
//! - **Fail closed**: `verify_message` returns `false` on any decoding error
//! - **Secret hygiene**: Seed buffers are zeroized after use

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod identity;
pub mod keystore;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use identity::{sign_message, verify_message};
pub use keystore::{load_or_generate, parse_key_material};
pub use signatures::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
