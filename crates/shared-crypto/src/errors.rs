//! Errors raised while decoding keys, verifying signatures or touching the
//! key file.

use thiserror::Error;

/// Failure of a key, signature or key-file operation.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Decoded public key has the wrong byte length.
    #[error("Public key must be {expected} bytes, got {actual}")]
    InvalidKeyLength {
        /// Required length.
        expected: usize,
        /// Length actually decoded.
        actual: usize,
    },

    /// Not hex, or not a point on the curve.
    #[error("Public key is not a valid Ed25519 point")]
    InvalidPublicKey,

    /// Keypair bytes whose public half does not match the seed.
    #[error("Private key does not match its public half")]
    InvalidPrivateKey,

    /// Not base64, or not 64 bytes once decoded.
    #[error("Signature is not 64 base64-encoded bytes")]
    InvalidSignatureFormat,

    /// Well-formed signature that does not verify.
    #[error("Signature does not match message and key")]
    SignatureVerificationFailed,

    /// Key material is neither a seed nor a keypair in a known encoding.
    #[error("Unrecognized key material: {0}")]
    UnrecognizedKeyMaterial(String),

    /// Key file could not be read or written.
    #[error("Key file error: {0}")]
    KeyFile(#[from] std::io::Error),
}
