//! # Validator Key Material
//!
//! A validator owns its keypair; the hub never sees the secret. Accepted
//! encodings:
//!
//! - JSON byte array of 32 bytes (seed) or 64 bytes (seed followed by public key)
//! - Hex string of 64 chars (seed) or 128 chars (seed followed by public key)
//!
//! Generated key files hold the hex seed and are created with mode 0600 on unix.

use crate::signatures::Ed25519KeyPair;
use crate::CryptoError;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;
use zeroize::Zeroizing;

/// Parse key material in any of the accepted encodings.
pub fn parse_key_material(input: &str) -> Result<Ed25519KeyPair, CryptoError> {
    let trimmed = input.trim();
    let bytes: Zeroizing<Vec<u8>> = if trimmed.starts_with('[') {
        Zeroizing::new(
            serde_json::from_str::<Vec<u8>>(trimmed)
                .map_err(|e| CryptoError::UnrecognizedKeyMaterial(e.to_string()))?,
        )
    } else {
        Zeroizing::new(
            hex::decode(trimmed)
                .map_err(|e| CryptoError::UnrecognizedKeyMaterial(e.to_string()))?,
        )
    };

    match bytes.len() {
        32 => {
            let mut seed = Zeroizing::new([0u8; 32]);
            seed.copy_from_slice(&bytes);
            Ok(Ed25519KeyPair::from_seed(*seed))
        }
        64 => {
            let mut full = Zeroizing::new([0u8; 64]);
            full.copy_from_slice(&bytes);
            Ed25519KeyPair::from_keypair_bytes(&full)
        }
        actual => Err(CryptoError::InvalidKeyLength {
            expected: 32,
            actual,
        }),
    }
}

/// Load the keypair stored at `path`, generating and persisting a new one
/// when the file does not exist yet.
pub fn load_or_generate(path: &Path) -> Result<Ed25519KeyPair, CryptoError> {
    if path.exists() {
        let contents = Zeroizing::new(fs::read_to_string(path)?);
        let keypair = parse_key_material(&contents)?;
        info!(public_key = %keypair.public_key(), path = %path.display(), "Loaded validator key");
        return Ok(keypair);
    }

    let keypair = Ed25519KeyPair::generate();
    let encoded = Zeroizing::new(hex::encode(keypair.to_seed()));
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = open_private(path)?;
    file.write_all(encoded.as_bytes())?;
    info!(public_key = %keypair.public_key(), path = %path.display(), "Generated validator key");
    Ok(keypair)
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new().write(true).create_new(true).open(path)
}
