//! Cryptographic helpers for rotation secrets
//!
//! Rotation secrets are opaque random strings. Only their SHA-256 is ever
//! persisted, and that hash is independent of the access token signing key.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Entropy of a rotation secret in bytes
pub const ROTATION_SECRET_BYTES: usize = 32;

/// Generate a fresh rotation secret (URL-safe base64, no padding)
pub fn generate_rotation_secret() -> String {
    let mut bytes = [0u8; ROTATION_SECRET_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Securely hash a token for storage.
///
/// Uses SHA-256 to create a one-way hash of the token.
/// The original token cannot be recovered from the hash.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
