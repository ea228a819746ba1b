//! Argon2id password hashing

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::sync::OnceLock;

use crate::AuthError;

/// Hash a password into a PHC string with an embedded random salt
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("Failed to hash password: {}", e);
            AuthError::Internal("Failed to hash password".to_string())
        })
}

/// Verify a password against a stored PHC string.
///
/// A malformed stored hash verifies as `false`.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        tracing::warn!("Stored password hash is malformed");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Hash on the blocking pool, off the async workers
pub async fn hash_password_blocking(password: &str) -> Result<String, AuthError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(join_failed)?
}

/// Verify on the blocking pool.
///
/// With no stored hash a dummy hash is verified instead, so an unknown
/// account costs the same as a wrong password. The result is then `false`.
pub async fn verify_password_blocking(
    password: &str,
    stored_hash: Option<&str>,
) -> Result<bool, AuthError> {
    let password = password.to_owned();
    let stored_hash = stored_hash.map(str::to_owned);
    tokio::task::spawn_blocking(move || match stored_hash {
        Some(hash) => verify_password(&password, &hash),
        None => {
            if let Some(dummy) = dummy_hash() {
                verify_password(&password, dummy);
            }
            false
        }
    })
    .await
    .map_err(join_failed)
}

fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("lectern-dummy-password").ok())
        .as_deref()
}

fn join_failed(e: tokio::task::JoinError) -> AuthError {
    tracing::error!("Password task failed: {}", e);
    AuthError::Internal("Password task failed".to_string())
}
