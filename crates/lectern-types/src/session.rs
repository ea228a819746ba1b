//! Session and token types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

uuid_id!(
    /// Unique rotation token row identifier
    RotationTokenId
);

/// Credential pair returned at login and on every rotation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived signed access token
    pub access_token: String,
    /// Access token lifetime in seconds
    pub access_expires_in: u64,
    /// Opaque single-use rotation secret (never persisted in this form)
    pub rotation_token: String,
    /// Rotation token lifetime in seconds
    pub rotation_expires_in: u64,
}

/// Active session as shown to its owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Rotation token row ID
    pub id: RotationTokenId,
    /// When the rotation token was issued
    pub created_at: DateTime<Utc>,
    /// When the rotation token expires
    pub expires_at: DateTime<Utc>,
}
