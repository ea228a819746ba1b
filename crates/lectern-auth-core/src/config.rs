//! Configuration types for the access-control core

use std::time::Duration;

use crate::AuthError;

/// What to do when an already-revoked rotation token is presented again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReusePolicy {
    /// Treat every re-presentation as theft and revoke all of the owner's tokens
    #[default]
    RevokeAll,
    /// Re-presentation within this long after revocation is rejected without
    /// mass revocation (concurrent tabs racing to refresh). Later re-presentation
    /// behaves like `RevokeAll`.
    GraceWindow(Duration),
}

/// How roster ingestion treats rows whose email belongs to an existing account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RosterLinkPolicy {
    /// Link the account to the seat immediately on email match.
    ///
    /// This trusts the uploading institution admin: an email match is a
    /// weaker proof of identity than the enrollment code.
    #[default]
    EmailMatch,
    /// Leave the seat pending until the principal claims it with its code
    RequireCode,
}

/// Cookie names and flags for the two session credentials
#[derive(Debug, Clone)]
pub struct CookieSettings {
    /// Access token cookie name
    pub access_name: String,
    /// Rotation token cookie name
    pub rotation_name: String,
    /// Path the rotation cookie is scoped to
    pub rotation_path: String,
    /// Whether cookies carry the `Secure` attribute
    pub secure: bool,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            access_name: "lectern_access".to_string(),
            rotation_name: "lectern_rotation".to_string(),
            rotation_path: "/api/v1/auth".to_string(),
            secure: true,
        }
    }
}

/// Access-control core configuration
#[derive(Clone)]
pub struct AuthConfig {
    signing_secret: String,
    /// Issuer stamped into and required from access tokens
    pub issuer: String,
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// Rotation token lifetime
    pub rotation_token_ttl: Duration,
    /// Cookie settings
    pub cookies: CookieSettings,
    /// Reuse detection policy
    pub reuse_policy: ReusePolicy,
    /// Roster auto-link policy
    pub roster_link_policy: RosterLinkPolicy,
}

impl AuthConfig {
    /// Minimum signing secret length in bytes (256 bits)
    pub const MIN_SECRET_LENGTH: usize = 32;

    /// Create a config with default lifetimes (15 minutes / 7 days).
    ///
    /// # Errors
    /// Returns `AuthError::Configuration` if the secret is shorter than
    /// [`Self::MIN_SECRET_LENGTH`] bytes.
    pub fn try_new(
        signing_secret: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let signing_secret = signing_secret.into();
        if signing_secret.len() < Self::MIN_SECRET_LENGTH {
            return Err(AuthError::Configuration(format!(
                "signing secret too short: got {} bytes, need at least {}",
                signing_secret.len(),
                Self::MIN_SECRET_LENGTH
            )));
        }

        Ok(Self {
            signing_secret,
            issuer: issuer.into(),
            access_token_ttl: Duration::from_secs(15 * 60),
            rotation_token_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            cookies: CookieSettings::default(),
            reuse_policy: ReusePolicy::default(),
            roster_link_policy: RosterLinkPolicy::default(),
        })
    }

    /// Raw signing secret bytes
    pub fn signing_secret(&self) -> &[u8] {
        self.signing_secret.as_bytes()
    }

    /// Set access token lifetime
    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    /// Set rotation token lifetime
    pub fn with_rotation_token_ttl(mut self, ttl: Duration) -> Self {
        self.rotation_token_ttl = ttl;
        self
    }

    /// Set cookie settings
    pub fn with_cookies(mut self, cookies: CookieSettings) -> Self {
        self.cookies = cookies;
        self
    }

    /// Set reuse detection policy
    pub fn with_reuse_policy(mut self, policy: ReusePolicy) -> Self {
        self.reuse_policy = policy;
        self
    }

    /// Set roster auto-link policy
    pub fn with_roster_link_policy(mut self, policy: RosterLinkPolicy) -> Self {
        self.roster_link_policy = policy;
        self
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("signing_secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("rotation_token_ttl", &self.rotation_token_ttl)
            .field("cookies", &self.cookies)
            .field("reuse_policy", &self.reuse_policy)
            .field("roster_link_policy", &self.roster_link_policy)
            .finish()
    }
}
