//! Access token codec (HS256 JWT)
//!
//! The codec is the cryptographic trust boundary. It is stateless: a verified
//! token is trusted until `exp` without consulting the datastore, so logout
//! takes up to one access token lifetime to take full effect.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use lectern_types::{MembershipClaim, OrganizationId, Role, UserId};
use serde::{Deserialize, Serialize};

use crate::{AuthConfig, AuthError};

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Principal ID
    pub sub: UserId,
    /// Principal email (case-folded)
    pub email: String,
    /// Global role
    pub role: Role,
    /// Membership snapshot taken at issuance
    #[serde(default)]
    pub memberships: Vec<MembershipClaim>,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiration (seconds since epoch)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

impl AccessClaims {
    /// Principal ID
    pub fn user_id(&self) -> UserId {
        self.sub
    }

    /// Snapshot of the membership in one organization
    pub fn membership(&self, organization_id: OrganizationId) -> Option<&MembershipClaim> {
        self.memberships
            .iter()
            .find(|m| m.organization_id == organization_id)
    }

    /// Whether the principal is a platform administrator
    pub fn is_platform_admin(&self) -> bool {
        self.role == Role::PlatformAdmin
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs and verifies access tokens with the injected secret
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl_secs: u64,
}

impl TokenCodec {
    /// Build a codec from validated configuration
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.signing_secret()),
            decoding_key: DecodingKey::from_secret(config.signing_secret()),
            validation,
            issuer: config.issuer.clone(),
            ttl_secs: config.access_token_ttl.as_secs(),
        }
    }

    /// Access token lifetime in seconds
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Build claims for a principal, valid from now for the configured lifetime
    pub fn claims_for(
        &self,
        user_id: UserId,
        email: impl Into<String>,
        role: Role,
        memberships: Vec<MembershipClaim>,
    ) -> AccessClaims {
        let now = Utc::now().timestamp();
        AccessClaims {
            sub: user_id,
            email: email.into(),
            role,
            memberships,
            iat: now,
            exp: now + i64::try_from(self.ttl_secs).unwrap_or(i64::MAX - now),
            iss: self.issuer.clone(),
        }
    }

    /// Sign claims into a compact JWT
    pub fn encode(&self, claims: &AccessClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to sign access token: {}", e);
            AuthError::Internal("Failed to sign access token".to_string())
        })
    }

    /// Verify signature, issuer and expiry, returning the claims
    pub fn verify(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| {
                tracing::debug!("Access token rejected: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken,
                }
            },
        )?;

        Ok(data.claims)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.issuer)
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}
