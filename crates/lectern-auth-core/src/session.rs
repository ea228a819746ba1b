//! Session lifecycle: issuance, single-use rotation, reuse detection, revocation
//!
//! A session is a pair of credentials: a short-lived access token from the
//! [`TokenCodec`] and a long-lived opaque rotation secret whose SHA-256 is the
//! only thing stored. Each rotation secret can be exchanged exactly once.

use chrono::{Duration as ChronoDuration, Utc};
use lectern_db::{
    CreateRotationToken, CreateUser, MembershipRepository, RotationTokenRepository,
    RotationTokenRow, Store, UserRepository, UserRow,
};
use lectern_types::{normalize_email, MembershipClaim, Role, SessionInfo, TokenPair, UserId};
use std::sync::Arc;
use uuid::Uuid;

use crate::crypto::{generate_rotation_secret, hash_token};
use crate::password::{hash_password_blocking, verify_password_blocking};
use crate::{AccessClaims, AuthConfig, AuthError, ConflictKind, ReusePolicy, TokenCodec};

/// A freshly issued credential pair plus the claims inside the access token
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub tokens: TokenPair,
    pub claims: AccessClaims,
}

/// Session manager handles issuance, rotation and revocation
#[derive(Clone)]
pub struct SessionManager<S: Store> {
    store: Arc<S>,
    codec: TokenCodec,
    rotation_ttl: ChronoDuration,
    reuse_policy: ReusePolicy,
}

impl<S: Store> SessionManager<S> {
    /// Create a new session manager
    pub fn new(config: &AuthConfig, store: Arc<S>) -> Self {
        let rotation_ttl = ChronoDuration::from_std(config.rotation_token_ttl)
            .unwrap_or_else(|_| ChronoDuration::days(7));
        Self {
            store,
            codec: TokenCodec::new(config),
            rotation_ttl,
            reuse_policy: config.reuse_policy,
        }
    }

    /// The access token codec
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Verify an access token
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.codec.verify(token)
    }

    /// Register a password account and start its first session
    pub async fn register(&self, email: &str, password: &str) -> Result<IssuedSession, AuthError> {
        let email = normalize_email(email);
        if self.store.users().find_by_email(&email).await?.is_some() {
            return Err(AuthError::Conflict(ConflictKind::EmailTaken));
        }

        let password_hash = hash_password_blocking(password).await?;
        let user = self
            .store
            .users()
            .create(CreateUser {
                id: Uuid::new_v4(),
                email,
                password_hash: Some(password_hash),
                role: Role::Student.as_str().to_string(),
            })
            .await?;

        tracing::info!(user_id = %user.id, "Registered account");
        self.issue(&user).await
    }

    /// Check a password and start a session.
    ///
    /// Unknown email, missing password hash and wrong password all read as
    /// `InvalidCredentials`. A deactivated account is reported as such only
    /// after the password checks out.
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedSession, AuthError> {
        let email = normalize_email(email);
        let user = self.store.users().find_by_email(&email).await?;

        let stored_hash = user.as_ref().and_then(|u| u.password_hash.as_deref());
        let verified = verify_password_blocking(password, stored_hash).await?;
        let Some(user) = user.filter(|_| verified) else {
            tracing::debug!("Password check failed");
            return Err(AuthError::InvalidCredentials);
        };

        if !user.active {
            return Err(AuthError::AccountDeactivated);
        }

        self.issue(&user).await
    }

    /// Issue a new credential pair for a known principal.
    ///
    /// The membership snapshot is read fresh from the datastore.
    pub async fn issue(&self, user: &UserRow) -> Result<IssuedSession, AuthError> {
        let memberships = self.membership_snapshot(user.id).await?;
        let claims = self
            .codec
            .claims_for(user.user_id(), user.email.clone(), user.role()?, memberships);
        let access_token = self.codec.encode(&claims)?;

        let rotation_token = generate_rotation_secret();
        let expires_at = Utc::now() + self.rotation_ttl;
        let row = self
            .store
            .rotation_tokens()
            .create(CreateRotationToken {
                id: Uuid::new_v4(),
                user_id: user.id,
                token_hash: hash_token(&rotation_token),
                expires_at,
            })
            .await?;

        metrics::counter!("lectern_sessions_issued_total").increment(1);
        tracing::info!(user_id = %user.id, rotation_token_id = %row.id, "Issued session");

        Ok(IssuedSession {
            tokens: TokenPair {
                access_token,
                access_expires_in: self.codec.ttl_secs(),
                rotation_token,
                rotation_expires_in: u64::try_from(self.rotation_ttl.num_seconds()).unwrap_or(0),
            },
            claims,
        })
    }

    /// Exchange a rotation secret for a new credential pair.
    ///
    /// The presented secret is revoked by an atomic conditional update, so of
    /// any number of concurrent exchanges exactly one succeeds. Presenting a
    /// secret that is already revoked is a theft signal handled per
    /// [`ReusePolicy`]; the caller only ever sees `InvalidToken`.
    pub async fn rotate(&self, rotation_token: &str) -> Result<IssuedSession, AuthError> {
        let row = self
            .store
            .rotation_tokens()
            .find_by_token_hash(&hash_token(rotation_token))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if row.revoked {
            return Err(self.handle_reuse(&row).await);
        }

        if row.is_expired() {
            return Err(AuthError::TokenExpired);
        }

        if !self.store.rotation_tokens().revoke_if_active(row.id).await? {
            // Lost a race against another exchange of the same secret.
            return Err(self.handle_reuse(&row).await);
        }

        let user = self
            .store
            .users()
            .find_by_id(row.user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !user.active {
            tracing::info!(user_id = %user.id, "Rotation refused for deactivated account");
            return Err(AuthError::AccountDeactivated);
        }

        let issued = self.issue(&user).await?;
        metrics::counter!("lectern_rotations_total").increment(1);
        tracing::debug!(user_id = %user.id, revoked = %row.id, "Rotated session");
        Ok(issued)
    }

    /// Revoke the presented rotation secret. Unknown or spent secrets are a no-op.
    pub async fn logout(&self, rotation_token: &str) -> Result<(), AuthError> {
        let row = self
            .store
            .rotation_tokens()
            .find_by_token_hash(&hash_token(rotation_token))
            .await?;

        if let Some(row) = row.filter(|r| !r.revoked) {
            self.store.rotation_tokens().revoke_if_active(row.id).await?;
            tracing::info!(user_id = %row.user_id, rotation_token_id = %row.id, "Logged out");
        }

        Ok(())
    }

    /// Revoke every rotation token of a principal
    pub async fn logout_all(&self, user_id: UserId) -> Result<u64, AuthError> {
        let revoked = self
            .store
            .rotation_tokens()
            .revoke_all_for_user(user_id.0)
            .await?;
        tracing::info!(user_id = %user_id, revoked, "Revoked all sessions");
        Ok(revoked)
    }

    /// Replace the password and revoke every rotation token
    pub async fn reset_password(&self, user_id: UserId, new_password: &str) -> Result<u64, AuthError> {
        if self.store.users().find_by_id(user_id.0).await?.is_none() {
            return Err(AuthError::NotFound);
        }

        let hash = hash_password_blocking(new_password).await?;
        self.store
            .users()
            .update_password_hash(user_id.0, &hash)
            .await?;
        self.logout_all(user_id).await
    }

    /// Non-revoked, unexpired sessions of a principal
    pub async fn active_sessions(&self, user_id: UserId) -> Result<Vec<SessionInfo>, AuthError> {
        let rows = self
            .store
            .rotation_tokens()
            .find_active_by_user_id(user_id.0)
            .await?;
        Ok(rows.iter().map(RotationTokenRow::session_info).collect())
    }

    /// Delete rotation tokens past their expiry.
    ///
    /// Revoked but unexpired rows are kept: they are what reuse detection reads.
    pub async fn prune_expired(&self) -> Result<u64, AuthError> {
        let deleted = self.store.rotation_tokens().delete_expired().await?;
        if deleted > 0 {
            tracing::info!(deleted, "Pruned expired rotation tokens");
        }
        Ok(deleted)
    }

    async fn membership_snapshot(&self, user_id: Uuid) -> Result<Vec<MembershipClaim>, AuthError> {
        let rows = self.store.memberships().find_details_for_user(user_id).await?;
        let mut claims = Vec::with_capacity(rows.len());
        for row in rows.iter().filter(|r| r.active && r.organization_active) {
            claims.push(row.to_claim()?);
        }
        Ok(claims)
    }

    /// Apply the reuse policy to a spent secret and produce the caller-facing error
    async fn handle_reuse(&self, row: &RotationTokenRow) -> AuthError {
        if let ReusePolicy::GraceWindow(window) = self.reuse_policy {
            // A race loser has no revoked_at on its stale read: it was revoked just now.
            let within = row.revoked_at.map_or(true, |at| {
                Utc::now()
                    .signed_duration_since(at)
                    .to_std()
                    .map_or(true, |elapsed| elapsed <= window)
            });
            if within {
                tracing::debug!(user_id = %row.user_id, "Spent rotation token re-presented within grace window");
                return AuthError::InvalidToken;
            }
        }

        metrics::counter!("lectern_token_reuse_detected_total").increment(1);
        tracing::warn!(
            user_id = %row.user_id,
            rotation_token_id = %row.id,
            "Rotation token reuse detected, revoking all sessions"
        );

        if let Err(e) = self
            .store
            .rotation_tokens()
            .revoke_all_for_user(row.user_id)
            .await
        {
            return AuthError::from(e);
        }

        AuthError::InvalidToken
    }
}

impl<S: Store> std::fmt::Debug for SessionManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("codec", &self.codec)
            .field("rotation_ttl", &self.rotation_ttl)
            .field("reuse_policy", &self.reuse_policy)
            .finish_non_exhaustive()
    }
}
