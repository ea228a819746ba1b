//! Axum extractors for authentication.
//!
//! # Usage
//!
//! ```ignore
//! use lectern_axum::{MaybeAuth, RequireAuth};
//!
//! // 401 when no credential is presented
//! async fn protected(auth: RequireAuth) -> String {
//!     format!("Hello, {}!", auth.email)
//! }
//!
//! // Anonymous callers get `None`
//! async fn public(auth: MaybeAuth) -> String {
//!     match auth.0 {
//!         Some(claims) => format!("Hello, {}!", claims.email),
//!         None => "Hello, guest!".to_string(),
//!     }
//! }
//! ```
//!
//! Neither extractor touches the database: the decoded claims carry the
//! membership snapshot that the guard predicates need.

use std::ops::Deref;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use lectern_auth_core::{AccessClaims, AuthError, CookieSettings, TokenCodec};

use crate::credential::{access_credential, CredentialSource};
use crate::error::GuardRejection;

/// Router state the extractors need
pub trait AuthState: Send + Sync {
    /// Codec used to verify access tokens
    fn token_codec(&self) -> &TokenCodec;

    /// Cookie names, paths and flags
    fn cookie_settings(&self) -> &CookieSettings;
}

fn decode<S: AuthState>(
    parts: &Parts,
    state: &S,
) -> Result<Option<(AccessClaims, CredentialSource)>, GuardRejection> {
    let Some((token, source)) = access_credential(&parts.headers, state.cookie_settings()) else {
        return Ok(None);
    };
    match state.token_codec().verify(token) {
        Ok(claims) => Ok(Some((claims, source))),
        Err(error) => {
            tracing::debug!(error = %error, source = ?source, "Rejected access token");
            Err(GuardRejection::new(error, state.cookie_settings()))
        }
    }
}

/// Extractor that requires a valid access token.
///
/// Rejects with 401 when the credential is missing, malformed or expired.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AccessClaims);

impl Deref for RequireAuth {
    type Target = AccessClaims;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: AuthState,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        decode(parts, state)?
            .map(|(claims, _)| Self(claims))
            .ok_or_else(|| GuardRejection::new(AuthError::MissingCredential, state.cookie_settings()))
    }
}

/// Extractor for optional authentication.
///
/// Absent credentials yield `None`. A credential that is presented but does
/// not verify is still rejected, so clients learn to rotate.
#[derive(Debug, Clone)]
pub struct MaybeAuth(pub Option<AccessClaims>);

impl Deref for MaybeAuth {
    type Target = Option<AccessClaims>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for MaybeAuth
where
    S: AuthState,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(decode(parts, state)?.map(|(claims, _)| claims)))
    }
}
