//! Auth errors

use lectern_types::DenialReason;
use thiserror::Error;

/// Kind of conflict behind a terminal, non-retryable failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// An account with this email already exists
    EmailTaken,
    /// The principal's membership in the organization is already verified
    AlreadyVerified,
}

impl ConflictKind {
    /// Human-readable message
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmailTaken => "an account with this email already exists",
            Self::AlreadyVerified => "membership is already verified",
        }
    }
}

/// Authentication and authorization errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// No credential was presented
    #[error("missing credential")]
    MissingCredential,

    /// Invalid token (malformed, bad signature, unknown, revoked, reused)
    #[error("invalid token")]
    InvalidToken,

    /// Token has expired
    #[error("token expired")]
    TokenExpired,

    /// The owning account is deactivated
    #[error("account deactivated")]
    AccountDeactivated,

    /// Invalid credentials (unknown email, wrong password, no password set)
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Global or organization role does not permit the operation
    #[error("insufficient role")]
    InsufficientRole,

    /// Entitlement check denied access
    #[error("access denied: {0}")]
    Forbidden(DenialReason),

    /// Resource not found
    #[error("not found")]
    NotFound,

    /// Terminal conflict
    #[error("conflict: {}", .0.message())]
    Conflict(ConflictKind),

    /// Roster claim did not match an unclaimed seat.
    ///
    /// Deliberately says nothing about whether the email or the code was wrong.
    #[error("no matching enrollment record")]
    ClaimRejected,

    /// No active organization is registered for the email domain
    #[error("no institution for this email domain")]
    NoInstitution,

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingCredential
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::InvalidCredentials => 401,
            Self::AccountDeactivated | Self::InsufficientRole => 403,
            Self::Forbidden(reason) => match reason {
                DenialReason::NotFound => 404,
                DenialReason::Unauthenticated => 401,
                DenialReason::NoSubscription => 403,
            },
            Self::NotFound | Self::NoInstitution => 404,
            Self::Conflict(_) => 409,
            Self::ClaimRejected => 422,
            Self::Database(_) | Self::Configuration(_) | Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "MISSING_CREDENTIAL",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::AccountDeactivated => "ACCOUNT_DEACTIVATED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InsufficientRole => "INSUFFICIENT_ROLE",
            Self::Forbidden(DenialReason::NotFound) => "NOT_FOUND",
            Self::Forbidden(DenialReason::Unauthenticated) => "UNAUTHENTICATED",
            Self::Forbidden(DenialReason::NoSubscription) => "NO_SUBSCRIPTION",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict(ConflictKind::EmailTaken) => "EMAIL_TAKEN",
            Self::Conflict(ConflictKind::AlreadyVerified) => "ALREADY_VERIFIED",
            Self::ClaimRejected => "CLAIM_REJECTED",
            Self::NoInstitution => "NO_INSTITUTION",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller's session cookies should be cleared
    pub fn clears_session(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential
                | Self::InvalidToken
                | Self::TokenExpired
                | Self::AccountDeactivated
        )
    }
}

impl From<lectern_db::DbError> for AuthError {
    fn from(err: lectern_db::DbError) -> Self {
        if let lectern_db::DbError::NotFound = err {
            return Self::NotFound;
        }
        tracing::error!("Database error: {}", err);
        Self::Database(err.to_string())
    }
}
