//! Entitlement decision types

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Why an enrollment row exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessSource {
    /// Individual purchase or subscription
    Individual,
    /// Granted through an organization or batch
    Institutional,
}

impl AccessSource {
    /// Stable string form, as stored in `enrollments.access_source`
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Institutional => "institutional",
        }
    }
}

impl std::fmt::Display for AccessSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccessSource {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "individual" => Ok(Self::Individual),
            "institutional" => Ok(Self::Institutional),
            _ => Err(ParseError::InvalidAccessSource(s.to_string())),
        }
    }
}

/// Reason code attached to a denied access check.
///
/// The transport layer maps these to statuses; the resolver never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// Resource does not exist, or existence must not be confirmed
    NotFound,
    /// Resource requires an authenticated principal
    Unauthenticated,
    /// Principal has no grant path to the resource
    NoSubscription,
}

impl DenialReason {
    /// Reason code string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Unauthenticated => "unauthenticated",
            Self::NoSubscription => "no_subscription",
        }
    }
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grant path that satisfied an access check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantPath {
    /// Lesson is marked free
    FreeLesson,
    /// A materialized enrollment exists
    Enrollment,
    /// Verified, active membership in an active organization
    Membership,
}

/// Outcome of an entitlement check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    /// Access granted
    Granted {
        /// The path that granted access
        via: GrantPath,
    },
    /// Access denied
    Denied {
        /// Reason code for the caller
        reason: DenialReason,
    },
}

impl AccessDecision {
    /// Build a granted decision
    pub const fn granted(via: GrantPath) -> Self {
        Self::Granted { via }
    }

    /// Build a denied decision
    pub const fn denied(reason: DenialReason) -> Self {
        Self::Denied { reason }
    }

    /// Whether access was granted
    pub const fn is_granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }

    /// Denial reason, if denied
    pub const fn denial(&self) -> Option<DenialReason> {
        match self {
            Self::Granted { .. } => None,
            Self::Denied { reason } => Some(*reason),
        }
    }
}
