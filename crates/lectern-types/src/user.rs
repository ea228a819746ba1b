//! User types

use serde::{Deserialize, Serialize};

use crate::ParseError;

uuid_id!(
    /// Unique user (principal) identifier
    UserId
);

/// Global platform role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Operates the whole platform; bypasses organization-role guards
    PlatformAdmin,
    /// Administers one or more institutions
    InstitutionAdmin,
    /// Authors course content
    Instructor,
    /// Default role for self-registered principals
    #[default]
    Student,
}

impl Role {
    /// Stable string form, as stored in the `users.role` column
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PlatformAdmin => "platform_admin",
            Self::InstitutionAdmin => "institution_admin",
            Self::Instructor => "instructor",
            Self::Student => "student",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "platform_admin" => Ok(Self::PlatformAdmin),
            "institution_admin" => Ok(Self::InstitutionAdmin),
            "instructor" => Ok(Self::Instructor),
            "student" => Ok(Self::Student),
            _ => Err(ParseError::InvalidRole(s.to_string())),
        }
    }
}

/// Case-fold an email address for storage and lookup.
///
/// Emails are unique per principal after folding, so every write and every
/// lookup must go through this function.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Extract the domain part of an email address (already normalized).
pub fn email_domain(email: &str) -> Option<&str> {
    email
        .rsplit_once('@')
        .map(|(_, domain)| domain)
        .filter(|domain| !domain.is_empty())
}
