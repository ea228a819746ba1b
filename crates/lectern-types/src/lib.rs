//! Lectern Types - Shared domain types
//!
//! This crate contains the vocabulary shared by every Lectern crate:
//! - Typed identifiers for principals, organizations, batches, courses and lessons
//! - Global and organization-scoped roles
//! - The membership snapshot embedded in access tokens
//! - Entitlement decisions and their reason codes

/// Declares a `Uuid` newtype identifier with the usual conversions.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub uuid::Uuid);

        impl $name {
            /// Create a new random identifier
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Parse an identifier from a string
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(uuid::Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

pub mod catalog;
pub mod entitlement;
pub mod error;
pub mod organization;
pub mod session;
pub mod user;

pub use catalog::*;
pub use entitlement::*;
pub use error::*;
pub use organization::*;
pub use session::*;
pub use user::*;
