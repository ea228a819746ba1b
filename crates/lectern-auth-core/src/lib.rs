//! Lectern Auth Core - Access-control business logic
//!
//! Everything between a decoded request and the datastore:
//! - [`TokenCodec`]: signs and verifies short-lived access tokens
//! - [`SessionManager`]: issuance, single-use rotation, reuse detection, revocation
//! - [`EntitlementResolver`]: "can principal P read resource R"
//! - [`EnrollmentFanout`]: materializes enrollments from grants and subscriptions
//! - [`ClaimWorkflow`]: binds a principal to a pre-provisioned roster seat
//! - [`guard`]: role and organization-role predicates over decoded claims
//!
//! Components are generic over a [`lectern_db::Store`] and hold no state of
//! their own beyond injected configuration.

pub mod claim;
pub mod config;
pub mod crypto;
pub mod enrollment;
pub mod entitlement;
pub mod error;
pub mod guard;
pub mod password;
pub mod session;
pub mod token;

pub use claim::*;
pub use config::*;
pub use crypto::{generate_rotation_secret, hash_token};
pub use enrollment::*;
pub use entitlement::*;
pub use error::*;
pub use guard::{require_authenticated, require_org_role, require_role};
pub use password::{
    hash_password, hash_password_blocking, verify_password, verify_password_blocking,
};
pub use session::*;
pub use token::*;
