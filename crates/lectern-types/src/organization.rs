//! Organization and membership types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ParseError;

uuid_id!(
    /// Unique organization (institution) identifier
    OrganizationId
);

uuid_id!(
    /// Unique batch (cohort within an organization) identifier
    BatchId
);

/// Role a principal holds inside one organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgRole {
    /// Organization administrator (roster uploads, course grants)
    Admin,
    /// Enrolled member
    Student,
}

impl OrgRole {
    /// Stable string form, as stored in `organization_memberships.role`
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Student => "student",
        }
    }
}

impl std::fmt::Display for OrgRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrgRole {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "student" => Ok(Self::Student),
            _ => Err(ParseError::InvalidOrgRole(s.to_string())),
        }
    }
}

/// Membership snapshot embedded in access tokens.
///
/// This is a denormalized copy taken at issuance time. It goes stale until the
/// next rotation: a verification or role change made after issuance is not
/// visible to tokens that are already in circulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipClaim {
    /// Membership row ID
    pub id: Uuid,
    /// Organization the membership belongs to
    pub organization_id: OrganizationId,
    /// Organization display name
    pub organization_name: String,
    /// Role within the organization
    pub role: OrgRole,
    /// Whether the principal proved their identity to the organization
    pub verified: bool,
    /// Batch the member is assigned to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<BatchId>,
}
