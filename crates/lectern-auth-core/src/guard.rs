//! Request-time guard predicates
//!
//! Pure functions of the decoded access token and path parameters. They never
//! touch the datastore: organization roles are read from the membership
//! snapshot embedded at issuance.

use lectern_types::{OrgRole, OrganizationId, Role};

use crate::{AccessClaims, AuthError};

/// Require a decoded credential
#[inline]
pub fn require_authenticated(claims: Option<&AccessClaims>) -> Result<&AccessClaims, AuthError> {
    claims.ok_or(AuthError::MissingCredential)
}

/// Require the global role to be one of `allowed`
pub fn require_role(claims: &AccessClaims, allowed: &[Role]) -> Result<(), AuthError> {
    if allowed.contains(&claims.role) {
        Ok(())
    } else {
        tracing::debug!(user_id = %claims.sub, role = %claims.role, "Role guard denied");
        Err(AuthError::InsufficientRole)
    }
}

/// Require a verified membership in `organization_id` with one of `allowed` roles.
///
/// Platform administrators pass unconditionally.
pub fn require_org_role(
    claims: &AccessClaims,
    organization_id: OrganizationId,
    allowed: &[OrgRole],
) -> Result<(), AuthError> {
    if claims.is_platform_admin() {
        return Ok(());
    }

    let permitted = claims
        .membership(organization_id)
        .is_some_and(|m| m.verified && allowed.contains(&m.role));

    if permitted {
        Ok(())
    } else {
        tracing::debug!(
            user_id = %claims.sub,
            organization_id = %organization_id,
            "Organization role guard denied"
        );
        Err(AuthError::InsufficientRole)
    }
}
