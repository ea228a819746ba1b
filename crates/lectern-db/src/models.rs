//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, Utc};
use lectern_types::{
    BatchId, CourseId, LessonId, MembershipClaim, OrgRole, OrganizationId, Role,
    RotationTokenId, SessionInfo, UserId,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// User row from the database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: String,
    pub active: bool,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub premium: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Typed user ID
    pub fn user_id(&self) -> UserId {
        UserId(self.id)
    }

    /// Parsed global role
    pub fn role(&self) -> DbResult<Role> {
        self.role
            .parse()
            .map_err(|e: lectern_types::ParseError| DbError::Decode(e.to_string()))
    }
}

/// Rotation token row from the database
#[derive(Debug, Clone, FromRow)]
pub struct RotationTokenRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RotationTokenRow {
    /// Whether the token is past its validity window
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Owner-facing view (never includes the hash)
    pub fn session_info(&self) -> SessionInfo {
        SessionInfo {
            id: RotationTokenId(self.id),
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}

/// Organization row from the database
#[derive(Debug, Clone, FromRow)]
pub struct OrganizationRow {
    pub id: Uuid,
    pub name: String,
    pub email_domain: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl OrganizationRow {
    /// Typed organization ID
    pub fn organization_id(&self) -> OrganizationId {
        OrganizationId(self.id)
    }
}

/// Organization membership row from the database
#[derive(Debug, Clone, FromRow)]
pub struct MembershipRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub batch_id: Option<Uuid>,
    pub role: String,
    pub verified: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Membership joined with its organization, used for token snapshots
#[derive(Debug, Clone, FromRow)]
pub struct MembershipDetailRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub organization_name: String,
    pub organization_active: bool,
    pub batch_id: Option<Uuid>,
    pub role: String,
    pub verified: bool,
    pub active: bool,
}

impl MembershipDetailRow {
    /// Convert to the snapshot form embedded in access tokens
    pub fn to_claim(&self) -> DbResult<MembershipClaim> {
        let role: OrgRole = self
            .role
            .parse()
            .map_err(|e: lectern_types::ParseError| DbError::Decode(e.to_string()))?;
        Ok(MembershipClaim {
            id: self.id,
            organization_id: OrganizationId(self.organization_id),
            organization_name: self.organization_name.clone(),
            role,
            verified: self.verified,
            batch_id: self.batch_id.map(BatchId),
        })
    }
}

/// Roster record (pre-provisioned seat) row from the database
#[derive(Debug, Clone, FromRow)]
pub struct RosterRecordRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub enrollment_code: String,
    pub batch_id: Option<Uuid>,
    pub claimed: bool,
    pub claimed_by: Option<Uuid>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Lesson joined with its module's course, as needed by access checks
#[derive(Debug, Clone, FromRow)]
pub struct LessonAccessRow {
    pub lesson_id: Uuid,
    pub is_free: bool,
    pub course_id: Uuid,
    pub course_published: bool,
}

impl LessonAccessRow {
    /// Typed lesson ID
    pub fn lesson_id(&self) -> LessonId {
        LessonId(self.lesson_id)
    }

    /// Typed course ID
    pub fn course_id(&self) -> CourseId {
        CourseId(self.course_id)
    }
}
