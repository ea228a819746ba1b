//! Repository traits
//!
//! Define async repository interfaces for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>>;

    /// Find a user by (already case-folded) email
    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>>;

    /// Create a new user
    async fn create(&self, user: CreateUser) -> DbResult<UserRow>;

    /// Replace the password hash
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> DbResult<()>;

    /// Set the premium (paid subscription) flag
    async fn set_premium(&self, id: Uuid, premium: bool) -> DbResult<()>;
}

/// Create user input
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: String,
}

/// Rotation token repository trait
///
/// Rows are never updated after revocation. A revoked row is history that
/// reuse detection depends on.
#[async_trait]
pub trait RotationTokenRepository: Send + Sync {
    /// Store a new rotation token hash
    async fn create(&self, token: CreateRotationToken) -> DbResult<RotationTokenRow>;

    /// Find a token by hash, whatever its state (revoked and expired included)
    async fn find_by_token_hash(&self, token_hash: &str) -> DbResult<Option<RotationTokenRow>>;

    /// Find all non-revoked, unexpired tokens for a user
    async fn find_active_by_user_id(&self, user_id: Uuid) -> DbResult<Vec<RotationTokenRow>>;

    /// Atomically revoke a token if it is still active.
    ///
    /// Returns `true` only for the single caller that flipped the flag;
    /// concurrent callers observe `false`.
    async fn revoke_if_active(&self, id: Uuid) -> DbResult<bool>;

    /// Revoke every active token for a user
    async fn revoke_all_for_user(&self, user_id: Uuid) -> DbResult<u64>;

    /// Delete tokens past their expiry (revoked or not)
    async fn delete_expired(&self) -> DbResult<u64>;
}

/// Create rotation token input
#[derive(Debug, Clone)]
pub struct CreateRotationToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// Organization repository trait
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Find an organization by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<OrganizationRow>>;

    /// Find the active organization registered for an email domain
    async fn find_by_email_domain(&self, domain: &str) -> DbResult<Option<OrganizationRow>>;

    /// Whether the batch belongs to the organization
    async fn owns_batch(&self, organization_id: Uuid, batch_id: Uuid) -> DbResult<bool>;
}

/// Organization membership repository trait
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// All memberships of a user, joined with their organizations
    async fn find_details_for_user(&self, user_id: Uuid) -> DbResult<Vec<MembershipDetailRow>>;

    /// The membership of a user in one organization
    async fn find(&self, user_id: Uuid, organization_id: Uuid) -> DbResult<Option<MembershipRow>>;

    /// Whether the user holds a verified, active membership in an active organization
    async fn has_verified_active_membership(&self, user_id: Uuid) -> DbResult<bool>;

    /// IDs of verified, active members of an organization
    async fn verified_members_of_organization(&self, organization_id: Uuid) -> DbResult<Vec<Uuid>>;

    /// IDs of verified, active members of a batch
    async fn verified_members_of_batch(&self, batch_id: Uuid) -> DbResult<Vec<Uuid>>;
}

/// Roster record repository trait
#[async_trait]
pub trait RosterRepository: Send + Sync {
    /// Find an unclaimed record matching organization, email and enrollment code
    async fn find_unclaimed(
        &self,
        organization_id: Uuid,
        email: &str,
        enrollment_code: &str,
    ) -> DbResult<Option<RosterRecordRow>>;

    /// Find the record for an email in an organization, claimed or not
    async fn find_by_email(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> DbResult<Option<RosterRecordRow>>;

    /// Insert or refresh an unclaimed record keyed on (organization, email).
    ///
    /// Claimed records are left untouched.
    async fn upsert_unclaimed(&self, record: UpsertRosterRecord) -> DbResult<RosterUpsert>;

    /// Claim a seat and verify the matching membership as one transaction.
    ///
    /// The roster update is a conditional check-and-set; if another claimant
    /// got there first, nothing is written and `None` is returned.
    async fn claim_seat(&self, claim: ClaimSeat) -> DbResult<Option<MembershipRow>>;
}

/// Roster record upsert input
#[derive(Debug, Clone)]
pub struct UpsertRosterRecord {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub enrollment_code: String,
    pub batch_id: Option<Uuid>,
}

/// Outcome of a roster upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterUpsert {
    /// A new seat was created
    Created,
    /// An existing unclaimed seat was refreshed
    Updated,
    /// The seat is already claimed and was not modified
    AlreadyClaimed,
}

/// Seat claim input
#[derive(Debug, Clone)]
pub struct ClaimSeat {
    pub roster_record_id: Uuid,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub batch_id: Option<Uuid>,
}

/// Course grant repository trait
#[async_trait]
pub trait CourseGrantRepository: Send + Sync {
    /// Grant a course to an organization; returns `false` if already granted
    async fn grant_to_organization(&self, organization_id: Uuid, course_id: Uuid) -> DbResult<bool>;

    /// Remove an organization grant; returns `false` if none existed
    async fn revoke_from_organization(&self, organization_id: Uuid, course_id: Uuid)
        -> DbResult<bool>;

    /// Grant a course to a batch; returns `false` if already granted
    async fn grant_to_batch(&self, batch_id: Uuid, course_id: Uuid) -> DbResult<bool>;

    /// Remove a batch grant; returns `false` if none existed
    async fn revoke_from_batch(&self, batch_id: Uuid, course_id: Uuid) -> DbResult<bool>;

    /// Courses granted to an organization
    async fn courses_for_organization(&self, organization_id: Uuid) -> DbResult<Vec<Uuid>>;

    /// Courses granted to a batch
    async fn courses_for_batch(&self, batch_id: Uuid) -> DbResult<Vec<Uuid>>;
}

/// Enrollment repository trait
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Whether an enrollment exists for the pair
    async fn exists(&self, user_id: Uuid, course_id: Uuid) -> DbResult<bool>;

    /// Create the enrollment unless one already exists.
    ///
    /// Existing rows are left untouched (source and progress included).
    /// Returns `true` if a row was inserted.
    async fn insert_if_absent(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        access_source: &str,
    ) -> DbResult<bool>;
}

/// Catalog read-path repository trait
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Lesson with its course's publication state
    async fn find_lesson_access(&self, lesson_id: Uuid) -> DbResult<Option<LessonAccessRow>>;

    /// IDs of all published courses
    async fn published_course_ids(&self) -> DbResult<Vec<Uuid>>;
}

/// Every repository reachable through one handle.
///
/// Core services hold an `Arc<S: Store>` instead of one generic parameter per
/// table.
pub trait Store: Send + Sync + 'static {
    type Users: UserRepository;
    type RotationTokens: RotationTokenRepository;
    type Organizations: OrganizationRepository;
    type Memberships: MembershipRepository;
    type Roster: RosterRepository;
    type Grants: CourseGrantRepository;
    type Enrollments: EnrollmentRepository;
    type Catalog: CatalogRepository;

    fn users(&self) -> &Self::Users;
    fn rotation_tokens(&self) -> &Self::RotationTokens;
    fn organizations(&self) -> &Self::Organizations;
    fn memberships(&self) -> &Self::Memberships;
    fn roster(&self) -> &Self::Roster;
    fn grants(&self) -> &Self::Grants;
    fn enrollments(&self) -> &Self::Enrollments;
    fn catalog(&self) -> &Self::Catalog;
}
