//! In-memory repositories for testing
//!
//! All repositories share one set of tables so cross-table operations (the
//! seat claim) see a consistent picture. Conditional updates take the DashMap
//! shard lock for the row, which gives the same one-winner guarantee as the
//! datastore's `UPDATE ... WHERE NOT revoked`.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use lectern_db::{
    CatalogRepository, ClaimSeat, CourseGrantRepository, CreateRotationToken, CreateUser, DbError,
    DbResult, EnrollmentRepository, LessonAccessRow, MembershipDetailRow,
    MembershipRepository, MembershipRow, OrganizationRepository, OrganizationRow,
    RosterRecordRow, RosterRepository, RosterUpsert, RotationTokenRepository, RotationTokenRow,
    Store, UpsertRosterRecord, UserRepository, UserRow,
};
use lectern_types::{AccessSource, BatchId, CourseId, LessonId, OrgRole, OrganizationId, Role, UserId};
use std::sync::Arc;
use uuid::Uuid;

/// Materialized enrollment with the progress a learner accumulates
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct EnrollmentRecord {
    pub access_source: String,
    pub completed_lessons: i32,
    pub progress_percent: i16,
    pub enrolled_at: DateTime<Utc>,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

#[allow(dead_code)]
impl EnrollmentRecord {
    pub fn access_source(&self) -> Result<AccessSource, lectern_types::ParseError> {
        self.access_source.parse()
    }
}

#[derive(Default)]
struct Tables {
    users: DashMap<Uuid, UserRow>,
    tokens: DashMap<Uuid, RotationTokenRow>,
    organizations: DashMap<Uuid, OrganizationRow>,
    /// batch -> organization
    batches: DashMap<Uuid, Uuid>,
    /// Keyed on (user, organization)
    memberships: DashMap<(Uuid, Uuid), MembershipRow>,
    roster: DashMap<Uuid, RosterRecordRow>,
    /// (organization, email) -> roster record id
    roster_index: DashMap<(Uuid, String), Uuid>,
    org_grants: DashMap<(Uuid, Uuid), ()>,
    batch_grants: DashMap<(Uuid, Uuid), ()>,
    /// Keyed on (user, course)
    enrollments: DashMap<(Uuid, Uuid), EnrollmentRecord>,
    /// course -> published
    courses: DashMap<Uuid, bool>,
    /// lesson -> (is_free, course)
    lessons: DashMap<Uuid, (bool, Uuid)>,
    /// Courses whose enrollment inserts fail
    failing_courses: DashMap<Uuid, ()>,
}

/// In-memory user repository
#[derive(Clone)]
pub struct MockUserRepository(Arc<Tables>);

/// In-memory rotation token repository
#[derive(Clone)]
pub struct MockRotationTokenRepository(Arc<Tables>);

/// In-memory organization repository
#[derive(Clone)]
pub struct MockOrganizationRepository(Arc<Tables>);

/// In-memory membership repository
#[derive(Clone)]
pub struct MockMembershipRepository(Arc<Tables>);

/// In-memory roster repository
#[derive(Clone)]
pub struct MockRosterRepository(Arc<Tables>);

/// In-memory course grant repository
#[derive(Clone)]
pub struct MockCourseGrantRepository(Arc<Tables>);

/// In-memory enrollment repository
#[derive(Clone)]
pub struct MockEnrollmentRepository(Arc<Tables>);

/// In-memory catalog repository
#[derive(Clone)]
pub struct MockCatalogRepository(Arc<Tables>);

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        Ok(self.0.users.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        Ok(self
            .0
            .users
            .iter()
            .find(|r| r.email == email)
            .map(|r| r.value().clone()))
    }

    async fn create(&self, user: CreateUser) -> DbResult<UserRow> {
        let row = UserRow {
            id: user.id,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            active: true,
            email_verified_at: None,
            premium: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.0.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> DbResult<()> {
        if let Some(mut user) = self.0.users.get_mut(&id) {
            user.password_hash = Some(password_hash.to_string());
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_premium(&self, id: Uuid, premium: bool) -> DbResult<()> {
        if let Some(mut user) = self.0.users.get_mut(&id) {
            user.premium = premium;
        }
        Ok(())
    }
}

#[async_trait]
impl RotationTokenRepository for MockRotationTokenRepository {
    async fn create(&self, token: CreateRotationToken) -> DbResult<RotationTokenRow> {
        let row = RotationTokenRow {
            id: token.id,
            user_id: token.user_id,
            token_hash: token.token_hash,
            created_at: Utc::now(),
            expires_at: token.expires_at,
            revoked: false,
            revoked_at: None,
        };
        self.0.tokens.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> DbResult<Option<RotationTokenRow>> {
        Ok(self
            .0
            .tokens
            .iter()
            .find(|r| r.token_hash == token_hash)
            .map(|r| r.value().clone()))
    }

    async fn find_active_by_user_id(&self, user_id: Uuid) -> DbResult<Vec<RotationTokenRow>> {
        let now = Utc::now();
        Ok(self
            .0
            .tokens
            .iter()
            .filter(|r| r.user_id == user_id && !r.revoked && r.expires_at > now)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn revoke_if_active(&self, id: Uuid) -> DbResult<bool> {
        if let Some(mut token) = self.0.tokens.get_mut(&id) {
            if !token.revoked {
                token.revoked = true;
                token.revoked_at = Some(Utc::now());
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> DbResult<u64> {
        let mut count = 0;
        for mut token in self.0.tokens.iter_mut() {
            if token.user_id == user_id && !token.revoked {
                token.revoked = true;
                token.revoked_at = Some(Utc::now());
                count += 1;
            }
        }
        Ok(count)
    }

    async fn delete_expired(&self) -> DbResult<u64> {
        let now = Utc::now();
        let before = self.0.tokens.len();
        self.0.tokens.retain(|_, t| t.expires_at >= now);
        Ok(before.saturating_sub(self.0.tokens.len()) as u64)
    }
}

#[async_trait]
impl OrganizationRepository for MockOrganizationRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<OrganizationRow>> {
        Ok(self.0.organizations.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_email_domain(&self, domain: &str) -> DbResult<Option<OrganizationRow>> {
        Ok(self
            .0
            .organizations
            .iter()
            .find(|o| {
                o.active
                    && o
                        .email_domain
                        .as_deref()
                        .is_some_and(|d| d.eq_ignore_ascii_case(domain))
            })
            .map(|r| r.value().clone()))
    }

    async fn owns_batch(&self, organization_id: Uuid, batch_id: Uuid) -> DbResult<bool> {
        Ok(self
            .0
            .batches
            .get(&batch_id)
            .is_some_and(|org| *org == organization_id))
    }
}

impl MockMembershipRepository {
    fn organization_active(&self, organization_id: Uuid) -> bool {
        self.0
            .organizations
            .get(&organization_id)
            .is_some_and(|o| o.active)
    }
}

#[async_trait]
impl MembershipRepository for MockMembershipRepository {
    async fn find_details_for_user(&self, user_id: Uuid) -> DbResult<Vec<MembershipDetailRow>> {
        let rows: Vec<MembershipRow> = self
            .0
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id && m.active)
            .map(|m| m.value().clone())
            .collect();

        Ok(rows
            .into_iter()
            .filter_map(|m| {
                let org = self.0.organizations.get(&m.organization_id)?;
                Some(MembershipDetailRow {
                    id: m.id,
                    user_id: m.user_id,
                    organization_id: m.organization_id,
                    organization_name: org.name.clone(),
                    organization_active: org.active,
                    batch_id: m.batch_id,
                    role: m.role,
                    verified: m.verified,
                    active: m.active,
                })
            })
            .collect())
    }

    async fn find(&self, user_id: Uuid, organization_id: Uuid) -> DbResult<Option<MembershipRow>> {
        Ok(self
            .0
            .memberships
            .get(&(user_id, organization_id))
            .map(|r| r.value().clone()))
    }

    async fn has_verified_active_membership(&self, user_id: Uuid) -> DbResult<bool> {
        let candidates: Vec<Uuid> = self
            .0
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id && m.verified && m.active)
            .map(|m| m.organization_id)
            .collect();
        Ok(candidates.into_iter().any(|org| self.organization_active(org)))
    }

    async fn verified_members_of_organization(&self, organization_id: Uuid) -> DbResult<Vec<Uuid>> {
        Ok(self
            .0
            .memberships
            .iter()
            .filter(|m| m.organization_id == organization_id && m.verified && m.active)
            .map(|m| m.user_id)
            .collect())
    }

    async fn verified_members_of_batch(&self, batch_id: Uuid) -> DbResult<Vec<Uuid>> {
        Ok(self
            .0
            .memberships
            .iter()
            .filter(|m| m.batch_id == Some(batch_id) && m.verified && m.active)
            .map(|m| m.user_id)
            .collect())
    }
}

#[async_trait]
impl RosterRepository for MockRosterRepository {
    async fn find_unclaimed(
        &self,
        organization_id: Uuid,
        email: &str,
        enrollment_code: &str,
    ) -> DbResult<Option<RosterRecordRow>> {
        Ok(self
            .find_by_email(organization_id, email)
            .await?
            .filter(|r| !r.claimed && r.enrollment_code == enrollment_code))
    }

    async fn find_by_email(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> DbResult<Option<RosterRecordRow>> {
        let id = self
            .0
            .roster_index
            .get(&(organization_id, email.to_string()))
            .map(|r| *r.value());
        Ok(id.and_then(|id| self.0.roster.get(&id).map(|r| r.value().clone())))
    }

    async fn upsert_unclaimed(&self, record: UpsertRosterRecord) -> DbResult<RosterUpsert> {
        if let Some(batch_id) = record.batch_id {
            if self.0.batches.get(&batch_id).map(|org| *org) != Some(record.organization_id) {
                return Err(DbError::NotFound);
            }
        }
        let key = (record.organization_id, record.email.clone());
        match self.0.roster_index.entry(key) {
            Entry::Occupied(existing) => {
                let Some(mut row) = self.0.roster.get_mut(existing.get()) else {
                    return Err(DbError::NotFound);
                };
                if row.claimed {
                    return Ok(RosterUpsert::AlreadyClaimed);
                }
                row.full_name = record.full_name;
                row.enrollment_code = record.enrollment_code;
                row.batch_id = record.batch_id;
                Ok(RosterUpsert::Updated)
            }
            Entry::Vacant(slot) => {
                slot.insert(record.id);
                self.0.roster.insert(
                    record.id,
                    RosterRecordRow {
                        id: record.id,
                        organization_id: record.organization_id,
                        email: record.email,
                        full_name: record.full_name,
                        enrollment_code: record.enrollment_code,
                        batch_id: record.batch_id,
                        claimed: false,
                        claimed_by: None,
                        claimed_at: None,
                        created_at: Utc::now(),
                    },
                );
                Ok(RosterUpsert::Created)
            }
        }
    }

    async fn claim_seat(&self, claim: ClaimSeat) -> DbResult<Option<MembershipRow>> {
        {
            let Some(mut seat) = self.0.roster.get_mut(&claim.roster_record_id) else {
                return Ok(None);
            };
            if seat.claimed {
                return Ok(None);
            }
            seat.claimed = true;
            seat.claimed_by = Some(claim.user_id);
            seat.claimed_at = Some(Utc::now());
        }

        let now = Utc::now();
        let membership = self
            .0
            .memberships
            .entry((claim.user_id, claim.organization_id))
            .and_modify(|m| {
                m.verified = true;
                m.active = true;
                m.batch_id = claim.batch_id.or(m.batch_id);
                m.updated_at = now;
            })
            .or_insert_with(|| MembershipRow {
                id: Uuid::new_v4(),
                user_id: claim.user_id,
                organization_id: claim.organization_id,
                batch_id: claim.batch_id,
                role: OrgRole::Student.as_str().to_string(),
                verified: true,
                active: true,
                created_at: now,
                updated_at: now,
            })
            .value()
            .clone();

        Ok(Some(membership))
    }
}

#[async_trait]
impl CourseGrantRepository for MockCourseGrantRepository {
    async fn grant_to_organization(&self, organization_id: Uuid, course_id: Uuid) -> DbResult<bool> {
        if !self.0.organizations.contains_key(&organization_id)
            || !self.0.courses.contains_key(&course_id)
        {
            return Err(DbError::NotFound);
        }
        Ok(self.0.org_grants.insert((organization_id, course_id), ()).is_none())
    }

    async fn revoke_from_organization(
        &self,
        organization_id: Uuid,
        course_id: Uuid,
    ) -> DbResult<bool> {
        Ok(self.0.org_grants.remove(&(organization_id, course_id)).is_some())
    }

    async fn grant_to_batch(&self, batch_id: Uuid, course_id: Uuid) -> DbResult<bool> {
        if !self.0.batches.contains_key(&batch_id) || !self.0.courses.contains_key(&course_id) {
            return Err(DbError::NotFound);
        }
        Ok(self.0.batch_grants.insert((batch_id, course_id), ()).is_none())
    }

    async fn revoke_from_batch(&self, batch_id: Uuid, course_id: Uuid) -> DbResult<bool> {
        Ok(self.0.batch_grants.remove(&(batch_id, course_id)).is_some())
    }

    async fn courses_for_organization(&self, organization_id: Uuid) -> DbResult<Vec<Uuid>> {
        Ok(self
            .0
            .org_grants
            .iter()
            .filter(|g| g.key().0 == organization_id)
            .map(|g| g.key().1)
            .collect())
    }

    async fn courses_for_batch(&self, batch_id: Uuid) -> DbResult<Vec<Uuid>> {
        Ok(self
            .0
            .batch_grants
            .iter()
            .filter(|g| g.key().0 == batch_id)
            .map(|g| g.key().1)
            .collect())
    }
}

#[async_trait]
impl EnrollmentRepository for MockEnrollmentRepository {
    async fn exists(&self, user_id: Uuid, course_id: Uuid) -> DbResult<bool> {
        Ok(self.0.enrollments.contains_key(&(user_id, course_id)))
    }

    async fn insert_if_absent(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        access_source: &str,
    ) -> DbResult<bool> {
        if self.0.failing_courses.contains_key(&course_id) {
            return Err(DbError::Decode("injected enrollment failure".to_string()));
        }

        match self.0.enrollments.entry((user_id, course_id)) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(EnrollmentRecord {
                    access_source: access_source.to_string(),
                    completed_lessons: 0,
                    progress_percent: 0,
                    enrolled_at: Utc::now(),
                    last_accessed_at: None,
                });
                Ok(true)
            }
        }
    }
}

#[async_trait]
impl CatalogRepository for MockCatalogRepository {
    async fn find_lesson_access(&self, lesson_id: Uuid) -> DbResult<Option<LessonAccessRow>> {
        let Some((is_free, course_id)) = self.0.lessons.get(&lesson_id).map(|r| *r.value()) else {
            return Ok(None);
        };
        let course_published = self.0.courses.get(&course_id).is_some_and(|p| *p);
        Ok(Some(LessonAccessRow {
            lesson_id,
            is_free,
            course_id,
            course_published,
        }))
    }

    async fn published_course_ids(&self) -> DbResult<Vec<Uuid>> {
        Ok(self
            .0
            .courses
            .iter()
            .filter(|c| *c.value())
            .map(|c| *c.key())
            .collect())
    }
}

/// In-memory store bundling every mock repository over shared tables
#[derive(Clone)]
pub struct MockStore {
    tables: Arc<Tables>,
    users: MockUserRepository,
    rotation_tokens: MockRotationTokenRepository,
    organizations: MockOrganizationRepository,
    memberships: MockMembershipRepository,
    roster: MockRosterRepository,
    grants: MockCourseGrantRepository,
    enrollments: MockEnrollmentRepository,
    catalog: MockCatalogRepository,
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl MockStore {
    pub fn new() -> Self {
        let tables = Arc::new(Tables::default());
        Self {
            users: MockUserRepository(Arc::clone(&tables)),
            rotation_tokens: MockRotationTokenRepository(Arc::clone(&tables)),
            organizations: MockOrganizationRepository(Arc::clone(&tables)),
            memberships: MockMembershipRepository(Arc::clone(&tables)),
            roster: MockRosterRepository(Arc::clone(&tables)),
            grants: MockCourseGrantRepository(Arc::clone(&tables)),
            enrollments: MockEnrollmentRepository(Arc::clone(&tables)),
            catalog: MockCatalogRepository(Arc::clone(&tables)),
            tables,
        }
    }

    /// Insert a user with an optional password
    pub fn add_user(&self, email: &str, password: Option<&str>, role: Role) -> UserRow {
        let row = UserRow {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password.map(|p| lectern_auth_core::hash_password(p).unwrap()),
            role: role.as_str().to_string(),
            active: true,
            email_verified_at: None,
            premium: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.tables.users.insert(row.id, row.clone());
        row
    }

    pub fn user(&self, id: UserId) -> UserRow {
        self.tables.users.get(&id.0).unwrap().clone()
    }

    pub fn set_user_active(&self, id: UserId, active: bool) {
        self.tables.users.get_mut(&id.0).unwrap().active = active;
    }

    /// Insert an active organization
    pub fn add_organization(&self, name: &str, email_domain: &str) -> OrganizationId {
        let id = Uuid::new_v4();
        self.tables.organizations.insert(
            id,
            OrganizationRow {
                id,
                name: name.to_string(),
                email_domain: Some(email_domain.to_string()),
                active: true,
                created_at: Utc::now(),
            },
        );
        OrganizationId(id)
    }

    pub fn add_batch(&self, organization: OrganizationId) -> BatchId {
        let id = BatchId::new();
        self.tables.batches.insert(id.0, organization.0);
        id
    }

    pub fn set_organization_active(&self, id: OrganizationId, active: bool) {
        self.tables.organizations.get_mut(&id.0).unwrap().active = active;
    }

    /// Insert or replace a membership
    pub fn add_membership(
        &self,
        user: UserId,
        organization: OrganizationId,
        batch: Option<BatchId>,
        role: OrgRole,
        verified: bool,
        active: bool,
    ) {
        let now = Utc::now();
        self.tables.memberships.insert(
            (user.0, organization.0),
            MembershipRow {
                id: Uuid::new_v4(),
                user_id: user.0,
                organization_id: organization.0,
                batch_id: batch.map(|b| b.0),
                role: role.as_str().to_string(),
                verified,
                active,
                created_at: now,
                updated_at: now,
            },
        );
    }

    pub fn membership(&self, user: UserId, organization: OrganizationId) -> Option<MembershipRow> {
        self.tables
            .memberships
            .get(&(user.0, organization.0))
            .map(|m| m.value().clone())
    }

    pub fn add_course(&self, published: bool) -> CourseId {
        let id = Uuid::new_v4();
        self.tables.courses.insert(id, published);
        CourseId(id)
    }

    pub fn add_lesson(&self, course: CourseId, is_free: bool) -> LessonId {
        let id = Uuid::new_v4();
        self.tables.lessons.insert(id, (is_free, course.0));
        LessonId(id)
    }

    /// Insert an unclaimed roster seat
    pub fn add_roster_record(
        &self,
        organization: OrganizationId,
        email: &str,
        enrollment_code: &str,
        batch: Option<BatchId>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.tables
            .roster_index
            .insert((organization.0, email.to_string()), id);
        self.tables.roster.insert(
            id,
            RosterRecordRow {
                id,
                organization_id: organization.0,
                email: email.to_string(),
                full_name: "Roster Student".to_string(),
                enrollment_code: enrollment_code.to_string(),
                batch_id: batch.map(|b| b.0),
                claimed: false,
                claimed_by: None,
                claimed_at: None,
                created_at: Utc::now(),
            },
        );
        id
    }

    pub fn roster_record(&self, id: Uuid) -> RosterRecordRow {
        self.tables.roster.get(&id).unwrap().clone()
    }

    pub fn grant_org_course(&self, organization: OrganizationId, course: CourseId) {
        self.tables.org_grants.insert((organization.0, course.0), ());
    }

    pub fn enrollment(&self, user: UserId, course: CourseId) -> Option<EnrollmentRecord> {
        self.tables
            .enrollments
            .get(&(user.0, course.0))
            .map(|e| e.value().clone())
    }

    pub fn record_progress(
        &self,
        user: UserId,
        course: CourseId,
        completed_lessons: i32,
        progress_percent: i16,
    ) {
        let mut row = self.tables.enrollments.get_mut(&(user.0, course.0)).unwrap();
        row.completed_lessons = completed_lessons;
        row.progress_percent = progress_percent;
        row.last_accessed_at = Some(Utc::now());
    }

    pub fn enrollment_count(&self) -> usize {
        self.tables.enrollments.len()
    }

    pub fn fail_enrollments_for(&self, course: CourseId) {
        self.tables.failing_courses.insert(course.0, ());
    }

    pub fn heal_enrollments_for(&self, course: CourseId) {
        self.tables.failing_courses.remove(&course.0);
    }

    pub fn tokens_for(&self, user: UserId) -> Vec<RotationTokenRow> {
        self.tables
            .tokens
            .iter()
            .filter(|t| t.user_id == user.0)
            .map(|t| t.value().clone())
            .collect()
    }

    /// Move a token's revocation time into the past
    pub fn backdate_revocation(&self, token_hash: &str, by: Duration) {
        for mut token in self.tables.tokens.iter_mut() {
            if token.token_hash == token_hash {
                token.revoked_at = token.revoked_at.map(|at| at - by);
            }
        }
    }

    /// Move a token's expiry into the past
    pub fn expire_token(&self, token_hash: &str) {
        for mut token in self.tables.tokens.iter_mut() {
            if token.token_hash == token_hash {
                token.expires_at = Utc::now() - Duration::seconds(1);
            }
        }
    }
}

impl Store for MockStore {
    type Users = MockUserRepository;
    type RotationTokens = MockRotationTokenRepository;
    type Organizations = MockOrganizationRepository;
    type Memberships = MockMembershipRepository;
    type Roster = MockRosterRepository;
    type Grants = MockCourseGrantRepository;
    type Enrollments = MockEnrollmentRepository;
    type Catalog = MockCatalogRepository;

    fn users(&self) -> &Self::Users {
        &self.users
    }

    fn rotation_tokens(&self) -> &Self::RotationTokens {
        &self.rotation_tokens
    }

    fn organizations(&self) -> &Self::Organizations {
        &self.organizations
    }

    fn memberships(&self) -> &Self::Memberships {
        &self.memberships
    }

    fn roster(&self) -> &Self::Roster {
        &self.roster
    }

    fn grants(&self) -> &Self::Grants {
        &self.grants
    }

    fn enrollments(&self) -> &Self::Enrollments {
        &self.enrollments
    }

    fn catalog(&self) -> &Self::Catalog {
        &self.catalog
    }
}
