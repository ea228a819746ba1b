//! PostgreSQL repository implementations

mod catalog;
mod course_grant;
mod enrollment;
mod membership;
mod organization;
mod roster;
mod rotation_token;
mod user;

pub use catalog::PgCatalogRepository;
pub use course_grant::PgCourseGrantRepository;
pub use enrollment::PgEnrollmentRepository;
pub use membership::PgMembershipRepository;
pub use organization::PgOrganizationRepository;
pub use roster::PgRosterRepository;
pub use rotation_token::PgRotationTokenRepository;
pub use user::PgUserRepository;

use crate::repo::Store;
use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub users: PgUserRepository,
    pub rotation_tokens: PgRotationTokenRepository,
    pub organizations: PgOrganizationRepository,
    pub memberships: PgMembershipRepository,
    pub roster: PgRosterRepository,
    pub grants: PgCourseGrantRepository,
    pub enrollments: PgEnrollmentRepository,
    pub catalog: PgCatalogRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            rotation_tokens: PgRotationTokenRepository::new(pool.clone()),
            organizations: PgOrganizationRepository::new(pool.clone()),
            memberships: PgMembershipRepository::new(pool.clone()),
            roster: PgRosterRepository::new(pool.clone()),
            grants: PgCourseGrantRepository::new(pool.clone()),
            enrollments: PgEnrollmentRepository::new(pool.clone()),
            catalog: PgCatalogRepository::new(pool),
        }
    }
}

impl Store for Repositories {
    type Users = PgUserRepository;
    type RotationTokens = PgRotationTokenRepository;
    type Organizations = PgOrganizationRepository;
    type Memberships = PgMembershipRepository;
    type Roster = PgRosterRepository;
    type Grants = PgCourseGrantRepository;
    type Enrollments = PgEnrollmentRepository;
    type Catalog = PgCatalogRepository;

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
