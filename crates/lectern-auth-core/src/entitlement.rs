//! Entitlement resolution
//!
//! Answers "can principal P read resource R". Results are never cached: a
//! grant must be usable the instant it is written.

use lectern_db::{
    CatalogRepository, EnrollmentRepository, LessonAccessRow, MembershipRepository, Store,
};
use lectern_types::{AccessDecision, CourseId, DenialReason, GrantPath, LessonId, UserId};
use std::sync::Arc;

use crate::AuthError;

/// Entitlement resolver over the enrollment and membership grant paths
#[derive(Clone)]
pub struct EntitlementResolver<S: Store> {
    store: Arc<S>,
}

impl<S: Store> EntitlementResolver<S> {
    /// Create a new entitlement resolver
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Course-level check.
    ///
    /// Granted if a materialized enrollment exists **or** the principal holds a
    /// verified, active membership in an active organization. Both lookups run
    /// concurrently.
    pub async fn can_access_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<AccessDecision, AuthError> {
        let (enrolled, member) = tokio::try_join!(
            self.store.enrollments().exists(user_id.0, course_id.0),
            self.store
                .memberships()
                .has_verified_active_membership(user_id.0),
        )?;

        let decision = if enrolled {
            AccessDecision::granted(GrantPath::Enrollment)
        } else if member {
            AccessDecision::granted(GrantPath::Membership)
        } else {
            AccessDecision::denied(DenialReason::NoSubscription)
        };

        record(&decision);
        Ok(decision)
    }

    /// Lesson-level check for an authenticated or anonymous caller
    pub async fn can_access_lesson(
        &self,
        user_id: Option<UserId>,
        lesson_id: LessonId,
    ) -> Result<AccessDecision, AuthError> {
        match self.store.catalog().find_lesson_access(lesson_id.0).await? {
            Some(lesson) => self.can_access_loaded_lesson(user_id, &lesson).await,
            None => {
                let decision = AccessDecision::denied(DenialReason::NotFound);
                record(&decision);
                Ok(decision)
            }
        }
    }

    /// Lesson-level check for a lesson the caller already fetched.
    ///
    /// Order matters: the free flag is checked before anything else, then
    /// publication (an unpublished course reads as not found), then
    /// authentication, then the course-level check.
    pub async fn can_access_loaded_lesson(
        &self,
        user_id: Option<UserId>,
        lesson: &LessonAccessRow,
    ) -> Result<AccessDecision, AuthError> {
        let decision = if lesson.is_free {
            AccessDecision::granted(GrantPath::FreeLesson)
        } else if !lesson.course_published {
            AccessDecision::denied(DenialReason::NotFound)
        } else if let Some(user_id) = user_id {
            return self.can_access_course(user_id, lesson.course_id()).await;
        } else {
            AccessDecision::denied(DenialReason::Unauthenticated)
        };

        record(&decision);
        Ok(decision)
    }
}

impl<S: Store> std::fmt::Debug for EntitlementResolver<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitlementResolver").finish_non_exhaustive()
    }
}

fn record(decision: &AccessDecision) {
    let label = match decision.denial() {
        None => "granted",
        Some(reason) => reason.as_str(),
    };
    metrics::counter!("lectern_access_checks_total", "decision" => label).increment(1);
}
