//! Enrollment fan-out
//!
//! Expands grant events into per-principal enrollment rows. Every write is an
//! independent insert-if-absent keyed on (principal, course), so a fan-out that
//! stops partway is safe to re-run from the start. There is no
//! enclosing transaction.

use lectern_db::{
    CatalogRepository, CourseGrantRepository, EnrollmentRepository, MembershipRepository,
    OrganizationRepository, Store, UserRepository,
};
use lectern_types::{AccessSource, BatchId, CourseId, OrganizationId, UserId};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::AuthError;

/// Who a fan-out targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanoutScope {
    /// Verified, active members of an organization (institutional source)
    Organization(OrganizationId),
    /// Verified, active members of a batch (institutional source)
    Batch(BatchId),
    /// One paying subscriber across the published catalog (individual source)
    Global(UserId),
}

/// Outcome of one fan-out run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FanoutReport {
    /// (principal, course) pairs considered
    pub targeted: usize,
    /// Rows actually inserted
    pub created: usize,
    /// Pairs whose insert failed
    pub failed: usize,
}

impl FanoutReport {
    /// Whether every targeted pair now has an enrollment
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }

    /// Accumulate another run into this one
    pub fn merge(&mut self, other: FanoutReport) {
        self.targeted += other.targeted;
        self.created += other.created;
        self.failed += other.failed;
    }
}

/// Materializes enrollments from grants and subscriptions
#[derive(Clone)]
pub struct EnrollmentFanout<S: Store> {
    store: Arc<S>,
}

impl<S: Store> EnrollmentFanout<S> {
    /// Create a new fan-out service
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Fan a scope out into enrollments.
    ///
    /// With `course` set, only that course is materialized. Without it, every
    /// course the scope is owed: the organization's or batch's grants, or the
    /// whole published catalog for `Global`.
    pub async fn fan_out(
        &self,
        scope: FanoutScope,
        course: Option<CourseId>,
    ) -> Result<FanoutReport, AuthError> {
        let (members, source) = match scope {
            FanoutScope::Organization(org) => (
                self.store
                    .memberships()
                    .verified_members_of_organization(org.0)
                    .await?,
                AccessSource::Institutional,
            ),
            FanoutScope::Batch(batch) => (
                self.store.memberships().verified_members_of_batch(batch.0).await?,
                AccessSource::Institutional,
            ),
            FanoutScope::Global(user) => (vec![user.0], AccessSource::Individual),
        };

        let courses = match course {
            Some(course) => vec![course.0],
            None => match scope {
                FanoutScope::Organization(org) => {
                    self.store.grants().courses_for_organization(org.0).await?
                }
                FanoutScope::Batch(batch) => self.store.grants().courses_for_batch(batch.0).await?,
                FanoutScope::Global(_) => self.store.catalog().published_course_ids().await?,
            },
        };

        let report = self.materialize(&members, &courses, source).await;
        tracing::info!(
            scope = ?scope,
            targeted = report.targeted,
            created = report.created,
            failed = report.failed,
            "Fan-out finished"
        );
        Ok(report)
    }

    /// Grant a course to an organization and enroll its verified members.
    ///
    /// An unknown course or organization is `NotFound`.
    pub async fn grant_org_course(
        &self,
        organization_id: OrganizationId,
        course_id: CourseId,
    ) -> Result<FanoutReport, AuthError> {
        let created = self
            .store
            .grants()
            .grant_to_organization(organization_id.0, course_id.0)
            .await?;
        tracing::info!(organization_id = %organization_id, course_id = %course_id, created, "Granted course to organization");
        // Fan out even when the grant already existed: it finishes an earlier partial run.
        self.fan_out(FanoutScope::Organization(organization_id), Some(course_id))
            .await
    }

    /// Remove an organization grant. Existing enrollments are kept.
    pub async fn revoke_org_course(
        &self,
        organization_id: OrganizationId,
        course_id: CourseId,
    ) -> Result<bool, AuthError> {
        let removed = self
            .store
            .grants()
            .revoke_from_organization(organization_id.0, course_id.0)
            .await?;
        tracing::info!(organization_id = %organization_id, course_id = %course_id, removed, "Revoked organization course grant");
        Ok(removed)
    }

    /// Grant a course to a batch and enroll its verified members.
    ///
    /// An unknown course or batch is `NotFound`.
    pub async fn grant_batch_course(
        &self,
        batch_id: BatchId,
        course_id: CourseId,
    ) -> Result<FanoutReport, AuthError> {
        let created = self
            .store
            .grants()
            .grant_to_batch(batch_id.0, course_id.0)
            .await?;
        tracing::info!(batch_id = %batch_id, course_id = %course_id, created, "Granted course to batch");
        self.fan_out(FanoutScope::Batch(batch_id), Some(course_id)).await
    }

    /// Remove a batch grant. Existing enrollments are kept.
    pub async fn revoke_batch_course(
        &self,
        batch_id: BatchId,
        course_id: CourseId,
    ) -> Result<bool, AuthError> {
        let removed = self
            .store
            .grants()
            .revoke_from_batch(batch_id.0, course_id.0)
            .await?;
        tracing::info!(batch_id = %batch_id, course_id = %course_id, removed, "Revoked batch course grant");
        Ok(removed)
    }

    /// Check that a batch named under an organization really belongs to it.
    ///
    /// A foreign batch reads as `NotFound`, the same as a missing one.
    pub async fn batch_in_organization(
        &self,
        organization_id: OrganizationId,
        batch_id: BatchId,
    ) -> Result<BatchId, AuthError> {
        if self
            .store
            .organizations()
            .owns_batch(organization_id.0, batch_id.0)
            .await?
        {
            Ok(batch_id)
        } else {
            Err(AuthError::NotFound)
        }
    }

    /// Mark a principal premium and enroll them in every published course.
    ///
    /// The premium flag is the payment's effect and stands on its own. A
    /// fan-out that cannot run is logged and reported as `None`; it is never
    /// allowed to fail the activation.
    pub async fn activate_subscription(
        &self,
        user_id: UserId,
    ) -> Result<Option<FanoutReport>, AuthError> {
        if self.store.users().find_by_id(user_id.0).await?.is_none() {
            return Err(AuthError::NotFound);
        }

        self.store.users().set_premium(user_id.0, true).await?;
        tracing::info!(user_id = %user_id, "Activated subscription");

        match self.fan_out(FanoutScope::Global(user_id), None).await {
            Ok(report) => Ok(Some(report)),
            Err(e) => {
                metrics::counter!("lectern_fanout_failures_total").increment(1);
                tracing::error!(user_id = %user_id, error = %e, "Subscription fan-out failed; safe to retry");
                Ok(None)
            }
        }
    }

    /// Enroll one member into everything granted to their organization and batch
    pub async fn enroll_member(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
        batch_id: Option<BatchId>,
    ) -> Result<FanoutReport, AuthError> {
        let mut courses = self
            .store
            .grants()
            .courses_for_organization(organization_id.0)
            .await?;
        if let Some(batch) = batch_id {
            for course in self.store.grants().courses_for_batch(batch.0).await? {
                if !courses.contains(&course) {
                    courses.push(course);
                }
            }
        }

        let report = self
            .materialize(&[user_id.0], &courses, AccessSource::Institutional)
            .await;
        tracing::info!(
            user_id = %user_id,
            organization_id = %organization_id,
            created = report.created,
            failed = report.failed,
            "Enrolled member in granted courses"
        );
        Ok(report)
    }

    async fn materialize(
        &self,
        users: &[Uuid],
        courses: &[Uuid],
        source: AccessSource,
    ) -> FanoutReport {
        let mut report = FanoutReport::default();
        for course in courses {
            for user in users {
                report.targeted += 1;
                match self
                    .store
                    .enrollments()
                    .insert_if_absent(*user, *course, source.as_str())
                    .await
                {
                    Ok(true) => {
                        report.created += 1;
                        metrics::counter!("lectern_enrollments_created_total", "source" => source.as_str())
                            .increment(1);
                    }
                    Ok(false) => {}
                    Err(e) => {
                        report.failed += 1;
                        metrics::counter!("lectern_fanout_failures_total").increment(1);
                        tracing::warn!(user_id = %user, course_id = %course, error = %e, "Enrollment insert failed");
                    }
                }
            }
        }
        report
    }
}

impl<S: Store> std::fmt::Debug for EnrollmentFanout<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrollmentFanout").finish_non_exhaustive()
    }
}
