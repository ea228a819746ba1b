//! Institutional identity claims and roster ingestion
//!
//! A claim binds an authenticated principal to a pre-provisioned roster seat
//! of the organization that owns their email domain. It is one-time and
//! irreversible: marking the seat claimed and verifying the membership commit
//! together, and the enrollment fan-out runs after that commit.

use lectern_db::{
    ClaimSeat, DbError, MembershipRepository, MembershipRow, OrganizationRepository, RosterRecordRow,
    RosterRepository, RosterUpsert, Store, UpsertRosterRecord, UserRepository,
};
use lectern_types::{email_domain, normalize_email, BatchId, OrganizationId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::{AuthError, ConflictKind, EnrollmentFanout, FanoutReport, RosterLinkPolicy};

/// Successful claim
#[derive(Debug, Clone, Serialize)]
pub struct ClaimOutcome {
    pub organization_id: OrganizationId,
    pub organization_name: String,
    pub batch_id: Option<BatchId>,
    /// `None` if the enrollment fan-out could not run; the claim still stands
    pub enrollments: Option<FanoutReport>,
}

/// One already-parsed roster row
#[derive(Debug, Clone, Deserialize)]
pub struct RosterEntry {
    pub email: String,
    pub full_name: String,
    pub enrollment_code: String,
    #[serde(default)]
    pub batch_id: Option<BatchId>,
}

/// Outcome of a roster upload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RosterIngestReport {
    /// New seats
    pub created: usize,
    /// Pending seats refreshed
    pub updated: usize,
    /// Invalid rows, rows naming a batch outside the organization, and seats
    /// that were already claimed
    pub skipped: usize,
    /// Seats linked to an existing account by email match
    pub linked: usize,
    /// Enrollments created for linked accounts
    pub enrollments: FanoutReport,
}

/// Identity-claim workflow
#[derive(Clone)]
pub struct ClaimWorkflow<S: Store> {
    store: Arc<S>,
    fanout: EnrollmentFanout<S>,
    link_policy: RosterLinkPolicy,
}

impl<S: Store> ClaimWorkflow<S> {
    /// Create a new claim workflow
    pub fn new(store: Arc<S>, link_policy: RosterLinkPolicy) -> Self {
        Self {
            fanout: EnrollmentFanout::new(Arc::clone(&store)),
            store,
            link_policy,
        }
    }

    /// Claim the seat matching the principal's email and the supplied code
    pub async fn claim(
        &self,
        user_id: UserId,
        enrollment_code: &str,
    ) -> Result<ClaimOutcome, AuthError> {
        let result = self.try_claim(user_id, enrollment_code).await;
        let outcome = match &result {
            Ok(_) => "claimed",
            Err(AuthError::Conflict(_)) => "already_verified",
            Err(AuthError::ClaimRejected) => "rejected",
            Err(AuthError::NoInstitution) => "no_institution",
            Err(_) => "error",
        };
        metrics::counter!("lectern_claims_total", "outcome" => outcome).increment(1);
        result
    }

    async fn try_claim(
        &self,
        user_id: UserId,
        enrollment_code: &str,
    ) -> Result<ClaimOutcome, AuthError> {
        let user = self
            .store
            .users()
            .find_by_id(user_id.0)
            .await?
            .ok_or(AuthError::NotFound)?;
        let email = normalize_email(&user.email);

        let domain = email_domain(&email).ok_or(AuthError::NoInstitution)?;
        let org = self
            .store
            .organizations()
            .find_by_email_domain(domain)
            .await?
            .ok_or(AuthError::NoInstitution)?;

        let existing = self.store.memberships().find(user.id, org.id).await?;
        if existing.is_some_and(|m| m.verified) {
            return Err(AuthError::Conflict(ConflictKind::AlreadyVerified));
        }

        let record = self
            .store
            .roster()
            .find_unclaimed(org.id, &email, enrollment_code.trim())
            .await?
            .ok_or(AuthError::ClaimRejected)?;

        // A concurrent claimant may take the seat between lookup and update.
        let membership = self
            .link_seat(user_id, &record)
            .await?
            .ok_or(AuthError::ClaimRejected)?;

        let batch_id = membership.batch_id.map(BatchId);
        let enrollments = self
            .enroll_after_link(user_id, org.organization_id(), batch_id)
            .await;

        Ok(ClaimOutcome {
            organization_id: org.organization_id(),
            organization_name: org.name,
            batch_id,
            enrollments,
        })
    }

    /// Upsert pending seats from already-parsed rows.
    ///
    /// Claimed seats are never modified. A row whose batch does not belong to
    /// the organization is skipped. Under [`RosterLinkPolicy::EmailMatch`]
    /// a row whose email belongs to an active account is linked to it at once,
    /// through the same transactional path as a code claim.
    pub async fn ingest_roster(
        &self,
        organization_id: OrganizationId,
        entries: &[RosterEntry],
    ) -> Result<RosterIngestReport, AuthError> {
        let org = self
            .store
            .organizations()
            .find_by_id(organization_id.0)
            .await?
            .ok_or(AuthError::NotFound)?;

        let mut report = RosterIngestReport::default();
        let mut batches = HashMap::new();
        for entry in entries {
            let email = normalize_email(&entry.email);
            let code = entry.enrollment_code.trim();
            if email_domain(&email).is_none() || code.is_empty() || entry.full_name.trim().is_empty()
            {
                report.skipped += 1;
                continue;
            }

            if let Some(batch_id) = entry.batch_id {
                if !self.owns_batch(&mut batches, org.id, batch_id).await? {
                    tracing::warn!(organization_id = %organization_id, batch_id = %batch_id, "Roster row names a batch outside the organization");
                    report.skipped += 1;
                    continue;
                }
            }

            let upsert = self
                .store
                .roster()
                .upsert_unclaimed(UpsertRosterRecord {
                    id: Uuid::new_v4(),
                    organization_id: org.id,
                    email: email.clone(),
                    full_name: entry.full_name.trim().to_string(),
                    enrollment_code: code.to_string(),
                    batch_id: entry.batch_id.map(|b| b.0),
                })
                .await;

            match upsert {
                Ok(RosterUpsert::Created) => report.created += 1,
                Ok(RosterUpsert::Updated) => report.updated += 1,
                Ok(RosterUpsert::AlreadyClaimed) => {
                    report.skipped += 1;
                    continue;
                }
                Err(DbError::NotFound) => {
                    tracing::warn!(organization_id = %organization_id, "Roster row references a missing row");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            if self.link_policy == RosterLinkPolicy::EmailMatch {
                if let Some(enrollments) = self.auto_link(org.organization_id(), &email).await? {
                    report.linked += 1;
                    report.enrollments.merge(enrollments);
                }
            }
        }

        tracing::info!(
            organization_id = %organization_id,
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            linked = report.linked,
            "Ingested roster"
        );
        Ok(report)
    }

    /// Batch ownership, looked up once per batch per upload
    async fn owns_batch(
        &self,
        seen: &mut HashMap<BatchId, bool>,
        organization_id: Uuid,
        batch_id: BatchId,
    ) -> Result<bool, AuthError> {
        if let Some(owned) = seen.get(&batch_id) {
            return Ok(*owned);
        }
        let owned = self
            .store
            .organizations()
            .owns_batch(organization_id, batch_id.0)
            .await?;
        seen.insert(batch_id, owned);
        Ok(owned)
    }

    async fn auto_link(
        &self,
        organization_id: OrganizationId,
        email: &str,
    ) -> Result<Option<FanoutReport>, AuthError> {
        let Some(user) = self.store.users().find_by_email(email).await? else {
            return Ok(None);
        };
        if !user.active {
            return Ok(None);
        }

        let Some(record) = self
            .store
            .roster()
            .find_by_email(organization_id.0, email)
            .await?
            .filter(|r| !r.claimed)
        else {
            return Ok(None);
        };

        let Some(membership) = self.link_seat(user.user_id(), &record).await? else {
            return Ok(None);
        };

        tracing::info!(user_id = %user.id, organization_id = %organization_id, "Auto-linked roster seat by email match");
        let enrollments = self
            .enroll_after_link(user.user_id(), organization_id, membership.batch_id.map(BatchId))
            .await;
        Ok(Some(enrollments.unwrap_or_default()))
    }

    async fn link_seat(
        &self,
        user_id: UserId,
        record: &RosterRecordRow,
    ) -> Result<Option<MembershipRow>, AuthError> {
        let membership = self
            .store
            .roster()
            .claim_seat(ClaimSeat {
                roster_record_id: record.id,
                user_id: user_id.0,
                organization_id: record.organization_id,
                batch_id: record.batch_id,
            })
            .await?;

        if membership.is_some() {
            tracing::info!(
                user_id = %user_id,
                organization_id = %record.organization_id,
                roster_record_id = %record.id,
                "Roster seat claimed"
            );
        }
        Ok(membership)
    }

    async fn enroll_after_link(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
        batch_id: Option<BatchId>,
    ) -> Option<FanoutReport> {
        match self
            .fanout
            .enroll_member(user_id, organization_id, batch_id)
            .await
        {
            Ok(report) => Some(report),
            Err(e) => {
                metrics::counter!("lectern_fanout_failures_total").increment(1);
                tracing::error!(user_id = %user_id, error = %e, "Post-claim fan-out failed; safe to retry");
                None
            }
        }
    }
}

impl<S: Store> std::fmt::Debug for ClaimWorkflow<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimWorkflow")
            .field("link_policy", &self.link_policy)
            .finish_non_exhaustive()
    }
}
