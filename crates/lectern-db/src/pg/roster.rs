//! PostgreSQL roster repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::{MembershipRow, RosterRecordRow};
use crate::repo::{ClaimSeat, RosterRepository, RosterUpsert, UpsertRosterRecord};

/// PostgreSQL roster repository
#[derive(Clone)]
pub struct PgRosterRepository {
    pool: PgPool,
}

impl PgRosterRepository {
    /// Create a new roster repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RosterRepository for PgRosterRepository {
    async fn find_unclaimed(
        &self,
        organization_id: Uuid,
        email: &str,
        enrollment_code: &str,
    ) -> DbResult<Option<RosterRecordRow>> {
        let record = sqlx::query_as::<_, RosterRecordRow>(
            r#"
            SELECT id, organization_id, email, full_name, enrollment_code, batch_id,
                   claimed, claimed_by, claimed_at, created_at
            FROM roster_records
            WHERE organization_id = $1 AND email = $2 AND enrollment_code = $3 AND NOT claimed
            "#,
        )
        .bind(organization_id)
        .bind(email)
        .bind(enrollment_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_email(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> DbResult<Option<RosterRecordRow>> {
        let record = sqlx::query_as::<_, RosterRecordRow>(
            r#"
            SELECT id, organization_id, email, full_name, enrollment_code, batch_id,
                   claimed, claimed_by, claimed_at, created_at
            FROM roster_records
            WHERE organization_id = $1 AND email = $2
            "#,
        )
        .bind(organization_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn upsert_unclaimed(&self, record: UpsertRosterRecord) -> DbResult<RosterUpsert> {
        // The conflict branch is filtered on NOT claimed, so a claimed seat
        // yields no row at all. xmax = 0 distinguishes insert from update.
        let inserted = sqlx::query_scalar::<_, bool>(
            r#"
            INSERT INTO roster_records
                (id, organization_id, email, full_name, enrollment_code, batch_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (organization_id, email) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                enrollment_code = EXCLUDED.enrollment_code,
                batch_id = EXCLUDED.batch_id
            WHERE NOT roster_records.claimed
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(record.id)
        .bind(record.organization_id)
        .bind(&record.email)
        .bind(&record.full_name)
        .bind(&record.enrollment_code)
        .bind(record.batch_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match inserted {
            Some(true) => RosterUpsert::Created,
            Some(false) => RosterUpsert::Updated,
            None => RosterUpsert::AlreadyClaimed,
        })
    }

    async fn claim_seat(&self, claim: ClaimSeat) -> DbResult<Option<MembershipRow>> {
        let mut tx = self.pool.begin().await?;

        let flipped = sqlx::query(
            r#"
            UPDATE roster_records
            SET claimed = TRUE, claimed_by = $2, claimed_at = NOW()
            WHERE id = $1 AND NOT claimed
            "#,
        )
        .bind(claim.roster_record_id)
        .bind(claim.user_id)
        .execute(&mut *tx)
        .await?;

        if flipped.rows_affected() == 0 {
            tracing::debug!(roster_record_id = %claim.roster_record_id, "Seat already claimed");
            tx.rollback().await?;
            return Ok(None);
        }

        // An existing membership keeps its role; only verification and batch change.
        let membership = sqlx::query_as::<_, MembershipRow>(
            r#"
            INSERT INTO organization_memberships
                (id, user_id, organization_id, batch_id, role, verified, active)
            VALUES ($1, $2, $3, $4, 'student', TRUE, TRUE)
            ON CONFLICT (user_id, organization_id) DO UPDATE
            SET verified = TRUE,
                active = TRUE,
                batch_id = COALESCE(EXCLUDED.batch_id, organization_memberships.batch_id),
                updated_at = NOW()
            RETURNING id, user_id, organization_id, batch_id, role, verified, active,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(claim.user_id)
        .bind(claim.organization_id)
        .bind(claim.batch_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(membership))
    }
}
