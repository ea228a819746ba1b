//! PostgreSQL organization membership repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::{MembershipDetailRow, MembershipRow};
use crate::repo::MembershipRepository;

/// PostgreSQL membership repository
#[derive(Clone)]
pub struct PgMembershipRepository {
    pool: PgPool,
}

impl PgMembershipRepository {
    /// Create a new membership repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipRepository for PgMembershipRepository {
    async fn find_details_for_user(&self, user_id: Uuid) -> DbResult<Vec<MembershipDetailRow>> {
        let rows = sqlx::query_as::<_, MembershipDetailRow>(
            r#"
            SELECT m.id, m.user_id, m.organization_id, o.name AS organization_name,
                   o.active AS organization_active, m.batch_id, m.role, m.verified, m.active
            FROM organization_memberships m
            JOIN organizations o ON o.id = m.organization_id
            WHERE m.user_id = $1 AND m.active
            ORDER BY m.created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find(&self, user_id: Uuid, organization_id: Uuid) -> DbResult<Option<MembershipRow>> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT id, user_id, organization_id, batch_id, role, verified, active,
                   created_at, updated_at
            FROM organization_memberships
            WHERE user_id = $1 AND organization_id = $2
            "#,
        )
        .bind(user_id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn has_verified_active_membership(&self, user_id: Uuid) -> DbResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM organization_memberships m
                JOIN organizations o ON o.id = m.organization_id
                WHERE m.user_id = $1 AND m.verified AND m.active AND o.active
            )
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn verified_members_of_organization(&self, organization_id: Uuid) -> DbResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id
            FROM organization_memberships
            WHERE organization_id = $1 AND verified AND active
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn verified_members_of_batch(&self, batch_id: Uuid) -> DbResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id
            FROM organization_memberships
            WHERE batch_id = $1 AND verified AND active
            "#,
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
