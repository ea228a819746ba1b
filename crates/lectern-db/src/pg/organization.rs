//! PostgreSQL organization repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::OrganizationRow;
use crate::repo::OrganizationRepository;

/// PostgreSQL organization repository
#[derive(Clone)]
pub struct PgOrganizationRepository {
    pool: PgPool,
}

impl PgOrganizationRepository {
    /// Create a new organization repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganizationRepository for PgOrganizationRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<OrganizationRow>> {
        let org = sqlx::query_as::<_, OrganizationRow>(
            "SELECT id, name, email_domain, active, created_at FROM organizations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(org)
    }

    async fn find_by_email_domain(&self, domain: &str) -> DbResult<Option<OrganizationRow>> {
        let org = sqlx::query_as::<_, OrganizationRow>(
            r#"
            SELECT id, name, email_domain, active, created_at
            FROM organizations
            WHERE lower(email_domain) = lower($1) AND active
            "#,
        )
        .bind(domain)
        .fetch_optional(&self.pool)
        .await?;

        Ok(org)
    }

    async fn owns_batch(&self, organization_id: Uuid, batch_id: Uuid) -> DbResult<bool> {
        let owned = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM batches WHERE id = $1 AND organization_id = $2)",
        )
        .bind(batch_id)
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(owned)
    }
}
