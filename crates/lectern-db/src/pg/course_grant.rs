//! PostgreSQL course grant repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::repo::CourseGrantRepository;

/// PostgreSQL course grant repository
#[derive(Clone)]
pub struct PgCourseGrantRepository {
    pool: PgPool,
}

impl PgCourseGrantRepository {
    /// Create a new course grant repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseGrantRepository for PgCourseGrantRepository {
    async fn grant_to_organization(&self, organization_id: Uuid, course_id: Uuid) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO org_course_grants (organization_id, course_id)
            VALUES ($1, $2)
            ON CONFLICT (organization_id, course_id) DO NOTHING
            "#,
        )
        .bind(organization_id)
        .bind(course_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn revoke_from_organization(
        &self,
        organization_id: Uuid,
        course_id: Uuid,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            "DELETE FROM org_course_grants WHERE organization_id = $1 AND course_id = $2",
        )
        .bind(organization_id)
        .bind(course_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn grant_to_batch(&self, batch_id: Uuid, course_id: Uuid) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO batch_course_grants (batch_id, course_id)
            VALUES ($1, $2)
            ON CONFLICT (batch_id, course_id) DO NOTHING
            "#,
        )
        .bind(batch_id)
        .bind(course_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn revoke_from_batch(&self, batch_id: Uuid, course_id: Uuid) -> DbResult<bool> {
        let result =
            sqlx::query("DELETE FROM batch_course_grants WHERE batch_id = $1 AND course_id = $2")
                .bind(batch_id)
                .bind(course_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn courses_for_organization(&self, organization_id: Uuid) -> DbResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT course_id FROM org_course_grants WHERE organization_id = $1",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn courses_for_batch(&self, batch_id: Uuid) -> DbResult<Vec<Uuid>> {
        let ids =
            sqlx::query_scalar::<_, Uuid>("SELECT course_id FROM batch_course_grants WHERE batch_id = $1")
                .bind(batch_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(ids)
    }
}
