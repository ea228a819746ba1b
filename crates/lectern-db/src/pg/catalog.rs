//! PostgreSQL catalog read-path implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::LessonAccessRow;
use crate::repo::CatalogRepository;

/// PostgreSQL catalog repository
#[derive(Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    /// Create a new catalog repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn find_lesson_access(&self, lesson_id: Uuid) -> DbResult<Option<LessonAccessRow>> {
        let row = sqlx::query_as::<_, LessonAccessRow>(
            r#"
            SELECT l.id AS lesson_id, l.is_free, c.id AS course_id, c.published AS course_published
            FROM lessons l
            JOIN modules m ON m.id = l.module_id
            JOIN courses c ON c.id = m.course_id
            WHERE l.id = $1
            "#,
        )
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn published_course_ids(&self) -> DbResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM courses WHERE published")
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }
}
