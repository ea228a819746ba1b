//! PostgreSQL rotation token repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::RotationTokenRow;
use crate::repo::{CreateRotationToken, RotationTokenRepository};

/// PostgreSQL rotation token repository
#[derive(Clone)]
pub struct PgRotationTokenRepository {
    pool: PgPool,
}

impl PgRotationTokenRepository {
    /// Create a new rotation token repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RotationTokenRepository for PgRotationTokenRepository {
    async fn create(&self, token: CreateRotationToken) -> DbResult<RotationTokenRow> {
        let row = sqlx::query_as::<_, RotationTokenRow>(
            r#"
            INSERT INTO rotation_tokens (id, user_id, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, token_hash, created_at, expires_at, revoked, revoked_at
            "#,
        )
        .bind(token.id)
        .bind(token.user_id)
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> DbResult<Option<RotationTokenRow>> {
        // No state filter: the caller needs revoked rows to detect reuse.
        let token = sqlx::query_as::<_, RotationTokenRow>(
            r#"
            SELECT id, user_id, token_hash, created_at, expires_at, revoked, revoked_at
            FROM rotation_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn find_active_by_user_id(&self, user_id: Uuid) -> DbResult<Vec<RotationTokenRow>> {
        let tokens = sqlx::query_as::<_, RotationTokenRow>(
            r#"
            SELECT id, user_id, token_hash, created_at, expires_at, revoked, revoked_at
            FROM rotation_tokens
            WHERE user_id = $1 AND NOT revoked AND expires_at > NOW()
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tokens)
    }

    async fn revoke_if_active(&self, id: Uuid) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE rotation_tokens SET revoked = TRUE, revoked_at = NOW() WHERE id = $1 AND NOT revoked",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> DbResult<u64> {
        let result = sqlx::query(
            "UPDATE rotation_tokens SET revoked = TRUE, revoked_at = NOW() WHERE user_id = $1 AND NOT revoked",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM rotation_tokens WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
