/// Verification code repository backed by Postgres
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{VerificationCode, VerificationCodeKind};
use crate::store::VerificationCodeStore;

#[derive(Clone)]
pub struct PgVerificationCodeStore {
    pool: PgPool,
}

impl PgVerificationCodeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationCodeStore for PgVerificationCodeStore {
    async fn create(
        &self,
        user_id: Uuid,
        kind: VerificationCodeKind,
        expires_at: DateTime<Utc>,
    ) -> Result<VerificationCode> {
        let code = sqlx::query_as::<_, VerificationCode>(
            r#"
            INSERT INTO verification_codes (user_id, kind, expires_at)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(code)
    }

    async fn find_active_by_id(
        &self,
        id: Uuid,
        kind: VerificationCodeKind,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationCode>> {
        let code = sqlx::query_as::<_, VerificationCode>(
            r#"
            SELECT * FROM verification_codes
            WHERE id = $1 AND kind = $2 AND expires_at > $3
            "#,
        )
        .bind(id)
        .bind(kind)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(code)
    }

    async fn count_for_user_since(
        &self,
        user_id: Uuid,
        kind: VerificationCodeKind,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM verification_codes
            WHERE user_id = $1 AND kind = $2 AND created_at > $3
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM verification_codes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
