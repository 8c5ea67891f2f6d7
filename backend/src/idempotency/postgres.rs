use async_trait::async_trait;
use axum::http::StatusCode;
use sqlx::{types::Json, PgPool};
use time::OffsetDateTime;

use super::{
    record::{ClaimOutcome, Fingerprint, StoredResponse},
    store::IdempotencyStore,
};
use crate::error::{AppError, Result};

#[derive(sqlx::FromRow)]
struct RecordRow {
    fingerprint: String,
    state: String,
    response_status: Option<i32>,
    response_body: Option<serde_json::Value>,
    response_location: Option<String>,
}

impl RecordRow {
    fn into_outcome(self, fingerprint: &Fingerprint) -> Result<ClaimOutcome> {
        if self.fingerprint != fingerprint.as_str() {
            return Ok(ClaimOutcome::Mismatch);
        }
        if self.state != "completed" {
            return Ok(ClaimOutcome::InFlight);
        }

        let status = self
            .response_status
            .and_then(|s| u16::try_from(s).ok())
            .and_then(|s| StatusCode::from_u16(s).ok())
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("completed idempotency record has no status"))
            })?;

        Ok(ClaimOutcome::Replay(StoredResponse {
            status,
            body: self.response_body.unwrap_or(serde_json::Value::Null),
            location: self.response_location,
        }))
    }
}

/// Idempotency records in the `idempotency_records` table. The claim is a
/// single `INSERT ... ON CONFLICT` so concurrent requests on one key race
/// inside Postgres rather than in the process.
#[derive(Clone)]
pub struct PgIdempotencyStore {
    pool: PgPool,
}

impl PgIdempotencyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdempotencyStore for PgIdempotencyStore {
    async fn claim(
        &self,
        key: &str,
        fingerprint: &Fingerprint,
        now: OffsetDateTime,
        lease_until: OffsetDateTime,
    ) -> Result<ClaimOutcome> {
        // Inserts a fresh pending row, or takes over an expired one.
        let claimed: Option<String> = sqlx::query_scalar(
            r#"
            INSERT INTO idempotency_records (key, fingerprint, state, created_at, expires_at)
            VALUES ($1, $2, 'pending', $3, $4)
            ON CONFLICT (key) DO UPDATE
            SET fingerprint = EXCLUDED.fingerprint,
                state = 'pending',
                response_status = NULL,
                response_body = NULL,
                response_location = NULL,
                created_at = EXCLUDED.created_at,
                expires_at = EXCLUDED.expires_at
            WHERE idempotency_records.expires_at <= EXCLUDED.created_at
            RETURNING key
            "#,
        )
        .bind(key)
        .bind(fingerprint.as_str())
        .bind(now)
        .bind(lease_until)
        .fetch_optional(&self.pool)
        .await?;

        if claimed.is_some() {
            return Ok(ClaimOutcome::Acquired);
        }

        let existing = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT fingerprint, state, response_status, response_body, response_location
            FROM idempotency_records
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        match existing {
            Some(row) => row.into_outcome(fingerprint),
            // Released or purged between the two statements; the caller polls again.
            None => Ok(ClaimOutcome::InFlight),
        }
    }

    async fn complete(
        &self,
        key: &str,
        fingerprint: &Fingerprint,
        response: &StoredResponse,
        expires_at: OffsetDateTime,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO idempotency_records
                (key, fingerprint, state, response_status, response_body, response_location,
                 created_at, expires_at)
            VALUES ($1, $2, 'completed', $3, $4, $5, NOW(), $6)
            ON CONFLICT (key) DO UPDATE
            SET state = 'completed',
                response_status = EXCLUDED.response_status,
                response_body = EXCLUDED.response_body,
                response_location = EXCLUDED.response_location,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(key)
        .bind(fingerprint.as_str())
        .bind(i32::from(response.status.as_u16()))
        .bind(Json(&response.body))
        .bind(&response.location)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn release(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM idempotency_records WHERE key = $1 AND state = 'pending'")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self, now: OffsetDateTime) -> Result<u64> {
        let result = sqlx::query("DELETE FROM idempotency_records WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
