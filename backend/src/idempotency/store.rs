use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use super::record::{ClaimOutcome, Fingerprint, StoredResponse};
use crate::error::Result;

/// Persistence for idempotency records.
///
/// `claim` must be atomic per key: of several concurrent claims on an unseen
/// (or expired) key exactly one observes `Acquired`. Records whose
/// `expires_at` has passed are treated as absent.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    async fn claim(
        &self,
        key: &str,
        fingerprint: &Fingerprint,
        now: OffsetDateTime,
        lease_until: OffsetDateTime,
    ) -> Result<ClaimOutcome>;

    /// Stores the response for a claimed key and extends its expiry.
    async fn complete(
        &self,
        key: &str,
        fingerprint: &Fingerprint,
        response: &StoredResponse,
        expires_at: OffsetDateTime,
    ) -> Result<()>;

    /// Drops a pending claim so a later request may retry.
    async fn release(&self, key: &str) -> Result<()>;

    /// Deletes expired records, returning how many were removed.
    async fn purge_expired(&self, now: OffsetDateTime) -> Result<u64>;
}

#[derive(Debug, Clone)]
enum RecordState {
    Pending,
    Completed(StoredResponse),
}

#[derive(Debug, Clone)]
struct Record {
    fingerprint: Fingerprint,
    state: RecordState,
    expires_at: OffsetDateTime,
}

impl Record {
    fn outcome_for(&self, fingerprint: &Fingerprint) -> ClaimOutcome {
        if &self.fingerprint != fingerprint {
            return ClaimOutcome::Mismatch;
        }
        match &self.state {
            RecordState::Pending => ClaimOutcome::InFlight,
            RecordState::Completed(response) => ClaimOutcome::Replay(response.clone()),
        }
    }
}

/// Process-local store behind a single mutex.
#[derive(Default)]
pub struct MemoryIdempotencyStore {
    records: Mutex<HashMap<String, Record>>,
}

impl MemoryIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdempotencyStore for MemoryIdempotencyStore {
    async fn claim(
        &self,
        key: &str,
        fingerprint: &Fingerprint,
        now: OffsetDateTime,
        lease_until: OffsetDateTime,
    ) -> Result<ClaimOutcome> {
        let mut records = self.records.lock().await;
        if let Some(existing) = records.get(key) {
            if existing.expires_at > now {
                return Ok(existing.outcome_for(fingerprint));
            }
        }
        records.insert(
            key.to_string(),
            Record {
                fingerprint: fingerprint.clone(),
                state: RecordState::Pending,
                expires_at: lease_until,
            },
        );
        Ok(ClaimOutcome::Acquired)
    }

    async fn complete(
        &self,
        key: &str,
        fingerprint: &Fingerprint,
        response: &StoredResponse,
        expires_at: OffsetDateTime,
    ) -> Result<()> {
        self.records.lock().await.insert(
            key.to_string(),
            Record {
                fingerprint: fingerprint.clone(),
                state: RecordState::Completed(response.clone()),
                expires_at,
            },
        );
        Ok(())
    }

    async fn release(&self, key: &str) -> Result<()> {
        let mut records = self.records.lock().await;
        if matches!(records.get(key), Some(r) if matches!(r.state, RecordState::Pending)) {
            records.remove(key);
        }
        Ok(())
    }

    async fn purge_expired(&self, now: OffsetDateTime) -> Result<u64> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, r| r.expires_at > now);
        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use time::Duration;

    fn fp(tag: &str) -> Fingerprint {
        Fingerprint::of("POST /test", &json!({ "tag": tag })).unwrap()
    }

    #[tokio::test]
    async fn second_claim_sees_in_flight_then_replay() {
        let store = MemoryIdempotencyStore::new();
        let now = OffsetDateTime::now_utc();
        let later = now + Duration::minutes(1);

        assert_eq!(store.claim("k", &fp("a"), now, later).await.unwrap(), ClaimOutcome::Acquired);
        assert_eq!(store.claim("k", &fp("a"), now, later).await.unwrap(), ClaimOutcome::InFlight);
        assert_eq!(store.claim("k", &fp("b"), now, later).await.unwrap(), ClaimOutcome::Mismatch);

        let response = StoredResponse {
            status: StatusCode::CREATED,
            body: json!({"id": 7}),
            location: None,
        };
        store.complete("k", &fp("a"), &response, later).await.unwrap();

        assert_eq!(
            store.claim("k", &fp("a"), now, later).await.unwrap(),
            ClaimOutcome::Replay(response)
        );
    }

    #[tokio::test]
    async fn expired_records_are_reclaimable_and_purged() {
        let store = MemoryIdempotencyStore::new();
        let now = OffsetDateTime::now_utc();

        store.claim("old", &fp("a"), now, now + Duration::seconds(1)).await.unwrap();
        let after = now + Duration::seconds(5);

        assert_eq!(
            store.claim("old", &fp("b"), after, after + Duration::minutes(1)).await.unwrap(),
            ClaimOutcome::Acquired
        );

        store.claim("stale", &fp("a"), now, now + Duration::seconds(1)).await.unwrap();
        assert_eq!(store.purge_expired(after).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn release_only_drops_pending_claims() {
        let store = MemoryIdempotencyStore::new();
        let now = OffsetDateTime::now_utc();
        let later = now + Duration::minutes(1);

        store.claim("k", &fp("a"), now, later).await.unwrap();
        store.release("k").await.unwrap();
        assert_eq!(store.claim("k", &fp("b"), now, later).await.unwrap(), ClaimOutcome::Acquired);

        let response = StoredResponse {
            status: StatusCode::CREATED,
            body: json!({}),
            location: None,
        };
        store.complete("k", &fp("b"), &response, later).await.unwrap();
        store.release("k").await.unwrap();
        assert!(matches!(
            store.claim("k", &fp("b"), now, later).await.unwrap(),
            ClaimOutcome::Replay(_)
        ));
    }
}
