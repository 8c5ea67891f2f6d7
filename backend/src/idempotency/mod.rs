//! Replay-safe creation requests.
//!
//! A creation request carrying an `Idempotency-Key` claims the key before the
//! handler runs. The first successful response is stored against the key and
//! replayed verbatim for every retry of the same request until the record
//! expires. Concurrent retries wait for the first one to finish.

pub mod key;
pub mod postgres;
pub mod record;
pub mod store;

use std::{future::Future, sync::Arc, time::Duration};

use axum::response::{IntoResponse, Response};
use serde::Serialize;
use time::OffsetDateTime;
use tokio::time::Instant;

use crate::{
    config::IdempotencySettings,
    error::{AppError, Result},
};

pub use key::{IdempotencyKey, IDEMPOTENCY_KEY_HEADER};
pub use postgres::PgIdempotencyStore;
pub use record::{ClaimOutcome, Fingerprint, StoredResponse, REPLAYED_HEADER};
pub use store::{IdempotencyStore, MemoryIdempotencyStore};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// How long a pending claim blocks its key if the holder never finishes.
const PENDING_LEASE: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct IdempotencyGuard {
    store: Arc<dyn IdempotencyStore>,
    ttl: Duration,
    wait: Duration,
}

impl IdempotencyGuard {
    pub fn new(store: Arc<dyn IdempotencyStore>, settings: IdempotencySettings) -> Self {
        Self {
            store,
            ttl: settings.ttl,
            wait: settings.wait,
        }
    }

    /// Runs `handler` at most once per key and request fingerprint.
    ///
    /// `scope` names the route (e.g. `POST /api/v2/branches`) so one key
    /// cannot be replayed across endpoints.
    pub async fn execute<T, F, Fut>(
        &self,
        key: &IdempotencyKey,
        scope: &str,
        payload: &T,
        handler: F,
    ) -> Result<Response>
    where
        T: Serialize + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<StoredResponse>>,
    {
        let fingerprint = Fingerprint::of(scope, payload)?;
        let deadline = Instant::now() + self.wait;

        loop {
            let now = OffsetDateTime::now_utc();
            let outcome = self
                .store
                .claim(key.as_str(), &fingerprint, now, now + PENDING_LEASE)
                .await?;

            match outcome {
                ClaimOutcome::Acquired => break,
                ClaimOutcome::Replay(stored) => {
                    tracing::info!(key = %key, scope, "replaying stored response");
                    return Ok(stored.into_replay());
                }
                ClaimOutcome::Mismatch => {
                    tracing::warn!(key = %key, scope, "idempotency key reused with a different request");
                    return Err(AppError::IdempotencyKeyReused);
                }
                ClaimOutcome::InFlight => {
                    if Instant::now() >= deadline {
                        return Err(AppError::IdempotencyInProgress);
                    }
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }

        match handler().await {
            Ok(stored) if stored.is_success() => {
                let expires_at = OffsetDateTime::now_utc() + self.ttl;
                self.store
                    .complete(key.as_str(), &fingerprint, &stored, expires_at)
                    .await?;
                Ok(stored.into_response())
            }
            Ok(stored) => {
                self.release(key).await;
                Ok(stored.into_response())
            }
            Err(err) => {
                self.release(key).await;
                Err(err)
            }
        }
    }

    async fn release(&self, key: &IdempotencyKey) {
        if let Err(e) = self.store.release(key.as_str()).await {
            tracing::warn!(key = %key, error = %e, "failed to release idempotency claim");
        }
    }
}

/// Deletes expired records every `interval` until the process exits.
pub fn spawn_purge_task(store: Arc<dyn IdempotencyStore>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match store.purge_expired(OffsetDateTime::now_utc()).await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "purged expired idempotency records"),
                Err(e) => tracing::warn!(error = %e, "idempotency purge failed"),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn guard() -> IdempotencyGuard {
        IdempotencyGuard::new(
            Arc::new(MemoryIdempotencyStore::new()),
            IdempotencySettings::default(),
        )
    }

    fn created(id: usize) -> Result<StoredResponse> {
        StoredResponse::created(format!("/things/{id}"), &json!({ "id": id }))
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn retry_replays_without_running_the_handler() {
        let guard = guard();
        let key = IdempotencyKey::parse("retry-1").unwrap();
        let calls = AtomicUsize::new(0);
        let payload = json!({"name": "x"});

        let first = guard
            .execute(&key, "POST /things", &payload, || async {
                created(calls.fetch_add(1, Ordering::SeqCst) + 1)
            })
            .await
            .unwrap();
        let second = guard
            .execute(&key, "POST /things", &payload, || async {
                created(calls.fetch_add(1, Ordering::SeqCst) + 1)
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.status(), StatusCode::CREATED);
        assert!(first.headers().get(REPLAYED_HEADER).is_none());
        assert_eq!(second.headers()[REPLAYED_HEADER], "true");
        assert_eq!(body_bytes(first).await, body_bytes(second).await);
    }

    #[tokio::test]
    async fn different_payload_under_same_key_is_rejected() {
        let guard = guard();
        let key = IdempotencyKey::parse("reuse").unwrap();

        guard
            .execute(&key, "POST /things", &json!({"n": 1}), || async { created(1) })
            .await
            .unwrap();
        let err = guard
            .execute(&key, "POST /things", &json!({"n": 2}), || async { created(2) })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::IdempotencyKeyReused));
    }

    #[tokio::test]
    async fn failed_handler_releases_the_key() {
        let guard = guard();
        let key = IdempotencyKey::parse("fails-once").unwrap();
        let payload = json!({"n": 1});

        let err = guard
            .execute(&key, "POST /things", &payload, || async {
                Err::<StoredResponse, _>(AppError::Conflict("taken".into()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let retry = guard
            .execute(&key, "POST /things", &payload, || async { created(9) })
            .await
            .unwrap();
        assert_eq!(retry.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn concurrent_requests_run_the_handler_once() {
        let guard = guard();
        let key = IdempotencyKey::parse("race").unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let payload = json!({"n": 1});

        let attempts = (0..8).map(|_| {
            let guard = guard.clone();
            let key = key.clone();
            let calls = calls.clone();
            let payload = payload.clone();
            tokio::spawn(async move {
                guard
                    .execute(&key, "POST /things", &payload, || async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        created(calls.fetch_add(1, Ordering::SeqCst) + 1)
                    })
                    .await
                    .map(|r| r.status())
            })
        });

        for handle in attempts.collect::<Vec<_>>() {
            assert_eq!(handle.await.unwrap().unwrap(), StatusCode::CREATED);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn waiting_past_the_budget_reports_in_progress() {
        let store: Arc<dyn IdempotencyStore> = Arc::new(MemoryIdempotencyStore::new());
        let guard = IdempotencyGuard::new(
            store.clone(),
            IdempotencySettings {
                wait: Duration::from_millis(60),
                ..IdempotencySettings::default()
            },
        );
        let key = IdempotencyKey::parse("stuck").unwrap();
        let payload = json!({"n": 1});
        let fingerprint = Fingerprint::of("POST /things", &payload).unwrap();
        let now = OffsetDateTime::now_utc();
        store
            .claim("stuck", &fingerprint, now, now + PENDING_LEASE)
            .await
            .unwrap();

        let err = guard
            .execute(&key, "POST /things", &payload, || async { created(1) })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::IdempotencyInProgress));
    }
}
