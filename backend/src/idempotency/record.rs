use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};

pub const REPLAYED_HEADER: &str = "Idempotent-Replayed";

/// SHA-256 (hex) of the route scope plus the canonical JSON payload.
///
/// `serde_json::Value` keeps object keys sorted, so two payloads that differ
/// only in key order hash the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of<T: Serialize + ?Sized>(scope: &str, payload: &T) -> Result<Self> {
        let canonical = serde_json::to_value(payload)
            .and_then(|value| serde_json::to_vec(&value))
            .map_err(|e| AppError::Internal(e.into()))?;

        let mut hasher = Sha256::new();
        hasher.update(scope.as_bytes());
        hasher.update(b"\n");
        hasher.update(&canonical);
        Ok(Self(hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A handler response in the form it is kept for replay.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResponse {
    pub status: StatusCode,
    pub body: Value,
    pub location: Option<String>,
}

impl StoredResponse {
    pub fn created<T: Serialize>(location: String, body: &T) -> Result<Self> {
        Ok(Self {
            status: StatusCode::CREATED,
            body: serde_json::to_value(body).map_err(|e| AppError::Internal(e.into()))?,
            location: Some(location),
        })
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Renders a replay: identical to the first response plus the replay marker.
    pub fn into_replay(self) -> Response {
        let mut response = self.into_response();
        response
            .headers_mut()
            .insert(REPLAYED_HEADER, HeaderValue::from_static("true"));
        response
    }
}

impl IntoResponse for StoredResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();
        if let Some(location) = self.location {
            match HeaderValue::from_str(&location) {
                Ok(value) => {
                    response.headers_mut().insert(header::LOCATION, value);
                }
                Err(_) => tracing::warn!(%location, "dropping unrepresentable Location header"),
            }
        }
        response
    }
}

/// Result of trying to claim a key.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    /// The caller owns the key and must run the handler.
    Acquired,
    /// A completed response exists for the same request.
    Replay(StoredResponse),
    /// Another request holds the key and has not finished.
    InFlight,
    /// The key was used for a different request.
    Mismatch,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fingerprint_ignores_key_order() {
        let a = Fingerprint::of("POST /x", &json!({"a": 1, "b": 2})).unwrap();
        let b = Fingerprint::of("POST /x", &json!({"b": 2, "a": 1})).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn fingerprint_depends_on_scope_and_payload() {
        let base = Fingerprint::of("POST /x", &json!({"a": 1})).unwrap();
        assert_ne!(base, Fingerprint::of("POST /y", &json!({"a": 1})).unwrap());
        assert_ne!(base, Fingerprint::of("POST /x", &json!({"a": 2})).unwrap());
    }

    #[test]
    fn replay_carries_location_and_marker() {
        let stored = StoredResponse::created("/api/v2/branches/1".into(), &json!({"id": 1})).unwrap();
        let response = stored.into_replay();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::LOCATION], "/api/v2/branches/1");
        assert_eq!(response.headers()[REPLAYED_HEADER], "true");
    }
}
