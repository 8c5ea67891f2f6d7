use std::fmt;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

use crate::error::AppError;

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

const MAX_KEY_LEN: usize = 255;

/// Opaque client token deduplicating retried creation requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Accepts 1-255 printable ASCII characters (inner spaces allowed). Blank
    /// input is reported as a missing key; anything else out of shape is a
    /// bad request.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        if raw.trim().is_empty() {
            return Err(AppError::MissingIdempotencyKey);
        }
        if raw.trim() != raw {
            return Err(AppError::BadRequest(
                "Idempotency-Key must not have surrounding whitespace".into(),
            ));
        }
        if raw.len() > MAX_KEY_LEN {
            return Err(AppError::BadRequest(format!(
                "Idempotency-Key must be at most {MAX_KEY_LEN} characters"
            )));
        }
        if !raw.bytes().all(|b| b.is_ascii_graphic() || b == b' ') {
            return Err(AppError::BadRequest(
                "Idempotency-Key must contain only visible ASCII characters".into(),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let value = headers
            .get(IDEMPOTENCY_KEY_HEADER)
            .ok_or(AppError::MissingIdempotencyKey)?;
        let raw = value.to_str().map_err(|_| {
            AppError::BadRequest("Idempotency-Key must contain only visible ASCII characters".into())
        })?;
        Self::parse(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for IdempotencyKey
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers)
    }
}
