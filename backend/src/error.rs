use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::{ValidationErrors, ValidationErrorsKind};

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("API key is missing or invalid")]
    Unauthorized,

    #[error("{resource} not found")]
    NotFound { resource: &'static str, key: String },

    #[error("Branch {0} does not exist")]
    InvalidReference(Uuid),

    #[error("Idempotency-Key header is required")]
    MissingIdempotencyKey,

    #[error("Idempotency key was already used for a different request")]
    IdempotencyKeyReused,

    #[error("A request with this idempotency key is still being processed")]
    IdempotencyInProgress,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(resource: &'static str, key: impl ToString) -> Self {
        AppError::NotFound {
            resource,
            key: key.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::NotFound { key, .. } => {
                return (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": self.to_string(), "key": key })),
                )
                    .into_response();
            }
            AppError::InvalidReference(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::MissingIdempotencyKey => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::IdempotencyKeyReused => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            AppError::IdempotencyInProgress => (StatusCode::CONFLICT, self.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Validation(e) => {
                let mut messages = Vec::new();
                collect_validation_messages("", e, &mut messages);
                messages.sort();
                (StatusCode::BAD_REQUEST, messages.join("; "))
            }
            AppError::Database(e) => {
                // Constraint violations that slipped past the store's own mapping
                if let sqlx::Error::Database(ref db_err) = e {
                    if db_err.is_unique_violation() {
                        tracing::warn!("Unique constraint violation: {}", db_err.message());
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({ "error": "A record with that value already exists" })),
                        )
                            .into_response();
                    }
                    if db_err.is_foreign_key_violation() {
                        tracing::warn!("Foreign key violation: {}", db_err.message());
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(json!({ "error": "Referenced record does not exist" })),
                        )
                            .into_response();
                    }
                }
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".into())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Flattens nested validation errors into `path.field: message` strings so the
/// embedded address reports as `address.region_code: ...`.
fn collect_validation_messages(prefix: &str, errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                let msgs: Vec<&str> = errs
                    .iter()
                    .filter_map(|err| err.message.as_ref().map(|m| m.as_ref()))
                    .collect();
                if msgs.is_empty() {
                    let codes: Vec<&str> = errs.iter().map(|err| err.code.as_ref()).collect();
                    out.push(format!("{}: {}", path, codes.join(", ")));
                } else {
                    out.push(format!("{}: {}", path, msgs.join(", ")));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_validation_messages(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    collect_validation_messages(&format!("{}[{}]", path, idx), inner, out);
                }
            }
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
