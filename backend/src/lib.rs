pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod idempotency;
pub mod integrity;
pub mod lifecycle;
pub mod models;
pub mod pagination;
pub mod seed;
pub mod store;

use std::sync::Arc;

use auth::ApiKeys;
use idempotency::IdempotencyGuard;
use store::FleetStore;

/// Shared application state available to all handlers via axum's State extractor.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FleetStore>,
    pub idempotency: IdempotencyGuard,
    pub api_keys: ApiKeys,
}

impl axum::extract::FromRef<AppState> for Arc<dyn FleetStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl axum::extract::FromRef<AppState> for IdempotencyGuard {
    fn from_ref(state: &AppState) -> Self {
        state.idempotency.clone()
    }
}

impl axum::extract::FromRef<AppState> for ApiKeys {
    fn from_ref(state: &AppState) -> Self {
        state.api_keys.clone()
    }
}
