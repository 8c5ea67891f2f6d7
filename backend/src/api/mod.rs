pub mod branches;
pub mod employees;
pub mod extract;
pub mod health;
pub mod links;
pub mod vehicles;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{delete, get},
    Router,
};
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{auth::ApiKey, config::Config, AppState};

pub fn router(state: AppState) -> Router {
    let v1 = Router::new()
        // Branches
        .route("/branches", get(branches::list).post(branches::create))
        .route("/branches/:id", get(branches::get).put(branches::update))
        .route("/branches/tax-id/:tax_id", get(branches::get_by_tax_id))
        .route("/branches/:id/close", delete(branches::close))
        // Employees
        .route("/employees", get(employees::list).post(employees::create))
        .route(
            "/employees/:id",
            get(employees::get).put(employees::update).delete(employees::delete),
        )
        .route(
            "/employees/national-id/:national_id",
            get(employees::get_by_national_id),
        )
        // Vehicles
        .route("/vehicles", get(vehicles::list).post(vehicles::create))
        .route(
            "/vehicles/:id",
            get(vehicles::get).put(vehicles::update).delete(vehicles::delete),
        )
        .route("/vehicles/plate/:plate", get(vehicles::get_by_plate));

    let v2 = Router::new()
        // Branches
        .route(
            "/branches",
            get(branches::list_page).post(branches::create_idempotent),
        )
        .route("/branches/:id", get(branches::get_linked).put(branches::update))
        .route("/branches/tax-id/:tax_id", get(branches::get_by_tax_id_linked))
        .route("/branches/:id/close", delete(branches::close))
        // Employees
        .route(
            "/employees",
            get(employees::list_page).post(employees::create_idempotent),
        )
        .route(
            "/employees/:id",
            get(employees::get_linked)
                .put(employees::update)
                .delete(employees::delete),
        )
        .route(
            "/employees/national-id/:national_id",
            get(employees::get_by_national_id_linked),
        )
        // Vehicles
        .route(
            "/vehicles",
            get(vehicles::list_page).post(vehicles::create_idempotent),
        )
        .route(
            "/vehicles/:id",
            get(vehicles::get_linked)
                .put(vehicles::update)
                .delete(vehicles::delete),
        )
        .route("/vehicles/plate/:plate", get(vehicles::get_by_plate_linked))
        .route_layer(middleware::from_extractor_with_state::<ApiKey, _>(
            state.clone(),
        ))
        // Health stays reachable without an API key
        .route("/health", get(health::check));

    Router::new()
        .nest("/api/v1", v1)
        .nest("/api/v2", v2)
        .with_state(state)
}

/// The router wrapped in the served middleware stack: tracing, CORS,
/// compression and per-IP rate limiting. Must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()` so the limiter can
/// see the peer address.
pub fn app(state: AppState, cfg: &Config) -> anyhow::Result<Router> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("idempotency-key"),
            HeaderName::from_static("x-api-key"),
        ])
        .expose_headers([
            header::LOCATION,
            HeaderName::from_static("idempotent-replayed"),
        ])
        .allow_origin(
            cfg.cors_origins
                .iter()
                .filter_map(|o| o.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        );

    let governor = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(cfg.rate_limit_per_second)
            .burst_size(cfg.rate_limit_burst)
            .finish()
            .context("invalid rate limit settings")?,
    );

    // Governor takes the router's plain `Body`, so it stays innermost.
    Ok(router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(CompressionLayer::new())
            .layer(GovernorLayer { config: governor }),
    ))
}
