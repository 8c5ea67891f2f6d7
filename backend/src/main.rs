use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fleet_backend::{
    api,
    auth::ApiKeys,
    config::Config,
    idempotency::{self, IdempotencyGuard, IdempotencyStore, PgIdempotencyStore},
    seed,
    store::{FleetStore, PgStore},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (dev convenience)
    let _ = dotenvy::dotenv();

    let cfg = Config::from_env()?;

    // Tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Database pool
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&cfg.database_url)
        .await
        .context("failed to connect to the database")?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("Database connected and migrations applied");

    let store: Arc<dyn FleetStore> = Arc::new(PgStore::new(pool.clone()));
    let idempotency_store: Arc<dyn IdempotencyStore> = Arc::new(PgIdempotencyStore::new(pool));

    if cfg.seed_demo_data {
        seed::seed_demo_data(store.as_ref())
            .await
            .context("failed to seed demo data")?;
    }

    idempotency::spawn_purge_task(idempotency_store.clone(), cfg.idempotency.purge_interval);

    if cfg.api_keys.is_empty() {
        tracing::warn!("API_KEYS is empty, v2 endpoints accept unauthenticated requests");
    }

    let state = AppState {
        store,
        idempotency: IdempotencyGuard::new(idempotency_store, cfg.idempotency),
        api_keys: ApiKeys::new(&cfg.api_keys),
    };

    let app = api::app(state, &cfg)?;

    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
    tracing::info!("Listening on {}", cfg.listen_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
