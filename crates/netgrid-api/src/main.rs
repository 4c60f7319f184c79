//! NetGrid API server entry point.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use netgrid_api::error::AppError;
use netgrid_api::routes;
use netgrid_api::state::AppState;
use netgrid_catalog::Catalog;
use netgrid_core::clock::SystemClock;
use netgrid_core::rng::StdRandom;
use netgrid_core::store::GameStore;
use netgrid_store::PgGameStore;

/// How often the trace retention sweep runs.
const TRACE_PRUNE_INTERVAL_SECS: u64 = 300;

/// Traces only need to outlive realistic retry windows.
const TRACE_RETENTION_MINUTES: i64 = 60;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting NetGrid API server");

    // Read configuration from environment.
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| AppError::Config("DATABASE_URL environment variable must be set".to_owned()))?;
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;

    // Catalog: built-in command set, or a YAML override. Misconfiguration
    // is fatal here, never at invocation time.
    let catalog = match std::env::var("NETGRID_CATALOG_PATH") {
        Ok(path) => {
            let yaml = std::fs::read_to_string(&path)?;
            Catalog::from_yaml_str(&yaml)
                .map_err(|e| AppError::Config(format!("catalog {path}: {e}")))?
        }
        Err(_) => Catalog::builtin(),
    };
    tracing::info!(commands = catalog.len(), "catalog loaded");

    // Create database connection pool and apply migrations.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;
    let store = PgGameStore::new(pool);
    store
        .run_migrations()
        .await
        .map_err(|e| AppError::Config(e.to_string()))?;

    // Background retention sweep for invocation traces.
    let prune_store = store.clone();
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(TRACE_PRUNE_INTERVAL_SECS));
        loop {
            ticker.tick().await;
            let horizon = chrono::Utc::now() - chrono::Duration::minutes(TRACE_RETENTION_MINUTES);
            match prune_store.prune_traces(horizon).await {
                Ok(0) => {}
                Ok(pruned) => tracing::info!(pruned, "pruned invocation traces"),
                Err(error) => tracing::warn!(%error, "trace pruning failed"),
            }
        }
    });

    // Build application state.
    let app_state = AppState::new(
        Arc::new(catalog),
        Arc::new(store),
        Arc::new(SystemClock),
        Arc::new(Mutex::new(StdRandom::from_os_entropy())),
    );

    // Build router.
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/catalog", routes::catalog::router())
        .nest("/api/v1/commands", routes::commands::router())
        .nest("/api/v1/players", routes::players::router())
        .nest("/api/v1/lessons", routes::lessons::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server.
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
