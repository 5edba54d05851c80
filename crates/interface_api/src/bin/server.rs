//! Clinic ledger API server
//!
//! # Usage
//!
//! ```bash
//! # In-memory store with default settings
//! cargo run --bin clinic-api
//!
//! # PostgreSQL
//! API_STORAGE=postgres API_DATABASE_URL=postgres://... cargo run --bin clinic-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` / `API_PORT` - Bind address (default: 0.0.0.0:8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - Token lifetime in seconds (default: 3600)
//! * `API_STORAGE` - `memory` or `postgres` (default: memory)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_DB_MAX_CONNECTIONS` / `API_DB_MIN_CONNECTIONS` - pool size (default: 10 / 2)
//! * `API_DB_ACQUIRE_TIMEOUT_SECS` - wait for a free connection (default: 30)
//! * `API_DB_MAX_LIFETIME_SECS` / `API_DB_IDLE_TIMEOUT_SECS` - recycling, 0 disables (default: 1800 / 600)
//! * `API_LOG_LEVEL` - trace, debug, info, warn, error (default: info)
//! * `API_LOG_JSON` - emit JSON log lines (default: false)
//! * `API_CURRENCY` - ISO code amounts are recorded in (default: INR)
//! * `API_CONSULTATION_FEE` - fee used when a bill names none (default: 500)
//! * `API_ADMIN_USERNAME` / `API_ADMIN_PASSWORD` - operator login

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use infra_db::{create_pool, run_migrations, MemoryStore, PgStore};
use interface_api::config::{ApiConfig, StorageBackend};
use interface_api::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid API_* configuration")?;

    init_tracing(&config.log_level, config.log_json);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        storage = ?config.storage,
        currency = %config.currency.code(),
        "Starting clinic ledger API server"
    );

    let state = match config.storage {
        StorageBackend::Memory => AppState::new(Arc::new(MemoryStore::new()), config.clone()),
        StorageBackend::Postgres => {
            let pool = create_pool(config.database_config())
                .await
                .context("failed to connect to PostgreSQL")?;
            run_migrations(&pool).await.context("failed to run migrations")?;
            AppState::new(Arc::new(PgStore::new(pool)), config.clone())
        }
    };

    let app = create_router(state);

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber; `RUST_LOG` overrides `log_level`
fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Waits for Ctrl+C or SIGTERM so in-flight requests can finish
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
