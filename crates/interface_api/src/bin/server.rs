//! Tutor Desk - API Server Binary
//!
//! Starts the HTTP API for billing reports over the configured data environment.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin tutor-desk-api
//!
//! # Read the production data set with JSON logs
//! API_DATA_ENVIRONMENT=production API_LOG_FORMAT=json cargo run --bin tutor-desk-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 3600)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_DATA_ENVIRONMENT` - development, preproduction or production (default: development)
//! * `API_DEFAULT_TIMEZONE` - IANA zone for report days (default: UTC)
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `API_LOG_FORMAT` - text or json (default: text)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_billing::BillingService;
use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresBillingStore};
use interface_api::config::{ApiConfig, LogFormat};
use interface_api::create_router;

/// Main entry point for the API server.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded from environment
/// - Database connection or migrations fail
/// - Server fails to bind to the configured address
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("loading API configuration")?;

    init_tracing(&config.log_level, config.log_format);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        environment = %config.data_environment,
        timezone = %config.default_timezone.name(),
        "Starting Tutor Desk API Server"
    );

    let db_config = DatabaseConfig::new(config.database_url.clone())
        .environment(config.data_environment);
    let pool = create_pool(db_config)
        .await
        .context("connecting to database")?;

    run_migrations(&pool, config.data_environment)
        .await
        .context("running database migrations")?;

    let store = PostgresBillingStore::new(pool);
    let listener_task = store
        .spawn_change_listener()
        .await
        .context("starting change listener")?;

    let billing = BillingService::new(Arc::new(store));
    let app = create_router(billing, config.clone());

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .context("parsing server address")?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    listener_task.abort();
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }
}

/// Waits for Ctrl+C or SIGTERM so in-flight requests can finish.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
