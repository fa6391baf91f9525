//! Authenticity-review ticket HTTP server.
//!
//! Wires the review service to `PostgreSQL` and an S3-compatible object
//! store, then serves the REST surface until shutdown.

use detective_core::{ReviewService, SystemClock};
use detective_server::stores::{PostgresTicketStore, S3ImageStore};
use detective_server::{build_router, AppState, Config};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "detective_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting authenticity-review server");

    // Load configuration
    let config = Config::from_env();
    info!(
        postgres_url = %config.postgres.url,
        s3_endpoint = %config.blob.endpoint,
        s3_bucket = %config.blob.bucket,
        api_key_configured = config.auth.api_key.is_some(),
        "Configuration loaded"
    );

    // Connect to PostgreSQL
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .min_connections(config.postgres.min_connections)
        .acquire_timeout(Duration::from_secs(config.postgres.connect_timeout))
        .idle_timeout(Duration::from_secs(config.postgres.idle_timeout))
        .connect(&config.postgres.url)
        .await?;
    let ticket_store = PostgresTicketStore::new(pool);
    ticket_store.apply_schema().await?;
    info!("Database connected, schema applied");

    // Connect to object storage
    info!("Connecting to object storage...");
    let image_store = S3ImageStore::new(&config.blob);
    image_store.ensure_bucket().await?;
    info!("Object storage ready");

    // Assemble the review service
    let service = Arc::new(ReviewService::new(
        Arc::new(ticket_store),
        Arc::new(image_store),
        Arc::new(SystemClock),
    ));
    let state = AppState::new(service, config.auth.clone());

    // Build router and serve
    let app = build_router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Graceful shutdown on Ctrl+C (SIGINT) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
