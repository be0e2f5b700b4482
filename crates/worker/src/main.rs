use std::sync::Arc;

use folio_core::versioning::VersioningEngine;
use folio_db::PgStore;
use folio_worker::WorkerConfig;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio_worker=debug,folio_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = folio_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    folio_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database connection pool created");

    let engine = Arc::new(
        VersioningEngine::new(PgStore::new(pool), config.tag_stats)
            .expect("Invalid tag statistics configuration"),
    );

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(folio_worker::run(
        engine,
        config.refresh_interval,
        cancel.clone(),
    ));

    shutdown_signal().await;
    cancel.cancel();

    match handle.await {
        Ok(stats) => tracing::info!(
            succeeded = stats.succeeded,
            failed = stats.failed,
            "Worker stopped"
        ),
        Err(e) => tracing::error!(error = %e, "Refresh task ended abnormally"),
    }
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
