//! Application composition root — wires store + issuer + router and runs
//! the HTTP server.

use std::sync::Arc;

use staffdesk_core::config::AppConfig;
use staffdesk_core::error::AppError;

use crate::router::build_router;
use crate::state::AppState;

/// Runs the StaffDesk server with the given configuration.
///
/// Connects to PostgreSQL, applies migrations, builds the application state,
/// and serves until a shutdown signal arrives.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting StaffDesk server...");

    let db_config = config
        .database
        .clone()
        .ok_or_else(|| AppError::configuration("database.url must be set to run the server"))?;

    let pool = staffdesk_store::connection::DatabasePool::connect(&db_config)
        .await?
        .into_pool();

    staffdesk_store::migration::run_migrations(&pool).await?;

    let credential_store = Arc::new(staffdesk_store::postgres::PgCredentialStore::new(pool));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, credential_store)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("StaffDesk server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    tracing::info!("StaffDesk server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
