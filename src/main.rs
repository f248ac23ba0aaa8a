use axum::{extract::Request, ServiceExt};
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;
use tracing_subscriber::EnvFilter;

use nodos_api::config;
use nodos_api::database::DatabaseManager;
use nodos_api::routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let config = config::config();

    // sqlx logs every statement at info under sqlx::query
    let default_filter = if config.database.enable_query_logging { "info" } else { "info,sqlx::query=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    config.validate()?;
    tracing::info!("Starting Nodos API in {:?} mode", config.environment);

    if config.database.run_migrations {
        // A down database must not keep the server from starting; /health reports it
        if let Err(e) = DatabaseManager::migrate().await {
            tracing::error!("Migrations not applied: {}", e);
        }
    }

    // Both /api/nodes and /api/nodes/ reach the same handler
    let app = NormalizePathLayer::trim_trailing_slash().layer(routes::app());

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Nodos API listening on http://{}", bind_addr);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    DatabaseManager::close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
