use std::sync::Arc;

use uptime_api::config::AppConfig;
use uptime_api::server::{app, AppState};
use uptime_api::storage::file::FileStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up UPTIME_* overrides
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!(
        environment = ?config.environment,
        port = config.http_port,
        data_dir = %config.data_dir.display(),
        "starting uptime API"
    );

    let storage = Arc::new(FileStore::new(config.data_dir.clone()));
    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let state = AppState::new(config, storage);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
