use std::sync::Arc;

use anyhow::{Context, Result};
use uptime_api::config::{AppConfig, Environment};
use uptime_api::server::{app, AppState};
use uptime_api::storage::file::FileStore;

/// A full application instance listening on a private port, backed by a
/// scratch data directory that lives as long as the server handle.
pub struct TestServer {
    pub base_url: String,
    _data_dir: tempfile::TempDir,
}

pub async fn spawn() -> Result<TestServer> {
    spawn_with_max_checks(5).await
}

pub async fn spawn_with_max_checks(max_checks: usize) -> Result<TestServer> {
    // Pick an unused port for isolation
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let data_dir = tempfile::tempdir().context("failed to create scratch data dir")?;

    let config = AppConfig {
        environment: Environment::Development,
        http_port: port,
        hashing_secret: "integration-test-secret".to_string(),
        max_checks,
        token_ttl_secs: 3600,
        data_dir: data_dir.path().to_path_buf(),
    };
    let storage = Arc::new(FileStore::new(config.data_dir.clone()));
    let state = AppState::new(config, storage);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app(state)).await {
            eprintln!("test server exited: {err}");
        }
    });

    Ok(TestServer {
        base_url,
        _data_dir: data_dir,
    })
}
