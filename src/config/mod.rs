use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Runtime configuration, resolved once at startup and injected into the
/// application state alongside the route table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub http_port: u16,
    /// Key for the password digest. Override in any real deployment.
    pub hashing_secret: String,
    /// Maximum number of checks a single user may own at once.
    pub max_checks: usize,
    /// Token lifetime in seconds. Applies to creation and extension.
    pub token_ttl_secs: i64,
    /// Root directory of the file-backed record store.
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("UPTIME_PORT").or_else(|_| env::var("PORT")) {
            self.http_port = v.parse().unwrap_or(self.http_port);
        }
        if let Ok(v) = env::var("UPTIME_HASHING_SECRET") {
            if !v.is_empty() {
                self.hashing_secret = v;
            }
        }
        if let Ok(v) = env::var("UPTIME_MAX_CHECKS") {
            self.max_checks = v.parse().unwrap_or(self.max_checks);
        }
        if let Ok(v) = env::var("UPTIME_TOKEN_TTL_SECS") {
            self.token_ttl_secs = v.parse().unwrap_or(self.token_ttl_secs);
        }
        if let Ok(v) = env::var("UPTIME_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            http_port: 3000,
            hashing_secret: "thisIsASecret".to_string(),
            max_checks: 5,
            token_ttl_secs: 60 * 60,
            data_dir: PathBuf::from(".data"),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            http_port: 5000,
            hashing_secret: "thisIsAlsoASecret".to_string(),
            max_checks: 5,
            token_ttl_secs: 60 * 60,
            data_dir: PathBuf::from(".data"),
        }
    }
}
