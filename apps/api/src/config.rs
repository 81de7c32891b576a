use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL history store. Unset means the in-process memory store.
    pub database_url: Option<String>,
    pub analyzer_url: String,
    pub analyzer_timeout: Duration,
    /// Allowed CORS origin. Unset means permissive CORS.
    pub client_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            analyzer_url: optional_env("ANALYZER_URL")
                .unwrap_or_else(|| "http://127.0.0.1:8000".to_string()),
            analyzer_timeout: Duration::from_secs(
                optional_env("ANALYZER_TIMEOUT_SECS")
                    .unwrap_or_else(|| "120".to_string())
                    .parse::<u64>()
                    .context("ANALYZER_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            client_url: optional_env("CLIENT_URL"),
            port: optional_env("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// Unset and blank are treated the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
