use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// JSON array of posts imported once, then renamed out of the way.
    pub seed_file: PathBuf,
    pub import_on_startup: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match std::env::var("APP_PORT") {
            Ok(v) => v.parse::<u16>().with_context(|| format!("APP_PORT={v}"))?,
            Err(_) => 3000,
        };
        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://group.db".into()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            seed_file: std::env::var("SEED_FILE")
                .unwrap_or_else(|_| "suits.json".into())
                .into(),
            import_on_startup: std::env::var("IMPORT_ON_STARTUP")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub cache_file: PathBuf,
    pub dedupe_interval: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:3000".into()),
            cache_file: std::env::var("CACHE_FILE")
                .unwrap_or_else(|_| ".vocab-cache.json".into())
                .into(),
            dedupe_interval: Duration::from_millis(
                std::env::var("CACHE_DEDUPE_MS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(1000),
            ),
        }
    }
}
