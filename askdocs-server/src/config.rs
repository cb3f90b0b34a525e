//! Environment configuration for the server binary.

use std::time::Duration;

use anyhow::{Context, Result};

/// Server configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub qdrant_url: String,
    pub openai_api_key: String,
    pub collection: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            qdrant_url: "http://localhost:6334".to_string(),
            openai_api_key: String::new(),
            collection: "documents".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            request_timeout: Duration::from_secs(30),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().with_context(|| format!("invalid value for {key}: {raw}")),
        Err(_) => Ok(default),
    }
}

impl ServerConfig {
    /// Read configuration from the environment.
    ///
    /// `OPENAI_API_KEY` is required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            host: env_or("ASKDOCS_HOST", &defaults.host),
            port: env_parsed("ASKDOCS_PORT", defaults.port)?,
            qdrant_url: env_or("QDRANT_URL", &defaults.qdrant_url),
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY environment variable not set")?,
            collection: env_or("COLLECTION_NAME", &defaults.collection),
            chunk_size: env_parsed("CHUNK_SIZE", defaults.chunk_size)?,
            chunk_overlap: env_parsed("CHUNK_OVERLAP", defaults.chunk_overlap)?,
            request_timeout: Duration::from_secs(env_parsed(
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
        })
    }
}
