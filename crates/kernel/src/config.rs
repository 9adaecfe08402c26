//! Configuration loaded from environment variables.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::catalog::DEFAULT_QUEUE_CAPACITY;
use crate::models::ContentSpec;

/// `DATABASE_URL` value selecting the in-memory store.
pub const MEMORY_DATABASE_URL: &str = "memory://";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 8999).
    pub port: u16,

    /// PostgreSQL connection URL, or `memory://` for the in-memory store.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Pending counter updates held before new ones are dropped (default: 1024).
    pub counter_queue_capacity: usize,

    /// JSON file with the content-spec list echoed by the info query.
    pub content_spec_path: Option<PathBuf>,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8999".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let counter_queue_capacity = env::var("COUNTER_QUEUE_CAPACITY")
            .map_or_else(|_| Ok(DEFAULT_QUEUE_CAPACITY), |v| v.parse())
            .context("COUNTER_QUEUE_CAPACITY must be a valid usize")?;

        let content_spec_path = env::var("CONTENT_SPEC_PATH")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|_| vec!["*".to_string()]);

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            counter_queue_capacity,
            content_spec_path,
            cors_allowed_origins,
        })
    }

    /// Whether the in-memory store was requested.
    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }

    /// Load the content-spec list, or an empty list when no file is configured.
    pub fn load_content_spec(&self) -> Result<Vec<ContentSpec>> {
        match &self.content_spec_path {
            Some(path) => read_content_spec(path),
            None => Ok(Vec::new()),
        }
    }
}

/// Parse a content-spec file holding a JSON array.
pub fn read_content_spec(path: &Path) -> Result<Vec<ContentSpec>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read content spec {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("content spec {} is not a JSON array", path.display()))
}
