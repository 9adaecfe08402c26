//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::catalog::{CatalogService, DEFAULT_QUEUE_CAPACITY};
use crate::config::Config;
use crate::db;
use crate::models::ContentSpec;
use crate::store::{CatalogStore, MemoryCatalogStore, PgCatalogStore};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Catalog operations and the counter worker.
    catalog: CatalogService,
}

impl AppState {
    /// Create application state from configuration.
    ///
    /// Connects to PostgreSQL and applies migrations, unless the in-memory
    /// store was requested.
    pub async fn new(config: &Config) -> Result<Self> {
        let store: Arc<dyn CatalogStore> = if config.uses_memory_store() {
            info!("using in-memory catalog store");
            Arc::new(MemoryCatalogStore::new())
        } else {
            let pool = db::create_pool(config)
                .await
                .context("failed to create database pool")?;

            db::run_migrations(&pool)
                .await
                .context("failed to run migrations")?;

            Arc::new(PgCatalogStore::new(pool))
        };

        let content_spec = config
            .load_content_spec()
            .context("failed to load content spec")?;
        info!(entries = content_spec.len(), "content spec loaded");

        Ok(Self::with_store(
            store,
            content_spec,
            config.counter_queue_capacity,
        ))
    }

    /// Create application state over an existing store.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn with_store(
        store: Arc<dyn CatalogStore>,
        content_spec: Vec<ContentSpec>,
        counter_capacity: usize,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                catalog: CatalogService::new(store, content_spec, counter_capacity),
            }),
        }
    }

    /// State over an in-memory store, with default settings.
    pub fn in_memory(store: Arc<MemoryCatalogStore>) -> Self {
        Self::with_store(store, Vec::new(), DEFAULT_QUEUE_CAPACITY)
    }

    /// Get the catalog service.
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }
}
