//! Storage collaborator for the catalog.
//!
//! The catalog core talks to storage only through [`CatalogStore`]. It hands
//! over typed plans ([`BookQuery`], [`BookFilter`]) rather than statement
//! text, so every value reaches the database as a bound parameter.
//!
//! Two implementations ship with the kernel:
//! - [`PgCatalogStore`]: PostgreSQL via sqlx, SQL built with SeaQuery.
//! - [`MemoryCatalogStore`]: in-process tables evaluating the same plans.

pub mod memory;
mod postgres;
pub mod query_builder;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;

pub use memory::MemoryCatalogStore;
pub use postgres::PgCatalogStore;

use crate::catalog::{BookFilter, BookQuery, CuratedList};
use crate::models::{CuratedEntry, SearchWordCounter};

/// Failure reported by the storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to bind query parameter: {0}")]
    Bind(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A row written by the store could not be read back.
    #[error("malformed row: {0}")]
    MalformedRow(String),
}

/// Result type alias using StoreError.
pub type StoreResult<T> = Result<T, StoreError>;

/// Narrow storage interface used by the catalog core.
///
/// Row-returning methods yield JSON objects keyed by column name; decoding
/// is the caller's job. Every mutating method is a single atomic statement
/// except [`replace_curated`](Self::replace_curated), which clears and
/// refills a list and is atomic only where the backend has transactions.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Rows for a book lookup, in the plan's order.
    async fn select_books(&self, query: &BookQuery) -> StoreResult<Vec<JsonValue>>;

    /// Number of books matching a filter.
    async fn count_books(&self, filter: &BookFilter) -> StoreResult<i64>;

    /// Distinct non-empty class labels among books matching a filter.
    async fn distinct_classes(&self, filter: &BookFilter) -> StoreResult<Vec<String>>;

    /// Most searched words first.
    async fn hot_words(&self, limit: u64) -> StoreResult<Vec<String>>;

    /// Chapter rows from a chapter table, or `None` if the table is absent.
    async fn select_chapters(&self, table: &str) -> StoreResult<Option<Vec<JsonValue>>>;

    /// Replace a curated list's membership with `entries`, in order.
    async fn replace_curated(&self, list: CuratedList, entries: &[CuratedEntry]) -> StoreResult<()>;

    /// Add one to `total_searches` of every listed book. Returns rows changed.
    async fn increment_searches(&self, ids: &[String]) -> StoreResult<u64>;

    /// Create the word's counter at one, or add one to it. Returns the new count.
    async fn increment_search_word(&self, word: &str) -> StoreResult<SearchWordCounter>;

    /// Add one to a book's `total_reads` and return the updated row.
    async fn increment_reads(&self, id: &str) -> StoreResult<Option<JsonValue>>;

    /// Whether the backend answers.
    async fn ping(&self) -> bool;
}
