//! Catalog service.
//!
//! Ties the resolver, composer, curated lists, search and counters to one
//! storage handle. Handlers hold a shared `CatalogService` through
//! [`AppState`](crate::state::AppState).

use std::sync::Arc;

use tracing::debug;

use super::category;
use super::counters::{self, CounterQueue};
use super::curated;
use super::info;
use super::mapper;
use super::query::{self, BookFilter};
use super::search::{self, SearchPage};
use crate::error::{CatalogError, CatalogResult};
use crate::models::{
    Book, BooksInfo, Chapter, ContentSpec, CuratedEntry, ReadRequest, chapter_table_name,
};
use crate::store::CatalogStore;

/// Catalog operations over one store.
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    counters: CounterQueue,
    content_spec: Vec<ContentSpec>,
}

impl CatalogService {
    /// Create the service and start its counter worker.
    pub fn new(
        store: Arc<dyn CatalogStore>,
        content_spec: Vec<ContentSpec>,
        counter_capacity: usize,
    ) -> Self {
        let counters = CounterQueue::start(Arc::clone(&store), counter_capacity);
        Self {
            store,
            counters,
            content_spec,
        }
    }

    pub fn store(&self) -> &dyn CatalogStore {
        self.store.as_ref()
    }

    pub fn counters(&self) -> &CounterQueue {
        &self.counters
    }

    /// One page of a category listing. `page` is 0-based.
    ///
    /// Curated categories return their whole list regardless of `page`.
    pub async fn list_books(
        &self,
        category: &str,
        gender: &str,
        finished: bool,
        page: i64,
    ) -> CatalogResult<Vec<Book>> {
        let books = match category::resolve(category).curated_list() {
            Some(list) => {
                let filter = BookFilter::for_reader(gender, finished);
                curated::query_curated_join(self.store.as_ref(), list, filter).await?
            }
            None => {
                let plan = query::compose(category, gender, finished, page);
                let rows = self.store.select_books(&plan).await?;
                mapper::map_books(rows, plan.shape)
            }
        };
        debug!(category, gender, finished, page, found = books.len(), "list books");
        Ok(books)
    }

    pub async fn books_info(
        &self,
        category: &str,
        gender: &str,
        finished: bool,
    ) -> CatalogResult<BooksInfo> {
        info::books_info(
            self.store.as_ref(),
            &self.content_spec,
            category,
            gender,
            finished,
        )
        .await
    }

    /// Search by key. `page` is 0-based.
    pub async fn search(&self, text: &str, page: i64) -> CatalogResult<SearchPage> {
        search::search(self.store.as_ref(), &self.counters, text, page).await
    }

    pub async fn replace_curated(&self, token: &str, entries: &[CuratedEntry]) -> CatalogResult<()> {
        curated::replace_set(self.store.as_ref(), token, entries).await
    }

    /// Chapters of the book with this name and author, in reading order.
    pub async fn chapters(&self, name: &str, author: &str) -> CatalogResult<Vec<Chapter>> {
        if name.is_empty() || author.is_empty() {
            return Err(CatalogError::invalid("book name and author are required"));
        }
        let table = chapter_table_name(name, author);
        let rows = self
            .store
            .select_chapters(&table)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("chapters of {name} by {author}")))?;
        Ok(mapper::map_chapters(rows))
    }

    pub async fn record_read(&self, request: &ReadRequest) -> CatalogResult<Book> {
        counters::record_read(self.store.as_ref(), request).await
    }

    /// Apply pending counter updates, then stop the worker.
    pub async fn shutdown(&self) {
        self.counters.shutdown().await;
    }
}
