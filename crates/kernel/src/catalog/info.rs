//! Catalog summary: counts, classes and hot words.

use tracing::debug;

use super::PAGE_SIZE;
use super::category;
use super::query::BookFilter;
use crate::error::CatalogResult;
use crate::models::{BooksInfo, ContentSpec};
use crate::store::CatalogStore;

/// Number of hot words returned.
pub const HOT_WORDS_LIMIT: u64 = 20;

/// Hot words used until any search has been recorded.
pub const DEFAULT_HOT_WORDS: [&str; 3] = ["唐家三少", "修真", "武侠仙侠"];

/// Page count for a total, as reported to clients.
///
/// Always one more than the number of full pages, so an exact multiple of
/// the page size reports a trailing empty page.
pub fn page_count(total: i64) -> i64 {
    let size = i64::try_from(PAGE_SIZE).unwrap_or(i64::MAX);
    total.max(0) / size + 1
}

/// Most searched words, or the default list when none are recorded.
pub async fn hot_words(store: &dyn CatalogStore) -> CatalogResult<Vec<String>> {
    let words = store.hot_words(HOT_WORDS_LIMIT).await?;
    if words.is_empty() {
        return Ok(DEFAULT_HOT_WORDS.iter().map(|w| (*w).to_string()).collect());
    }
    Ok(words)
}

/// Summarize the catalog for one category, gender and finished filter.
///
/// The count honours the category's class scope; the class list only the
/// gender and finished filters.
pub async fn books_info(
    store: &dyn CatalogStore,
    content_spec: &[ContentSpec],
    category_token: &str,
    gender: &str,
    finished: bool,
) -> CatalogResult<BooksInfo> {
    let reader = BookFilter::for_reader(gender, finished);
    let scoped = BookFilter {
        class: category::resolve(category_token).class_scope,
        ..reader.clone()
    };

    let count = store.count_books(&scoped).await?;
    let clazzs = store.distinct_classes(&reader).await?;
    let hot_words = hot_words(store).await?;

    debug!(category = category_token, count, classes = clazzs.len(), "books info");
    Ok(BooksInfo {
        count,
        pages: page_count(count),
        clazzs,
        content_spec: content_spec.to_vec(),
        hot_words,
    })
}
