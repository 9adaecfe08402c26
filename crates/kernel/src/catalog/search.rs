//! Substring search over author, name and class.
//!
//! The key is spread into an ordered wildcard pattern: `"abc"` becomes
//! `%a%b%c%`, which matches any text containing `a`, then `b`, then `c`.

use serde::Serialize;
use tracing::debug;

use super::category::{OrderKey, RowShape};
use super::counters::CounterQueue;
use super::mapper;
use super::query::{BookFilter, BookQuery, Page};
use crate::error::CatalogResult;
use crate::models::Book;
use crate::store::CatalogStore;

/// One page of search results.
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub books: Vec<Book>,
    /// Total matches; only computed for the first page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<i64>,
}

/// Build the LIKE pattern for a search key.
///
/// Returns `None` for an empty key. LIKE metacharacters in the key match
/// literally.
pub fn search_pattern(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    let mut pattern = String::with_capacity(text.len() * 2 + 1);
    for c in text.chars() {
        pattern.push('%');
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Some(pattern)
}

/// Search books by key.
///
/// `page` is 0-based. Counter updates for a non-empty key are queued once
/// the page is fetched; the call does not wait for them.
pub async fn search(
    store: &dyn CatalogStore,
    counters: &CounterQueue,
    text: &str,
    page: i64,
) -> CatalogResult<SearchPage> {
    let filter = BookFilter {
        pattern: search_pattern(text),
        ..Default::default()
    };

    let total_count = if page <= 0 {
        Some(store.count_books(&filter).await?)
    } else {
        None
    };

    let plan = BookQuery::books(filter)
        .ordered_by(OrderKey::Score)
        .paged(Page::at(page));
    let rows = store.select_books(&plan).await?;
    let books = mapper::map_books(rows, RowShape::Base);

    if !text.is_empty() {
        counters.record_search(&books, text);
    }

    debug!(key = %text, page, found = books.len(), ?total_count, "search");
    Ok(SearchPage { books, total_count })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::memory::like_match;

    #[test]
    fn pattern_interleaves_wildcards() {
        assert_eq!(search_pattern("abc").as_deref(), Some("%a%b%c%"));
        assert_eq!(search_pattern("斗罗").as_deref(), Some("%斗%罗%"));
    }

    #[test]
    fn pattern_matches_characters_in_order() {
        let pattern = search_pattern("abc").unwrap();
        for text in ["abc", "xaxbxc", "aabbcc", "a-b-c-d"] {
            assert!(like_match(&pattern, text), "{text}");
        }
        for text in ["cba", "ab", "acb", ""] {
            assert!(!like_match(&pattern, text), "{text}");
        }
    }

    #[test]
    fn metacharacters_match_literally() {
        let pattern = search_pattern("5%_").unwrap();
        assert_eq!(pattern, "%5%\\%%\\_%");
        assert!(like_match(&pattern, "x5 %off_"));
        assert!(!like_match(&pattern, "5 off x"));
    }

    #[test]
    fn empty_key_has_no_pattern() {
        assert_eq!(search_pattern(""), None);
    }
}
