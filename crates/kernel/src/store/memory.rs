//! In-memory catalog store.
//!
//! Holds books as JSON rows and evaluates query plans directly. Used by the
//! test suite and for running the server without a database
//! (`DATABASE_URL=memory://`).

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value as JsonValue;

use super::{CatalogStore, StoreError, StoreResult};
use crate::catalog::{BookFilter, BookQuery, BookSource, CuratedList, RowShape};
use crate::models::{CuratedEntry, SearchWordCounter};

#[derive(Default)]
struct Tables {
    books: Vec<JsonValue>,
    curated: HashMap<CuratedList, Vec<CuratedEntry>>,
    search_words: BTreeMap<String, i64>,
    chapters: HashMap<String, Vec<JsonValue>>,
}

/// Catalog store keeping every table in process memory.
#[derive(Default)]
pub struct MemoryCatalogStore {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a book row (keyed by its `id`).
    pub fn insert_book(&self, row: JsonValue) {
        let mut tables = self.tables.write();
        let id = str_field(&row, "id").to_string();
        match tables.books.iter_mut().find(|b| str_field(b, "id") == id) {
            Some(existing) => *existing = row,
            None => tables.books.push(row),
        }
    }

    /// Create a chapter table with the given rows.
    pub fn insert_chapters(&self, table: &str, rows: Vec<JsonValue>) {
        self.tables.write().chapters.insert(table.to_string(), rows);
    }

    /// Current row of a book.
    pub fn book(&self, id: &str) -> Option<JsonValue> {
        self.tables
            .read()
            .books
            .iter()
            .find(|b| str_field(b, "id") == id)
            .cloned()
    }

    /// Current membership of a curated list.
    pub fn curated(&self, list: CuratedList) -> Vec<CuratedEntry> {
        self.tables
            .read()
            .curated
            .get(&list)
            .cloned()
            .unwrap_or_default()
    }

    /// Current counter of a search word.
    pub fn search_word_count(&self, word: &str) -> Option<i64> {
        self.tables.read().search_words.get(word).copied()
    }

    /// Make every operation fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".to_string()));
        }
        Ok(())
    }
}

fn str_field<'a>(row: &'a JsonValue, column: &str) -> &'a str {
    row.get(column).and_then(JsonValue::as_str).unwrap_or_default()
}

fn int_field(row: &JsonValue, column: &str) -> i64 {
    row.get(column).and_then(JsonValue::as_i64).unwrap_or_default()
}

fn bool_field(row: &JsonValue, column: &str) -> bool {
    row.get(column).and_then(JsonValue::as_bool).unwrap_or_default()
}

fn increment(row: &mut JsonValue, column: &str) {
    let next = int_field(row, column) + 1;
    if let Some(obj) = row.as_object_mut() {
        obj.insert(column.to_string(), JsonValue::from(next));
    }
}

fn matches_filter(row: &JsonValue, filter: &BookFilter) -> bool {
    if let Some(ref gender) = filter.gender
        && str_field(row, "gender") != gender
    {
        return false;
    }
    if filter.finished && !bool_field(row, "finished") {
        return false;
    }
    if let Some(ref class) = filter.class
        && str_field(row, "class") != class
    {
        return false;
    }
    if let Some(ref pattern) = filter.pattern {
        return ["author", "name", "class"]
            .iter()
            .any(|column| like_match(pattern, str_field(row, column)));
    }
    true
}

/// SQL LIKE matching: `%` any run, `_` one character, `\` escapes.
pub fn like_match(pattern: &str, text: &str) -> bool {
    #[derive(Clone, Copy, PartialEq)]
    enum Token {
        Any,
        One,
        Lit(char),
    }

    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => Token::Any,
            '_' => Token::One,
            '\\' => Token::Lit(chars.next().unwrap_or('\\')),
            c => Token::Lit(c),
        });
    }
    let text: Vec<char> = text.chars().collect();

    // Greedy match with backtracking to the most recent `%`.
    let (mut t, mut p) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        match tokens.get(p) {
            Some(Token::Lit(c)) if *c == text[t] => {
                t += 1;
                p += 1;
            }
            Some(Token::One) => {
                t += 1;
                p += 1;
            }
            Some(Token::Any) => {
                star = Some((p, t));
                p += 1;
            }
            _ => match star {
                Some((sp, st)) => {
                    p = sp + 1;
                    t = st + 1;
                    star = Some((sp, st + 1));
                }
                None => return false,
            },
        }
    }
    tokens[p..].iter().all(|tok| *tok == Token::Any)
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn select_books(&self, query: &BookQuery) -> StoreResult<Vec<JsonValue>> {
        self.check()?;
        let tables = self.tables.read();

        let mut rows: Vec<JsonValue> = match query.source {
            BookSource::Books => tables
                .books
                .iter()
                .filter(|row| matches_filter(row, &query.filter))
                .cloned()
                .collect(),
            BookSource::Curated(list) => tables
                .curated
                .get(&list)
                .into_iter()
                .flatten()
                .filter_map(|entry| {
                    let book = tables.books.iter().find(|b| str_field(b, "id") == entry.id)?;
                    if !matches_filter(book, &query.filter) {
                        return None;
                    }
                    let mut row = book.clone();
                    if query.shape == RowShape::Annotated
                        && let Some(obj) = row.as_object_mut()
                    {
                        obj.insert("rwords".to_string(), JsonValue::from(entry.rwords.clone()));
                        obj.insert("ruser".to_string(), JsonValue::from(entry.ruser.clone()));
                    }
                    Some(row)
                })
                .collect(),
        };

        if let Some(order) = query.order {
            rows.sort_by_key(|row| std::cmp::Reverse(int_field(row, order.column())));
        }

        if let Some(page) = query.page {
            let offset = usize::try_from(page.offset).unwrap_or(usize::MAX);
            let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
            rows = rows.into_iter().skip(offset).take(limit).collect();
        }

        Ok(rows)
    }

    async fn count_books(&self, filter: &BookFilter) -> StoreResult<i64> {
        self.check()?;
        let count = self
            .tables
            .read()
            .books
            .iter()
            .filter(|row| matches_filter(row, filter))
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn distinct_classes(&self, filter: &BookFilter) -> StoreResult<Vec<String>> {
        self.check()?;
        let mut classes: Vec<String> = self
            .tables
            .read()
            .books
            .iter()
            .filter(|row| matches_filter(row, filter))
            .map(|row| str_field(row, "class").to_string())
            .filter(|class| !class.is_empty())
            .collect();
        classes.sort();
        classes.dedup();
        Ok(classes)
    }

    async fn hot_words(&self, limit: u64) -> StoreResult<Vec<String>> {
        self.check()?;
        let tables = self.tables.read();
        let mut words: Vec<(&String, &i64)> = tables.search_words.iter().collect();
        // BTreeMap iteration is word-ordered, so the stable sort keeps ties alphabetical.
        words.sort_by_key(|(_, count)| std::cmp::Reverse(**count));
        Ok(words
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|(word, _)| word.clone())
            .collect())
    }

    async fn select_chapters(&self, table: &str) -> StoreResult<Option<Vec<JsonValue>>> {
        self.check()?;
        let tables = self.tables.read();
        Ok(tables.chapters.get(table).map(|rows| {
            let mut rows = rows.clone();
            rows.sort_by_key(|row| int_field(row, "native_id"));
            rows
        }))
    }

    async fn replace_curated(&self, list: CuratedList, entries: &[CuratedEntry]) -> StoreResult<()> {
        self.check()?;
        self.tables.write().curated.insert(list, entries.to_vec());
        Ok(())
    }

    async fn increment_searches(&self, ids: &[String]) -> StoreResult<u64> {
        self.check()?;
        let mut tables = self.tables.write();
        let mut changed = 0;
        for row in tables
            .books
            .iter_mut()
            .filter(|row| ids.iter().any(|id| id == str_field(row, "id")))
        {
            increment(row, "total_searches");
            changed += 1;
        }
        Ok(changed)
    }

    async fn increment_search_word(&self, word: &str) -> StoreResult<SearchWordCounter> {
        self.check()?;
        let mut tables = self.tables.write();
        let count = tables.search_words.entry(word.to_string()).or_insert(0);
        *count += 1;
        Ok(SearchWordCounter {
            word: word.to_string(),
            count: *count,
        })
    }

    async fn increment_reads(&self, id: &str) -> StoreResult<Option<JsonValue>> {
        self.check()?;
        let mut tables = self.tables.write();
        Ok(tables
            .books
            .iter_mut()
            .find(|row| str_field(row, "id") == id)
            .map(|row| {
                increment(row, "total_reads");
                row.clone()
            }))
    }

    async fn ping(&self) -> bool {
        self.check().is_ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::catalog::{OrderKey, Page};
    use serde_json::json;

    fn book(id: &str, class: &str, score: i64) -> JsonValue {
        json!({"id": id, "name": format!("name-{id}"), "author": "author", "class": class,
               "gender": "boy", "finished": false, "score": score, "total_reads": 0})
    }

    #[test]
    fn like_matches_ordered_non_contiguous_characters() {
        assert!(like_match("%a%b%c%", "xaxbxc"));
        assert!(like_match("%a%b%c%", "abc"));
        assert!(!like_match("%a%b%c%", "cba"));
        assert!(!like_match("%a%b%c%", "ab"));
    }

    #[test]
    fn like_handles_unicode_and_escapes() {
        assert!(like_match("%唐%三%", "唐家三少"));
        assert!(!like_match("%三%唐%", "唐家三少"));
        assert!(like_match("%100\\%%", "100% done"));
        assert!(!like_match("%100\\%%", "1000 done"));
        assert!(like_match("a_c", "abc"));
        assert!(!like_match("a_c", "ac"));
        assert!(like_match("%", ""));
        assert!(!like_match("_", ""));
    }

    #[tokio::test]
    async fn select_orders_and_pages() {
        let store = MemoryCatalogStore::new();
        for i in 0..25 {
            store.insert_book(book(&format!("b{i}"), "c", i));
        }
        let plan = BookQuery::books(BookFilter::default())
            .ordered_by(OrderKey::Score)
            .paged(Page::at(1));
        let rows = store.select_books(&plan).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| str_field(r, "id")).collect();
        assert_eq!(ids, ["b4", "b3", "b2", "b1", "b0"]);
    }

    #[tokio::test]
    async fn curated_join_skips_missing_books() {
        let store = MemoryCatalogStore::new();
        store.insert_book(book("b1", "c", 1));
        store
            .replace_curated(
                CuratedList::Shelf,
                &[CuratedEntry::plain("ghost"), CuratedEntry::plain("b1")],
            )
            .await
            .unwrap();
        let plan = BookQuery {
            source: BookSource::Curated(CuratedList::Shelf),
            ..BookQuery::books(BookFilter::default())
        };
        let rows = store.select_books(&plan).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(str_field(&rows[0], "id"), "b1");
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = MemoryCatalogStore::new();
        store.set_unavailable(true);
        assert!(!store.ping().await);
        assert!(store.count_books(&BookFilter::default()).await.is_err());
        assert!(store.increment_search_word("w").await.is_err());
        store.set_unavailable(false);
        assert!(store.ping().await);
    }

    #[tokio::test]
    async fn hot_words_most_searched_first() {
        let store = MemoryCatalogStore::new();
        for word in ["b", "a", "a", "c", "c", "c"] {
            store.increment_search_word(word).await.unwrap();
        }
        assert_eq!(store.hot_words(2).await.unwrap(), ["c", "a"]);
    }
}
