//! Book catalog models: books, chapters, curated entries and summaries.
//!
//! Books are plain values decoded fresh from storage on every request.
//! Chapters live in a per-book table addressed by [`chapter_table_name`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A serialized book as returned by catalog queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub name: String,
    pub author: String,
    pub author_avatar: String,
    pub abbreviation: String,
    pub cover: String,
    pub finished: bool,
    pub total_reads: i64,
    pub total_chars: i64,
    pub last_update_time: String,
    /// Category label ("class" column).
    pub class: String,
    pub total_searches: i64,
    pub total_votes: i64,
    pub last_chapter_title: String,
    pub last_chapter_url: String,
    pub with_vip_chapter: bool,
    pub gender: String,

    pub score: i64,

    /// Recommendation text, only set for director-curated entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rwords: Option<String>,

    /// Curator name, only set for director-curated entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ruser: Option<String>,
}

impl Book {
    /// Whether this book carries director annotation fields.
    pub fn is_annotated(&self) -> bool {
        self.rwords.is_some() && self.ruser.is_some()
    }
}

/// A chapter row from a book's chapter table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// Ordinal id assigned by the crawler.
    pub native_id: i64,
    pub id: String,
    pub title: String,
    pub url: String,
    pub vip: bool,
}

/// Name of the table holding a book's chapters.
///
/// Hex-encoded SHA-256 of the display name followed by the author.
pub fn chapter_table_name(name: &str, author: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(author.as_bytes());
    hex::encode(hasher.finalize())
}

/// One member of a curated recommendation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuratedEntry {
    pub id: String,

    #[serde(default)]
    pub rwords: String,

    #[serde(default)]
    pub ruser: String,
}

impl CuratedEntry {
    /// Plain entry without annotations.
    pub fn plain(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rwords: String::new(),
            ruser: String::new(),
        }
    }

    /// Director entry with recommendation words and curator.
    pub fn annotated(
        id: impl Into<String>,
        rwords: impl Into<String>,
        ruser: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            rwords: rwords.into(),
            ruser: ruser.into(),
        }
    }
}

/// Replacement payload for a curated list.
#[derive(Debug, Clone, Deserialize)]
pub struct CuratedSetRequest {
    pub clazz: String,
    #[serde(default)]
    pub books: Vec<CuratedEntry>,
}

/// Global search counter for one word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchWordCounter {
    pub word: String,
    pub count: i64,
}

/// Source site description handed through to clients unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentSpec {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub charset: String,
    #[serde(default)]
    pub chapter_prefix: String,
    #[serde(default)]
    pub ptype: String,
}

/// Aggregate view of the catalog for one filter combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BooksInfo {
    pub count: i64,
    pub pages: i64,
    pub clazzs: Vec<String>,
    pub content_spec: Vec<ContentSpec>,
    pub hot_words: Vec<String>,
}

/// Read-increment request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadRequest {
    #[serde(default)]
    pub book_id: String,
    #[serde(default)]
    pub client_id: String,
}

impl ReadRequest {
    /// Both the book and the client must be named.
    pub fn is_valid(&self) -> bool {
        !self.book_id.is_empty() && !self.client_id.is_empty()
    }
}
