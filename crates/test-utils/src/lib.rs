//! Book catalog test utilities.
//!
//! Fixture builders producing storage rows, and assertion helpers for the
//! JSON response envelope.

use serde_json::{Value as JsonValue, json};

/// Create a test book with default values.
pub fn test_book(id: &str) -> TestBook {
    TestBook {
        id: id.to_string(),
        name: format!("Book {id}"),
        author: "Anonymous".to_string(),
        class: "玄幻".to_string(),
        gender: "boy".to_string(),
        finished: false,
        total_reads: 0,
        total_chars: 0,
        total_searches: 0,
        total_votes: 0,
        score: 0,
    }
}

/// A test book builder for creating `books` rows.
#[derive(Debug, Clone)]
pub struct TestBook {
    pub id: String,
    pub name: String,
    pub author: String,
    pub class: String,
    pub gender: String,
    pub finished: bool,
    pub total_reads: i64,
    pub total_chars: i64,
    pub total_searches: i64,
    pub total_votes: i64,
    pub score: i64,
}

impl TestBook {
    /// Set the display name.
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn by(mut self, author: &str) -> Self {
        self.author = author.to_string();
        self
    }

    /// Set the class label.
    pub fn in_class(mut self, class: &str) -> Self {
        self.class = class.to_string();
        self
    }

    /// Tag for girl readers.
    pub fn for_girls(mut self) -> Self {
        self.gender = "girl".to_string();
        self
    }

    pub fn finished(mut self) -> Self {
        self.finished = true;
        self
    }

    pub fn with_score(mut self, score: i64) -> Self {
        self.score = score;
        self
    }

    pub fn with_reads(mut self, total_reads: i64) -> Self {
        self.total_reads = total_reads;
        self
    }

    pub fn with_votes(mut self, total_votes: i64) -> Self {
        self.total_votes = total_votes;
        self
    }

    pub fn with_searches(mut self, total_searches: i64) -> Self {
        self.total_searches = total_searches;
        self
    }

    pub fn with_chars(mut self, total_chars: i64) -> Self {
        self.total_chars = total_chars;
        self
    }

    /// The full 18-column row.
    pub fn row(&self) -> JsonValue {
        json!({
            "id": self.id,
            "name": self.name,
            "author": self.author,
            "author_avatar": "",
            "abbreviation": "",
            "cover": format!("/covers/{}.jpg", self.id),
            "finished": self.finished,
            "total_reads": self.total_reads,
            "total_chars": self.total_chars,
            "last_update_time": "2024-01-01 00:00:00",
            "class": self.class,
            "total_searches": self.total_searches,
            "total_votes": self.total_votes,
            "last_chapter_title": "",
            "last_chapter_url": "",
            "with_vip_chapter": false,
            "gender": self.gender,
            "score": self.score,
        })
    }
}

/// Create `count` chapter rows, numbered from 1.
pub fn test_chapters(count: i64) -> Vec<JsonValue> {
    (1..=count)
        .map(|n| {
            json!({
                "native_id": n,
                "id": format!("c{n}"),
                "title": format!("Chapter {n}"),
                "url": format!("/chapters/{n}.html"),
                "vip": n > 10,
            })
        })
        .collect()
}

/// Assertion helpers for the response envelope.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a JSON value lacks a specific key.
    pub fn lacks_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_none(),
            "Expected JSON to lack key '{key}', got: {value}"
        );
    }

    /// Assert a successful envelope and return its body.
    pub fn ok_body(envelope: &Value) -> &Value {
        code(envelope, 0);
        &envelope["body"]
    }

    /// Assert the envelope code.
    pub fn code(envelope: &Value, expected: i64) {
        assert_eq!(
            envelope["code"].as_i64(),
            Some(expected),
            "Unexpected envelope: {envelope}"
        );
    }

    /// Ids of the books in a JSON array, in order.
    pub fn book_ids(books: &Value) -> Vec<String> {
        books
            .as_array()
            .map(|books| {
                books
                    .iter()
                    .filter_map(|b| b["id"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}
