//! Row decoding.
//!
//! Storage hands back rows as JSON objects. A row that fails to decode is
//! logged and skipped; the rest of the page is still returned.

use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::warn;

use super::category::RowShape;
use crate::models::{Book, Chapter};

/// A row that could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeWarning {
    #[error("row {index} is malformed: {source}")]
    Malformed {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("row {index} lacks director annotations")]
    MissingAnnotation { index: usize },
}

/// Decode one book row in the given shape.
///
/// Base rows never carry annotations, even if the row has the columns.
/// Annotated rows must have both.
pub fn decode_book(index: usize, row: JsonValue, shape: RowShape) -> Result<Book, DecodeWarning> {
    let mut book: Book =
        serde_json::from_value(row).map_err(|source| DecodeWarning::Malformed { index, source })?;

    match shape {
        RowShape::Base => {
            book.rwords = None;
            book.ruser = None;
        }
        RowShape::Annotated => {
            if !book.is_annotated() {
                return Err(DecodeWarning::MissingAnnotation { index });
            }
        }
    }

    Ok(book)
}

/// Decode a page of book rows, skipping rows that fail.
pub fn map_books(rows: Vec<JsonValue>, shape: RowShape) -> Vec<Book> {
    let total = rows.len();
    let books: Vec<Book> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(index, row)| match decode_book(index, row, shape) {
            Ok(book) => Some(book),
            Err(e) => {
                warn!(error = %e, "skipping book row");
                None
            }
        })
        .collect();

    if books.len() < total {
        warn!(
            decoded = books.len(),
            skipped = total - books.len(),
            "book rows partially decoded"
        );
    }
    books
}

/// Decode chapter rows, skipping rows that fail.
pub fn map_chapters(rows: Vec<JsonValue>) -> Vec<Chapter> {
    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| match serde_json::from_value::<Chapter>(row) {
            Ok(chapter) => Some(chapter),
            Err(source) => {
                let e = DecodeWarning::Malformed { index, source };
                warn!(error = %e, "skipping chapter row");
                None
            }
        })
        .collect()
}
