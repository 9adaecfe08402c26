//! Catalog models.

pub mod book;

pub use book::{
    Book, BooksInfo, Chapter, ContentSpec, CuratedEntry, CuratedSetRequest, ReadRequest,
    SearchWordCounter, chapter_table_name,
};
