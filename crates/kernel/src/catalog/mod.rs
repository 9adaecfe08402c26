//! Catalog query engine.
//!
//! Resolves category tokens to query plans, maintains curated lists, runs
//! searches and keeps usage counters.

pub mod category;
pub mod counters;
pub mod curated;
pub mod info;
pub mod mapper;
pub mod query;
pub mod search;
mod service;

pub use category::{CuratedList, OrderKey, Resolution, RowShape, Strategy, resolve};
pub use counters::{CounterQueue, CounterSnapshot, DEFAULT_QUEUE_CAPACITY};
pub use mapper::DecodeWarning;
pub use query::{BookFilter, BookQuery, BookSource, Page, compose};
pub use search::{SearchPage, search_pattern};
pub use service::CatalogService;

/// Books per page.
pub const PAGE_SIZE: u64 = 20;
