//! Query plans for book lookups.
//!
//! The composer turns a category, gender, finished flag and page index into
//! a [`BookQuery`]. Plans carry values, never SQL; the storage layer decides
//! how to execute them and binds every value.

use super::PAGE_SIZE;
use super::category::{self, CuratedList, OrderKey, RowShape};

/// Gender tag that narrows results.
pub const GENDER_GIRL: &str = "girl";

/// Predicates applied to the books table. All present predicates are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    /// Exact gender tag.
    pub gender: Option<String>,
    /// Only finished books.
    pub finished: bool,
    /// Exact class label.
    pub class: Option<String>,
    /// LIKE pattern matched against author, name or class (any of them).
    pub pattern: Option<String>,
}

impl BookFilter {
    /// Gender and finished predicates shared by every category.
    pub fn for_reader(gender: &str, finished: bool) -> Self {
        Self {
            gender: (gender == GENDER_GIRL).then(|| GENDER_GIRL.to_string()),
            finished,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Table the books come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSource {
    /// The books table alone.
    Books,
    /// Books joined with a curated list, in list order.
    Curated(CuratedList),
}

/// LIMIT/OFFSET window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

impl Page {
    /// Window for a 0-based page index. Negative indices clamp to 0.
    pub fn at(index: i64) -> Self {
        Self {
            limit: PAGE_SIZE,
            offset: page_offset(index),
        }
    }
}

/// Largest offset a window may carry; PostgreSQL offsets are `bigint`.
pub const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// Offset of a 0-based page index.
///
/// Pages whose offset would not fit saturate at [`MAX_OFFSET`], past the
/// end of any table.
pub fn page_offset(index: i64) -> u64 {
    clamp_page(index)
        .checked_mul(PAGE_SIZE)
        .map_or(MAX_OFFSET, |offset| offset.min(MAX_OFFSET))
}

/// Clamp a page index to be non-negative.
pub fn clamp_page(index: i64) -> u64 {
    u64::try_from(index).unwrap_or(0)
}

/// A complete book lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookQuery {
    pub source: BookSource,
    pub filter: BookFilter,
    /// Descending sort key; `None` keeps the source order.
    pub order: Option<OrderKey>,
    /// Window; `None` returns every match.
    pub page: Option<Page>,
    pub shape: RowShape,
}

impl BookQuery {
    /// Plain lookup of the books table.
    pub fn books(filter: BookFilter) -> Self {
        Self {
            source: BookSource::Books,
            filter,
            order: None,
            page: None,
            shape: RowShape::Base,
        }
    }

    /// Books on a curated list, in list order, with the list's row shape.
    pub fn curated(list: CuratedList, filter: BookFilter) -> Self {
        Self {
            source: BookSource::Curated(list),
            shape: category::resolve(list.token()).shape,
            ..Self::books(filter)
        }
    }

    pub fn ordered_by(mut self, order: OrderKey) -> Self {
        self.order = Some(order);
        self
    }

    pub fn paged(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }
}

/// Compose the lookup for a category listing.
///
/// Curated categories join their list and return it whole, in list order.
/// Dynamic categories sort by their counter and page through the books
/// table; tokens outside the category table also restrict to that class.
pub fn compose(category: &str, gender: &str, finished: bool, page: i64) -> BookQuery {
    let resolution = category::resolve(category);
    let mut filter = BookFilter::for_reader(gender, finished);

    match resolution.curated_list() {
        Some(list) => BookQuery::curated(list, filter),
        None => {
            filter.class = resolution.class_scope;
            BookQuery {
                source: BookSource::Books,
                filter,
                order: Some(resolution.order.unwrap_or(OrderKey::Score)),
                page: Some(Page::at(page)),
                shape: resolution.shape,
            }
        }
    }
}
