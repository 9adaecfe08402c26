//! Category token resolution.
//!
//! Every known token is a row in [`CATEGORY_TABLE`]. New categories are
//! added as rows; nothing else in the catalog branches on token strings.

use serde::{Deserialize, Serialize};

/// How a category's books are selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Filter the books table and sort by a counter.
    DynamicFilter,
    /// Join the books table with a curated membership list.
    CuratedJoin(CuratedList),
}

/// Column layout of the rows a category returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShape {
    /// The 18 book columns.
    Base,
    /// Book columns plus `rwords` and `ruser`.
    Annotated,
}

/// Sort key for dynamic categories. Always descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKey {
    TotalVotes,
    TotalReads,
    TotalSearches,
    TotalChars,
    Score,
}

impl OrderKey {
    /// Column sorted on.
    pub fn column(self) -> &'static str {
        match self {
            Self::TotalVotes => "total_votes",
            Self::TotalReads => "total_reads",
            Self::TotalSearches => "total_searches",
            Self::TotalChars => "total_chars",
            Self::Score => "score",
        }
    }
}

/// The editorially maintained recommendation lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CuratedList {
    FrontPage,
    Girl,
    Shelf,
    Director,
    Finished,
}

impl CuratedList {
    pub const ALL: [CuratedList; 5] = [
        Self::FrontPage,
        Self::Girl,
        Self::Shelf,
        Self::Director,
        Self::Finished,
    ];

    /// Category token selecting this list.
    pub fn token(self) -> &'static str {
        match self {
            Self::FrontPage => "fprecommend",
            Self::Girl => "girlrecommend",
            Self::Shelf => "shelfrecommend",
            Self::Director => "directorrecommend",
            Self::Finished => "finishedrecommend",
        }
    }

    /// Backing join table.
    pub fn table(self) -> &'static str {
        match self {
            Self::FrontPage => "main_recommend_books",
            Self::Girl => "girl_recommend_books",
            Self::Shelf => "shelf_recommend_books",
            Self::Director => "director_recommend_books",
            Self::Finished => "finished_recommend_books",
        }
    }

    /// Whether entries carry recommendation words and a curator.
    pub fn is_annotated(self) -> bool {
        matches!(self, Self::Director)
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|list| list.token() == token)
    }
}

/// A row of the category table.
#[derive(Debug, Clone, Copy)]
struct CategoryEntry {
    token: &'static str,
    strategy: Strategy,
    shape: RowShape,
    order: Option<OrderKey>,
}

const fn dynamic(token: &'static str, order: OrderKey) -> CategoryEntry {
    CategoryEntry {
        token,
        strategy: Strategy::DynamicFilter,
        shape: RowShape::Base,
        order: Some(order),
    }
}

const fn curated(list: CuratedList, token: &'static str, shape: RowShape) -> CategoryEntry {
    CategoryEntry {
        token,
        strategy: Strategy::CuratedJoin(list),
        shape,
        order: None,
    }
}

const CATEGORY_TABLE: &[CategoryEntry] = &[
    dynamic("recommend", OrderKey::TotalReads),
    dynamic("votes", OrderKey::TotalVotes),
    dynamic("reads", OrderKey::TotalReads),
    dynamic("searches", OrderKey::TotalSearches),
    dynamic("chars", OrderKey::TotalChars),
    dynamic("traces", OrderKey::TotalReads),
    dynamic("score", OrderKey::Score),
    curated(CuratedList::FrontPage, "fprecommend", RowShape::Base),
    curated(CuratedList::Girl, "girlrecommend", RowShape::Base),
    curated(CuratedList::Shelf, "shelfrecommend", RowShape::Base),
    curated(CuratedList::Director, "directorrecommend", RowShape::Annotated),
    curated(CuratedList::Finished, "finishedrecommend", RowShape::Base),
];

/// Outcome of resolving a category token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub strategy: Strategy,
    pub shape: RowShape,
    /// Sort key; `None` keeps curated join order.
    pub order: Option<OrderKey>,
    /// Class label the results are restricted to, for tokens that are not
    /// in the table.
    pub class_scope: Option<String>,
}

impl Resolution {
    pub fn curated_list(&self) -> Option<CuratedList> {
        match self.strategy {
            Strategy::CuratedJoin(list) => Some(list),
            Strategy::DynamicFilter => None,
        }
    }
}

/// Resolve a category token.
///
/// Unknown tokens are treated as a class label: dynamic strategy, ordered by
/// score, restricted to that class. The empty token is the unscoped default.
pub fn resolve(token: &str) -> Resolution {
    if let Some(entry) = CATEGORY_TABLE.iter().find(|e| e.token == token) {
        return Resolution {
            strategy: entry.strategy,
            shape: entry.shape,
            order: entry.order,
            class_scope: None,
        };
    }

    Resolution {
        strategy: Strategy::DynamicFilter,
        shape: RowShape::Base,
        order: Some(OrderKey::Score),
        class_scope: (!token.is_empty()).then(|| token.to_string()),
    }
}
