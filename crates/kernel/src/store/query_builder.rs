//! Book query builder using SeaQuery.
//!
//! Renders [`BookQuery`] and [`BookFilter`] plans into PostgreSQL statements
//! with `$n` placeholders. Values are returned separately for binding and
//! never appear in the statement text.

use sea_query::{
    Alias, Asterisk, Expr, Order, PostgresQueryBuilder, Query, SelectStatement,
    SimpleExpr, Values,
};

use crate::catalog::{BookFilter, BookQuery, BookSource, RowShape};

/// Main books table.
pub const BOOKS_TABLE: &str = "books";

/// Search word counters.
pub const SEARCH_WORDS_TABLE: &str = "search_words";

/// Column recording curated join order.
pub const POSITION_COLUMN: &str = "position";

/// The 18 book columns, in storage order.
pub const BOOK_COLUMNS: [&str; 18] = [
    "id",
    "name",
    "abbreviation",
    "author",
    "cover",
    "author_avatar",
    "finished",
    "total_reads",
    "total_chars",
    "last_update_time",
    "class",
    "total_searches",
    "total_votes",
    "last_chapter_title",
    "last_chapter_url",
    "with_vip_chapter",
    "gender",
    "score",
];

/// Director annotation columns on the director join table.
pub const ANNOTATION_COLUMNS: [&str; 2] = ["rwords", "ruser"];

/// Chapter columns, in storage order.
pub const CHAPTER_COLUMNS: [&str; 5] = ["native_id", "id", "title", "url", "vip"];

/// Alias of the JSON object column in row lookups.
pub const ROW_ALIAS: &str = "row";

/// A rendered statement and the values to bind to it.
pub type Statement = (String, Values);

/// Query builder for book lookups.
pub struct BookQueryBuilder;

impl BookQueryBuilder {
    /// Build the SELECT for a book lookup.
    ///
    /// Each result row is one JSON object, built in the same statement that
    /// orders and pages the rows.
    pub fn select(plan: &BookQuery) -> Statement {
        let mut query = Query::select();
        let mut fields: Vec<(&str, &str)> =
            BOOK_COLUMNS.iter().map(|c| (BOOKS_TABLE, *c)).collect();
        query.from(Alias::new(BOOKS_TABLE));

        if let BookSource::Curated(list) = plan.source {
            let table = list.table();
            query.inner_join(
                Alias::new(table),
                Expr::col((Alias::new(BOOKS_TABLE), Alias::new("id")))
                    .equals((Alias::new(table), Alias::new("book_id"))),
            );
            if plan.shape == RowShape::Annotated {
                fields.extend(ANNOTATION_COLUMNS.iter().map(|c| (table, *c)));
            }
        }
        query.expr_as(json_row(&fields), Alias::new(ROW_ALIAS));

        Self::add_filter(&mut query, &plan.filter);

        match (plan.order, plan.source) {
            (Some(order), _) => {
                query.order_by(
                    (Alias::new(BOOKS_TABLE), Alias::new(order.column())),
                    Order::Desc,
                );
            }
            (None, BookSource::Curated(list)) => {
                query.order_by(
                    (Alias::new(list.table()), Alias::new(POSITION_COLUMN)),
                    Order::Asc,
                );
            }
            (None, BookSource::Books) => {}
        }

        if let Some(page) = plan.page {
            query.limit(page.limit);
            query.offset(page.offset);
        }

        query.build(PostgresQueryBuilder)
    }

    /// Build a COUNT over the books table.
    pub fn count(filter: &BookFilter) -> Statement {
        let mut query = Query::select();
        query.expr(Expr::col(Asterisk).count());
        query.from(Alias::new(BOOKS_TABLE));
        Self::add_filter(&mut query, filter);
        query.build(PostgresQueryBuilder)
    }

    /// Build the distinct class label lookup.
    pub fn distinct_classes(filter: &BookFilter) -> Statement {
        let mut query = Query::select();
        query
            .distinct()
            .column((Alias::new(BOOKS_TABLE), Alias::new("class")))
            .from(Alias::new(BOOKS_TABLE))
            .and_where(Expr::col((Alias::new(BOOKS_TABLE), Alias::new("class"))).ne(""));
        Self::add_filter(&mut query, filter);
        query.order_by((Alias::new(BOOKS_TABLE), Alias::new("class")), Order::Asc);
        query.build(PostgresQueryBuilder)
    }

    /// Build the chapter listing for a chapter table, one JSON object per row.
    ///
    /// The table name is quoted as an identifier.
    pub fn chapters(table: &str) -> Statement {
        let fields: Vec<(&str, &str)> = CHAPTER_COLUMNS.iter().map(|c| (table, *c)).collect();
        let mut query = Query::select();
        query
            .expr_as(json_row(&fields), Alias::new(ROW_ALIAS))
            .from(Alias::new(table))
            .order_by(Alias::new("native_id"), Order::Asc);
        query.build(PostgresQueryBuilder)
    }

    /// AND every present predicate into the WHERE clause.
    fn add_filter(query: &mut SelectStatement, filter: &BookFilter) {
        if let Some(ref gender) = filter.gender {
            query.and_where(Self::col("gender").eq(gender.as_str()));
        }
        if filter.finished {
            query.and_where(Self::col("finished").eq(true));
        }
        if let Some(ref class) = filter.class {
            query.and_where(Self::col("class").eq(class.as_str()));
        }
        if let Some(ref pattern) = filter.pattern {
            query.and_where(Self::pattern_condition(pattern));
        }
    }

    /// Author, name or class matches the LIKE pattern.
    fn pattern_condition(pattern: &str) -> SimpleExpr {
        Self::col("author")
            .like(pattern)
            .or(Self::col("name").like(pattern))
            .or(Self::col("class").like(pattern))
    }

    fn col(column: &str) -> Expr {
        Expr::col((Alias::new(BOOKS_TABLE), Alias::new(column)))
    }
}

/// `json_build_object` over `(table, column)` pairs, keyed by column name.
///
/// Only called with the fixed column lists above and a chapter table name,
/// which is quoted like any identifier.
fn json_row(fields: &[(&str, &str)]) -> SimpleExpr {
    let args: Vec<String> = fields
        .iter()
        .map(|(table, column)| {
            let table = table.replace('"', "\"\"");
            format!("'{column}', \"{table}\".\"{column}\"")
        })
        .collect();
    Expr::cust(format!("json_build_object({})", args.join(", ")))
}
