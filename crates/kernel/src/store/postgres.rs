//! PostgreSQL catalog store.

use async_trait::async_trait;
use sea_query::{Value, Values};
use serde_json::Value as JsonValue;
use sqlx::postgres::PgArguments;
use sqlx::{Arguments, PgPool};
use tracing::debug;

use super::query_builder::{BOOKS_TABLE, BookQueryBuilder, POSITION_COLUMN, Statement};
use super::{CatalogStore, StoreError, StoreResult};
use crate::catalog::{BookFilter, BookQuery, CuratedList};
use crate::models::{CuratedEntry, SearchWordCounter};

/// SQLSTATE for a missing relation.
const UNDEFINED_TABLE: &str = "42P01";

/// Catalog store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    /// Create a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run a row lookup whose single column is the row's JSON object.
    async fn fetch_json(&self, (sql, values): Statement) -> StoreResult<Vec<JsonValue>> {
        debug!(sql = %sql, params = values.0.len(), "catalog query");
        let rows = sqlx::query_scalar_with::<_, JsonValue, _>(&sql, bind_values(values)?)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

/// Convert SeaQuery values into sqlx arguments.
fn bind_values(values: Values) -> StoreResult<PgArguments> {
    let mut args = PgArguments::default();
    for value in values.0 {
        let added = match value {
            Value::Bool(v) => args.add(v),
            Value::Int(v) => args.add(v),
            Value::BigInt(v) => args.add(v),
            Value::BigUnsigned(v) => {
                let v = v
                    .map(i64::try_from)
                    .transpose()
                    .map_err(|e| StoreError::Bind(e.to_string()))?;
                args.add(v)
            }
            Value::String(v) => args.add(v.map(|s| *s)),
            other => return Err(StoreError::Bind(format!("unsupported value {other:?}"))),
        };
        added.map_err(|e| StoreError::Bind(e.to_string()))?;
    }
    Ok(args)
}

fn is_undefined_table(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNDEFINED_TABLE)
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn select_books(&self, query: &BookQuery) -> StoreResult<Vec<JsonValue>> {
        self.fetch_json(BookQueryBuilder::select(query)).await
    }

    async fn count_books(&self, filter: &BookFilter) -> StoreResult<i64> {
        let (sql, values) = BookQueryBuilder::count(filter);
        let total = sqlx::query_scalar_with::<_, i64, _>(&sql, bind_values(values)?)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn distinct_classes(&self, filter: &BookFilter) -> StoreResult<Vec<String>> {
        let (sql, values) = BookQueryBuilder::distinct_classes(filter);
        let classes = sqlx::query_scalar_with::<_, String, _>(&sql, bind_values(values)?)
            .fetch_all(&self.pool)
            .await?;
        Ok(classes)
    }

    async fn hot_words(&self, limit: u64) -> StoreResult<Vec<String>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let words = sqlx::query_scalar::<_, String>(
            "SELECT word FROM search_words ORDER BY count DESC, word LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(words)
    }

    async fn select_chapters(&self, table: &str) -> StoreResult<Option<Vec<JsonValue>>> {
        match self.fetch_json(BookQueryBuilder::chapters(table)).await {
            Ok(rows) => Ok(Some(rows)),
            Err(StoreError::Database(e)) if is_undefined_table(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn replace_curated(&self, list: CuratedList, entries: &[CuratedEntry]) -> StoreResult<()> {
        let table = list.table();
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!("DELETE FROM \"{table}\""))
            .execute(&mut *tx)
            .await?;

        if !entries.is_empty() {
            let positions: Vec<i32> = (0..entries.len())
                .map(|i| i32::try_from(i).unwrap_or(i32::MAX))
                .collect();
            let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();

            if list.is_annotated() {
                let words: Vec<&str> = entries.iter().map(|e| e.rwords.as_str()).collect();
                let users: Vec<&str> = entries.iter().map(|e| e.ruser.as_str()).collect();
                sqlx::query(&format!(
                    "INSERT INTO \"{table}\" ({POSITION_COLUMN}, book_id, rwords, ruser) \
                     SELECT * FROM UNNEST($1::int4[], $2::text[], $3::text[], $4::text[])"
                ))
                .bind(&positions)
                .bind(&ids)
                .bind(&words)
                .bind(&users)
                .execute(&mut *tx)
                .await?;
            } else {
                sqlx::query(&format!(
                    "INSERT INTO \"{table}\" ({POSITION_COLUMN}, book_id) \
                     SELECT * FROM UNNEST($1::int4[], $2::text[])"
                ))
                .bind(&positions)
                .bind(&ids)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        debug!(list = list.token(), entries = entries.len(), "curated list replaced");
        Ok(())
    }

    async fn increment_searches(&self, ids: &[String]) -> StoreResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(&format!(
            "UPDATE {BOOKS_TABLE} SET total_searches = total_searches + 1 WHERE id = ANY($1)"
        ))
        .bind(ids)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn increment_search_word(&self, word: &str) -> StoreResult<SearchWordCounter> {
        let (word, count) = sqlx::query_as::<_, (String, i64)>(
            r#"
            INSERT INTO search_words (word, count)
            VALUES ($1, 1)
            ON CONFLICT (word) DO UPDATE SET count = search_words.count + 1
            RETURNING word, count
            "#,
        )
        .bind(word)
        .fetch_one(&self.pool)
        .await?;
        Ok(SearchWordCounter { word, count })
    }

    async fn increment_reads(&self, id: &str) -> StoreResult<Option<JsonValue>> {
        let row = sqlx::query_scalar::<_, JsonValue>(&format!(
            "UPDATE {BOOKS_TABLE} b SET total_reads = total_reads + 1 WHERE id = $1 \
             RETURNING row_to_json(b)"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
