//! Book collection endpoints.
//!
//! - `GET /books?a=l|c|s&p=&c=&g=&f=`: list, info or search.
//! - `POST /books`: replace a curated list.

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{Book, CuratedSetRequest};
use crate::routes::ApiCommand;
use crate::routes::response::ApiResponse;
use crate::state::AppState;

/// Create the books router.
pub fn router() -> Router<AppState> {
    Router::new().route("/books", get(books_get).post(books_post))
}

/// Query string of `GET /books`.
#[derive(Debug, Default, Deserialize)]
pub struct BooksParams {
    /// Action: `l` list, `c` info, `s` search.
    pub a: Option<String>,
    /// 1-based page number.
    pub p: Option<String>,
    /// Category token, or the key when searching.
    pub c: Option<String>,
    /// Gender token.
    pub g: Option<String>,
    /// Finished flag.
    pub f: Option<String>,
}

#[derive(Debug, Serialize)]
struct BooksListBody {
    books: Vec<Book>,
}

/// Convert a 1-based page parameter to a 0-based index.
///
/// A missing page is the first page.
pub fn parse_page(raw: Option<&str>) -> AppResult<i64> {
    match raw {
        None => Ok(0),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map(|p| p.saturating_sub(1).max(0))
            .map_err(|e| AppError::BadRequest(format!("p: {e}"))),
    }
}

async fn books_get(
    State(state): State<AppState>,
    params: Result<Query<BooksParams>, QueryRejection>,
) -> AppResult<Response> {
    let Query(params) = params.map_err(|e| AppError::Unreadable(e.body_text()))?;

    let page = parse_page(params.p.as_deref())?;
    let category = params.c.as_deref().unwrap_or_default();
    let gender = params.g.as_deref().unwrap_or("default");
    let finished = params.f.as_deref() == Some("true");
    let catalog = state.catalog();

    match params.a.as_deref().unwrap_or("c") {
        "l" => {
            let books = catalog
                .list_books(category, gender, finished, page)
                .await?;
            Ok(ApiResponse::ok(BooksListBody { books }).into_response())
        }
        "c" => {
            let info = catalog.books_info(category, gender, finished).await?;
            Ok(ApiResponse::ok(info).into_response())
        }
        "s" => {
            let results = catalog.search(category, page).await?;
            Ok(ApiResponse::ok(results).into_response())
        }
        other => Err(AppError::BadRequest(format!("unknown action {other:?}"))),
    }
}

async fn books_post(State(state): State<AppState>, body: Bytes) -> AppResult<ApiResponse<()>> {
    let command: ApiCommand = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("request body: {e}")))?;

    if command.action != "set" {
        return Err(AppError::BadRequest(format!(
            "unknown action {:?}",
            command.action
        )));
    }

    let request: CuratedSetRequest = serde_json::from_value(command.body)
        .map_err(|e| AppError::BadRequest(format!("body: {e}")))?;

    state
        .catalog()
        .replace_curated(&request.clazz, &request.books)
        .await?;

    Ok(ApiResponse::empty())
}
