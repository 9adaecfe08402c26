//! Single book endpoints.
//!
//! - `GET /book?a=ch&id=&n=&au=`: chapter list.
//! - `POST /book`: record a read (`key: "read"`).

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{Book, Chapter, ReadRequest};
use crate::routes::ApiCommand;
use crate::routes::response::ApiResponse;
use crate::state::AppState;

/// Create the single-book router.
pub fn router() -> Router<AppState> {
    Router::new().route("/book", get(book_get).post(book_post))
}

/// Query string of `GET /book`.
#[derive(Debug, Default, Deserialize)]
pub struct BookParams {
    /// Action; only `ch` (chapters).
    pub a: Option<String>,
    pub id: Option<String>,
    /// Book display name.
    pub n: Option<String>,
    /// Author.
    pub au: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChaptersBody {
    chapters: Vec<Chapter>,
}

#[derive(Debug, Serialize)]
struct BookBody {
    book: Book,
}

fn required(value: Option<&str>, name: &str) -> AppResult<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::BadRequest(format!("{name} is required"))),
    }
}

async fn book_get(
    State(state): State<AppState>,
    params: Result<Query<BookParams>, QueryRejection>,
) -> AppResult<ApiResponse<ChaptersBody>> {
    let Query(params) = params.map_err(|e| AppError::Unreadable(e.body_text()))?;

    required(params.id.as_deref(), "id")?;
    let name = required(params.n.as_deref(), "n")?;
    let author = required(params.au.as_deref(), "au")?;

    match params.a.as_deref().unwrap_or("ch") {
        "ch" => {
            let chapters = state.catalog().chapters(&name, &author).await?;
            Ok(ApiResponse::ok(ChaptersBody { chapters }))
        }
        other => Err(AppError::BadRequest(format!("unknown action {other:?}"))),
    }
}

async fn book_post(State(state): State<AppState>, body: Bytes) -> AppResult<ApiResponse<BookBody>> {
    let command: ApiCommand = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("request body: {e}")))?;

    if command.action.is_empty() || command.key.is_empty() {
        return Err(AppError::BadRequest("action and key are required".to_string()));
    }

    match command.key.as_str() {
        "read" => {
            let request: ReadRequest = serde_json::from_value(command.body)
                .map_err(|e| AppError::BadRequest(format!("body: {e}")))?;
            let book = state.catalog().record_read(&request).await?;
            Ok(ApiResponse::ok(BookBody { book }))
        }
        other => Err(AppError::BadRequest(format!("unknown key {other:?}"))),
    }
}
