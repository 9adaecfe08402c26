//! HTTP route handlers.

pub mod book;
pub mod books;
pub mod health;
pub mod response;

use axum::Router;
use serde::Deserialize;

use crate::state::AppState;

/// Command envelope of the POST endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ApiCommand {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub body: serde_json::Value,
}

/// All catalog routes, without middleware.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(books::router())
        .merge(book::router())
        .merge(health::router())
}
