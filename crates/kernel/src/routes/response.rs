//! JSON response envelope.
//!
//! Every endpoint answers `{"code": .., "error": "..", "body": ..}`. `code` is
//! 0 on success and negative on failure; `body` is omitted when empty.

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Envelope wrapping every API response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response carrying a body.
    pub fn ok(body: T) -> Self {
        Self {
            code: 0,
            error: String::new(),
            body: Some(body),
        }
    }
}

impl ApiResponse<()> {
    /// Successful response with no body.
    pub fn empty() -> Self {
        Self {
            code: 0,
            error: String::new(),
            body: None,
        }
    }

    pub fn failure(code: i32, message: String) -> Self {
        Self {
            code,
            error: message,
            body: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
