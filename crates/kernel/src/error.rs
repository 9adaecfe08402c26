//! Application error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::routes::response::ApiResponse;
use crate::store::StoreError;

/// Errors returned by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl CatalogError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

/// Result type alias using CatalogError.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Envelope code for an unreadable request.
pub const CODE_UNREADABLE: i32 = -1;
/// Envelope code for missing or malformed parameters.
pub const CODE_INVALID: i32 = -2;
/// Envelope code for a failed operation.
pub const CODE_FAILED: i32 = -3;

/// HTTP-facing errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("unreadable request: {0}")]
    Unreadable(String),

    #[error("invalid parameter: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, i32) {
        match self {
            AppError::Unreadable(_) => (StatusCode::BAD_REQUEST, CODE_UNREADABLE),
            AppError::BadRequest(_) | AppError::Catalog(CatalogError::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, CODE_INVALID)
            }
            AppError::Catalog(CatalogError::NotFound(_)) => (StatusCode::NOT_FOUND, CODE_FAILED),
            AppError::Catalog(CatalogError::Persistence(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, CODE_FAILED)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Storage details stay in the log
        let message = match &self {
            AppError::Catalog(CatalogError::Persistence(e)) => {
                tracing::error!(error = %e, "persistence error");
                "internal server error".to_string()
            }
            _ => self.to_string(),
        };

        (status, ApiResponse::<()>::failure(code, message)).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;
