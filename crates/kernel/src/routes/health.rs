//! Health check endpoint.
//!
//! Returns 200 OK if storage is reachable and the counter worker is running,
//! 503 Service Unavailable otherwise.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::catalog::CounterSnapshot;
use crate::state::AppState;

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    storage: bool,
    counter_worker: bool,
    counters: CounterSnapshot,
}

/// Health check handler.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let catalog = state.catalog();
    let storage = catalog.store().ping().await;
    let counter_worker = !catalog.counters().is_stopped();
    let healthy = storage && counter_worker;

    let (status, status_code) = if healthy {
        ("healthy", StatusCode::OK)
    } else {
        ("unhealthy", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        status_code,
        Json(HealthResponse {
            status,
            storage,
            counter_worker,
            counters: catalog.counters().stats(),
        }),
    )
}

/// Create the health check router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
