//! Shared test infrastructure for integration tests.
//!
//! Every test gets its own in-memory store and router, so tests never share
//! state and need no database.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use catalog_kernel::AppState;
use catalog_kernel::catalog::CatalogService;
use catalog_kernel::routes;
use catalog_kernel::store::MemoryCatalogStore;
use catalog_test_utils::TestBook;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

/// Test application over an in-memory store.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryCatalogStore>,
    pub state: AppState,
}

impl TestApp {
    /// Create an app seeded with the given books.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(books: &[TestBook]) -> Self {
        let store = Arc::new(MemoryCatalogStore::new());
        for book in books {
            store.insert_book(book.row());
        }
        let state = AppState::in_memory(Arc::clone(&store));
        let router = routes::router().with_state(state.clone());
        Self {
            router,
            store,
            state,
        }
    }

    pub fn catalog(&self) -> &CatalogService {
        self.state.catalog()
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// GET a URI and return the response.
    pub async fn get(&self, uri: &str) -> Response {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// POST a raw body and return the response.
    pub async fn post(&self, uri: &str, body: impl Into<Body>) -> Response {
        self.request(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
    }

    /// POST a JSON value and return the response.
    pub async fn post_json(&self, uri: &str, body: &Value) -> Response {
        self.post(uri, body.to_string()).await
    }

    /// Total reads of a stored book.
    pub fn total_reads(&self, id: &str) -> i64 {
        self.store.book(id).unwrap()["total_reads"].as_i64().unwrap()
    }

    /// Total searches of a stored book.
    pub fn total_searches(&self, id: &str) -> i64 {
        self.store.book(id).unwrap()["total_searches"]
            .as_i64()
            .unwrap()
    }
}

/// Parse a response body as JSON.
pub async fn response_json(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap_or_else(|_| {
        let text = String::from_utf8_lossy(&body);
        panic!("Failed to parse JSON: {text}");
    })
}
