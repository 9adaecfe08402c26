#![allow(clippy::unwrap_used, clippy::expect_used)]
//! HTTP tests for the catalog routes.
//!
//! Requests go through the real router via `oneshot`; storage is in memory.
//!
//! ```bash
//! cargo test --test api_test
//! ```

use axum::http::StatusCode;
use catalog_kernel::models::chapter_table_name;
use catalog_test_utils::{assert, test_book, test_chapters};
use serde_json::json;

mod common;
use common::{TestApp, response_json};

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn health_reports_storage_and_counters() {
    let app = TestApp::new(&[]);

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], true);
    assert_eq!(body["counter_worker"], true);
    assert_eq!(body["counters"]["dropped"], 0);

    app.store.set_unavailable(true);
    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// =============================================================================
// GET /books
// =============================================================================

#[tokio::test]
async fn list_uses_one_based_pages() {
    let books: Vec<_> = (0..25)
        .map(|i| test_book(&format!("b{i:02}")).with_votes(100 - i))
        .collect();
    let app = TestApp::new(&books);

    let envelope = response_json(app.get("/books?a=l&c=votes&p=1").await).await;
    let body = assert::ok_body(&envelope);
    assert_eq!(assert::book_ids(&body["books"]).len(), 20);
    assert_eq!(body["books"][0]["id"], "b00");

    let envelope = response_json(app.get("/books?a=l&c=votes&p=2").await).await;
    let ids = assert::book_ids(&assert::ok_body(&envelope)["books"]);
    assert_eq!(ids, ["b20", "b21", "b22", "b23", "b24"]);

    // Missing page is the first page.
    let envelope = response_json(app.get("/books?a=l&c=votes").await).await;
    assert_eq!(assert::ok_body(&envelope)["books"][0]["id"], "b00");
}

#[tokio::test]
async fn huge_pages_are_empty_not_errors() {
    let app = TestApp::new(&[test_book("b1").with_votes(3)]);

    for uri in [
        "/books?a=l&c=votes&p=9223372036854775807",
        "/books?a=s&c=b&p=9223372036854775807",
        "/books?a=l&c=votes&p=-9223372036854775808",
    ] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let envelope = response_json(response).await;
        let body = assert::ok_body(&envelope);
        let expected: &[&str] = if uri.contains("p=-") { &["b1"] } else { &[] };
        assert_eq!(assert::book_ids(&body["books"]), expected, "{uri}");
    }
}

#[tokio::test]
async fn list_applies_gender_and_finished() {
    let app = TestApp::new(&[
        test_book("b1").for_girls().finished(),
        test_book("b2").for_girls(),
        test_book("b3").finished(),
    ]);

    let envelope = response_json(app.get("/books?a=l&c=score&g=girl&f=true").await).await;
    let ids = assert::book_ids(&assert::ok_body(&envelope)["books"]);
    assert_eq!(ids, ["b1"]);
}

#[tokio::test]
async fn non_numeric_page_is_invalid() {
    let app = TestApp::new(&[]);
    let response = app.get("/books?a=l&p=two").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let envelope = response_json(response).await;
    assert::code(&envelope, -2);
    assert::lacks_key(&envelope, "body");
}

#[tokio::test]
async fn unknown_action_is_invalid() {
    let app = TestApp::new(&[]);
    let response = app.get("/books?a=x").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert::code(&response_json(response).await, -2);
}

#[tokio::test]
async fn info_is_the_default_action() {
    let app = TestApp::new(&[
        test_book("b1").in_class("修真"),
        test_book("b2").in_class("都市"),
    ]);

    let envelope = response_json(app.get("/books").await).await;
    let body = assert::ok_body(&envelope);
    assert_eq!(body["count"], 2);
    assert_eq!(body["pages"], 1);
    assert_eq!(body["clazzs"], json!(["修真", "都市"]));
    assert_eq!(body["hot_words"], json!(["唐家三少", "修真", "武侠仙侠"]));
    assert_eq!(body["content_spec"], json!([]));
}

#[tokio::test]
async fn search_total_is_present_only_on_page_one() {
    let books: Vec<_> = (0..21)
        .map(|i| test_book(&format!("b{i:02}")).by("唐家三少"))
        .collect();
    let app = TestApp::new(&books);

    let envelope = response_json(app.get("/books?a=s&c=%E5%94%90%E5%B0%91&p=1").await).await;
    let body = assert::ok_body(&envelope);
    assert_eq!(body["total_count"], 21);
    assert_eq!(assert::book_ids(&body["books"]).len(), 20);

    let envelope = response_json(app.get("/books?a=s&c=%E5%94%90%E5%B0%91&p=2").await).await;
    let body = assert::ok_body(&envelope);
    assert::lacks_key(body, "total_count");
    assert_eq!(assert::book_ids(&body["books"]).len(), 1);

    app.catalog().counters().flush().await;
    assert_eq!(app.store.search_word_count("唐少"), Some(2));
}

#[tokio::test]
async fn storage_failure_is_operation_failure() {
    let app = TestApp::new(&[test_book("b1")]);
    app.store.set_unavailable(true);

    let response = app.get("/books?a=l&c=votes").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let envelope = response_json(response).await;
    assert::code(&envelope, -3);
    assert_eq!(envelope["error"], "internal server error");
}

// =============================================================================
// POST /books
// =============================================================================

#[tokio::test]
async fn curated_replace_then_list() {
    let app = TestApp::new(&[
        test_book("b1").with_score(1),
        test_book("b2").with_score(2),
        test_book("b3").with_score(3),
    ]);

    let response = app
        .post_json(
            "/books",
            &json!({
                "action": "set",
                "key": "recommend",
                "body": {"clazz": "fprecommend", "books": [{"id": "b1"}, {"id": "b2"}]}
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let envelope = response_json(response).await;
    assert::code(&envelope, 0);
    assert::lacks_key(&envelope, "body");

    let envelope = response_json(app.get("/books?a=l&c=fprecommend").await).await;
    let body = assert::ok_body(&envelope);
    assert_eq!(assert::book_ids(&body["books"]), ["b1", "b2"]);
    assert::lacks_key(&body["books"][0], "rwords");
}

#[tokio::test]
async fn director_replace_requires_annotations() {
    let app = TestApp::new(&[test_book("b1")]);

    let response = app
        .post_json(
            "/books",
            &json!({
                "action": "set",
                "key": "recommend",
                "body": {"clazz": "directorrecommend", "books": [{"id": "b1", "rwords": "好书"}]}
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert::code(&response_json(response).await, -2);

    let envelope = response_json(app.get("/books?a=l&c=directorrecommend").await).await;
    assert_eq!(assert::ok_body(&envelope)["books"], json!([]));
}

#[tokio::test]
async fn director_list_exposes_annotations() {
    let app = TestApp::new(&[test_book("b1")]);
    app.post_json(
        "/books",
        &json!({
            "action": "set",
            "key": "recommend",
            "body": {"clazz": "directorrecommend",
                     "books": [{"id": "b1", "rwords": "好书", "ruser": "主编"}]}
        }),
    )
    .await;

    let envelope = response_json(app.get("/books?a=l&c=directorrecommend").await).await;
    let book = &assert::ok_body(&envelope)["books"][0];
    assert_eq!(book["rwords"], "好书");
    assert_eq!(book["ruser"], "主编");
}

#[tokio::test]
async fn malformed_post_body_is_invalid() {
    let app = TestApp::new(&[]);
    let response = app.post("/books", "{not json").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert::code(&response_json(response).await, -2);
}

// =============================================================================
// /book
// =============================================================================

#[tokio::test]
async fn chapters_need_id_name_and_author() {
    let app = TestApp::new(&[test_book("b1")]);
    let table = chapter_table_name("name", "author");
    app.store.insert_chapters(&table, test_chapters(2));

    let response = app.get("/book?a=ch&n=name&au=author").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert::code(&response_json(response).await, -2);

    let envelope = response_json(app.get("/book?a=ch&id=b1&n=name&au=author").await).await;
    let chapters = &assert::ok_body(&envelope)["chapters"];
    assert_eq!(chapters.as_array().map(Vec::len), Some(2));
    assert_eq!(chapters[0]["title"], "Chapter 1");
}

#[tokio::test]
async fn chapters_of_unknown_book_fail() {
    let app = TestApp::new(&[]);
    let response = app.get("/book?id=b1&n=nobody&au=nowhere").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert::code(&response_json(response).await, -3);
}

#[tokio::test]
async fn read_returns_updated_book() {
    let app = TestApp::new(&[test_book("b1").with_reads(41)]);

    let response = app
        .post_json(
            "/book",
            &json!({"action": "add", "key": "read",
                    "body": {"book_id": "b1", "client_id": "device-1"}}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let envelope = response_json(response).await;
    assert_eq!(assert::ok_body(&envelope)["book"]["total_reads"], 42);
    assert_eq!(app.total_reads("b1"), 42);
}

#[tokio::test]
async fn read_validation() {
    let app = TestApp::new(&[test_book("b1").with_reads(1)]);

    let cases = [
        (json!({"action": "", "key": "read", "body": {"book_id": "b1", "client_id": "c"}}), StatusCode::BAD_REQUEST, -2),
        (json!({"action": "add", "key": "", "body": {"book_id": "b1", "client_id": "c"}}), StatusCode::BAD_REQUEST, -2),
        (json!({"action": "add", "key": "read", "body": {"book_id": "b1"}}), StatusCode::BAD_REQUEST, -2),
        (json!({"action": "add", "key": "read", "body": {"book_id": "b9", "client_id": "c"}}), StatusCode::NOT_FOUND, -3),
    ];
    for (request, status, code) in cases {
        let response = app.post_json("/book", &request).await;
        assert_eq!(response.status(), status, "{request}");
        assert::code(&response_json(response).await, code);
    }

    assert_eq!(app.total_reads("b1"), 1);
}

#[tokio::test]
async fn unreadable_updated_book_is_an_internal_error() {
    let app = TestApp::new(&[]);
    let mut row = test_book("b1").row();
    row["name"] = json!(42);
    app.store.insert_book(row);

    let response = app
        .post_json(
            "/book",
            &json!({"action": "add", "key": "read",
                    "body": {"book_id": "b1", "client_id": "device-1"}}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert::code(&response_json(response).await, -3);
    assert_eq!(app.total_reads("b1"), 1);
}
