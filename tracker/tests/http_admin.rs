// tracker/tests/http_admin.rs
// Drives the real admin HTTP surface (tracker::http::router) end-to-end
// against an in-memory SQLite store, in the idiom of the teacher's
// tests/test_project_api.rs (tower::ServiceExt::oneshot + axum::body).
// Covers spec.md §8's three literal end-to-end scenarios.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use linktracker_common::{DomainError, LinkUpdate};
use parking_lot::Mutex;
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use tracker::clients::{CircuitBreaker, GithubClient, RetryPolicy, StackOverflowClient};
use tracker::scanner::Scanner;
use tracker::state::AppState;
use tracker::store::{SqliteStore, Store};
use tracker::transport::Sender;

async fn test_app() -> (Router, Arc<dyn Store>) {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    let store = SqliteStore::new(pool);
    store.migrate().await.unwrap();
    let store: Arc<dyn Store> = Arc::new(store);

    let state = Arc::new(AppState { store: store.clone() });
    (tracker::http::router(state), store)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, body)
}

fn post(uri: &str, chat_id: i64, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Tg-Chat-Id", chat_id.to_string())
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, chat_id: i64) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("Tg-Chat-Id", chat_id.to_string())
        .body(Body::empty())
        .unwrap()
}

/// Scenario 1 (spec.md §8): register + track + list.
#[tokio::test]
async fn register_track_and_list() {
    let (app, _store) = test_app().await;

    let create = Request::builder()
        .method("POST")
        .uri("/tg-chat/42")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, create).await;
    assert_eq!(status, StatusCode::OK);

    let add = post(
        "/links",
        42,
        json!({"link": "https://github.com/foo/bar", "tags": ["pure", "fp"], "filters": []}),
    );
    let (status, _) = send(&app, add).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get("/links", 42)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["size"], 1);
    assert_eq!(body["links"][0]["url"], "https://github.com/foo/bar");
}

/// Scenario 2 (spec.md §8): a second `POST /tg-chat/42` conflicts.
#[tokio::test]
async fn duplicate_chat_registration_conflicts() {
    let (app, _store) = test_app().await;

    let create = || {
        Request::builder()
            .method("POST")
            .uri("/tg-chat/42")
            .body(Body::empty())
            .unwrap()
    };

    let (status, _) = send(&app, create()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, create()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "StatusConflict");
}

struct CapturingSender {
    sent: Mutex<Vec<LinkUpdate>>,
}

#[async_trait]
impl Sender for CapturingSender {
    async fn send(&self, update: &LinkUpdate, _is_failed: bool) -> anyhow::Result<()> {
        self.sent.lock().push(update.clone());
        Ok(())
    }
}

/// Scenario 3 (spec.md §8): an unsupported link is swept by one scan tick
/// and disappears from the HTTP surface afterward.
#[tokio::test]
async fn unsupported_link_swept_by_scan_tick() {
    let (app, store) = test_app().await;
    store.create_chat(7).await.unwrap();
    store
        .add_link(7, "https://example.com/x", vec![], vec![])
        .await
        .unwrap();

    let (status, body) = send(&app, get("/links", 7)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["size"], 1);

    let breaker = || CircuitBreaker::new(20, 10, Duration::from_secs(30));
    let retry = RetryPolicy::new(3, Duration::from_millis(200));
    let github = Arc::new(GithubClient::new(Duration::from_secs(1), breaker(), retry));
    let stackoverflow = Arc::new(StackOverflowClient::new(Duration::from_secs(1), breaker(), retry));
    let sender = Arc::new(CapturingSender { sent: Mutex::new(Vec::new()) });

    let scanner = Arc::new(Scanner::new(
        store.clone(),
        github,
        stackoverflow,
        sender.clone(),
        100,
    ));

    let cancel = CancellationToken::new();
    let run_cancel = cancel.clone();
    let handle = tokio::spawn(async move {
        scanner.run(Duration::from_millis(5), run_cancel).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();
    handle.await.unwrap();

    let sent = sender.sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].tg_chat_ids, vec![7]);
    drop(sent);

    let (status, body) = send(&app, get("/links", 7)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["size"], 0);
    assert_eq!(body["links"].as_array().unwrap().len(), 0);
}
