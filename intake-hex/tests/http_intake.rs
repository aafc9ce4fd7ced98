//! HTTP-level tests for the intake endpoints, wired to the in-memory adapters.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use tower::ServiceExt;

use intake_hex::{IntakeConfig, IntakeService, inbound::HttpServer};
use intake_repo::{LedgerOptions, MemoryCache, MemoryLedger, MemoryQueue, MemoryStore};
use intake_types::{AccountId, QueueName};

struct TestApp {
    router: Router,
    queue: Arc<MemoryQueue>,
    account: AccountId,
}

/// Helper to create a server with one funded account (100.00 USD).
fn create_test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let ledger = Arc::new(MemoryLedger::new(LedgerOptions::instant()));
    let queue = Arc::new(MemoryQueue::default());

    let account = store.add_account(ledger.open_account(Decimal::new(10_000, 2)));
    let service = IntakeService::new(
        store,
        ledger,
        Arc::new(MemoryCache::new()),
        queue.clone(),
        IntakeConfig::default(),
    );

    TestApp {
        router: HttpServer::new(service).router(),
        queue,
        account,
    }
}

fn post_transaction(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/transactions")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = create_test_app();

    let response = app
        .router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await, serde_json::json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_create_and_replay_transaction() {
    let app = create_test_app();
    let body = serde_json::json!({
        "idempotency_key": "k1",
        "from_account_id": app.account,
        "amount": "25.00",
        "currency": "USD"
    });

    let first = app
        .router
        .clone()
        .oneshot(post_transaction(body.clone()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    let first = read_json(first).await;
    assert_eq!(first["success"], true);
    assert_eq!(first["data"]["status"], "pending");

    let second = app.router.oneshot(post_transaction(body)).await.unwrap();
    assert_eq!(second.status(), StatusCode::CREATED);
    let second = read_json(second).await;

    assert_eq!(second["data"]["transaction_id"], first["data"]["transaction_id"]);
    assert_eq!(app.queue.len(QueueName::Transaction), 1);
}

#[tokio::test]
async fn test_currency_violation_is_400_envelope() {
    let app = create_test_app();
    let body = serde_json::json!({
        "idempotency_key": "k-precision",
        "from_account_id": app.account,
        "amount": "10.005",
        "currency": "USD"
    });

    let response = app.router.oneshot(post_transaction(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = read_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    assert!(json.get("data").is_none());
}

#[tokio::test]
async fn test_unknown_account_is_404() {
    let app = create_test_app();
    let body = serde_json::json!({
        "idempotency_key": "k-ghost",
        "from_account_id": AccountId::new(),
        "amount": "1.00",
        "currency": "USD"
    });

    let response = app.router.oneshot(post_transaction(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(response).await["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_malformed_json_uses_envelope() {
    let app = create_test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/transactions")
        .header("Content-Type", "application/json")
        .body(Body::from("{\"idempotency_key\": 5"))
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_queue_outage_hides_internal_details() {
    let app = create_test_app();
    app.queue.set_unavailable(true);
    let body = serde_json::json!({
        "idempotency_key": "k-unsent",
        "from_account_id": app.account,
        "amount": "1.00",
        "currency": "USD"
    });

    let response = app.router.oneshot(post_transaction(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = read_json(response).await;
    assert_eq!(json["error"]["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"]["message"], "internal server error");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = create_test_app();

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert!(json["paths"]["/transactions"].is_object());
}
