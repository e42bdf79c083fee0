mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::{seed_account, services_on};
use payflow::infrastructure::in_memory::InMemoryStore;
use payflow::interfaces::http::{AppState, router};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceExt;

fn app(store: InMemoryStore) -> Router {
    let (engine, accounts) = services_on(store);
    router(Arc::new(AppState { engine, accounts }))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Amounts and balances serialize as decimal strings; parse whatever shape
/// arrives so assertions compare money, not formatting.
fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap(),
        other => panic!("not a decimal: {other}"),
    }
}

#[tokio::test]
async fn test_transfer_round_trip() {
    let store = InMemoryStore::new();
    seed_account(&store, "AAAAAAAAAA", dec!(1000.00)).await;
    seed_account(&store, "BBBBBBBBBB", dec!(0.00)).await;
    let app = app(store);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/transfers",
            json!({
                "senderAccountId": "AAAAAAAAAA",
                "receiverAccountId": "BBBBBBBBBB",
                "amount": 250.00,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["amount"]), dec!(250.00));
    assert_eq!(body["payer"], "AAAAAAAAAA");
    assert_eq!(body["receiver"], "BBBBBBBBBB");
    assert_eq!(body["method"], "Transfer");
    assert_eq!(body["id"], 1);

    let (status, body) = send(&app, get("/api/accounts/AAAAAAAAAA")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["balance"]), dec!(750.00));

    let (_, body) = send(&app, get("/api/accounts/BBBBBBBBBB")).await;
    assert_eq!(decimal(&body["balance"]), dec!(250.00));
}

#[tokio::test]
async fn test_transfer_validation_errors_carry_machine_codes() {
    let store = InMemoryStore::new();
    seed_account(&store, "AAAAAAAAAA", dec!(100.00)).await;
    seed_account(&store, "BBBBBBBBBB", dec!(0.00)).await;
    let app = app(store);

    let cases = [
        (json!({"senderAccountId": "AAAAAAAAAA", "receiverAccountId": "BBBBBBBBBB", "amount": 150.00}), "insufficient_balance"),
        (json!({"senderAccountId": "AAAAAAAAAA", "receiverAccountId": "AAAAAAAAAA", "amount": 10.00}), "self_transfer"),
        (json!({"senderAccountId": "AAAAAAAAAA", "receiverAccountId": "UNKNOWN999", "amount": 10.00}), "unknown_receiver"),
        (json!({"senderAccountId": "UNKNOWN999", "receiverAccountId": "BBBBBBBBBB", "amount": 10.00}), "unknown_sender"),
        (json!({"senderAccountId": "not-an-id", "receiverAccountId": "BBBBBBBBBB", "amount": 10.00}), "unknown_sender"),
        (json!({"senderAccountId": "AAAAAAAAAA", "receiverAccountId": "BBBBBBBBBB", "amount": 0.00}), "invalid_amount"),
        (json!({"senderAccountId": "AAAAAAAAAA", "receiverAccountId": "BBBBBBBBBB", "amount": -5.00}), "invalid_amount"),
    ];

    for (request, expected_code) in cases {
        let (status, body) = send(&app, json_request("POST", "/api/transfers", request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], expected_code);
    }

    // Nothing moved.
    let (_, body) = send(&app, get("/api/accounts/AAAAAAAAAA")).await;
    assert_eq!(decimal(&body["balance"]), dec!(100.00));
    let (_, body) = send(&app, get("/api/payments?accountId=AAAAAAAAAA")).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_register_and_login() {
    let app = app(InMemoryStore::new());

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/accounts",
            json!({"username": "alice", "email": "alice@example.com", "password": "correct horse"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["accountId"].as_str().unwrap().len(), 10);
    assert_eq!(decimal(&body["balance"]), dec!(1000.00));
    assert!(body.get("passwordHash").is_none());
    assert!(body.get("password_hash").is_none());

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/accounts",
            json!({"username": "alice", "email": "other@example.com", "password": "correct horse"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "username_taken");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/accounts/login",
            json!({"username": "alice", "password": "correct horse"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/accounts/login",
            json!({"username": "alice", "password": "wrong"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_credentials");
}

#[tokio::test]
async fn test_account_lookup() {
    let store = InMemoryStore::new();
    seed_account(&store, "AAAAAAAAAA", dec!(10.00)).await;
    let app = app(store);

    let (status, body) = send(&app, get("/api/accounts/AAAAAAAAAA")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accountId"], "AAAAAAAAAA");
    assert_eq!(decimal(&body["balance"]), dec!(10.00));

    let (status, body) = send(&app, get("/api/accounts/ZZZZZZZZZZ")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_account");

    let (status, body) = send(&app, get("/api/accounts/short")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_account");
}

#[tokio::test]
async fn test_admin_balance_update() {
    let store = InMemoryStore::new();
    seed_account(&store, "AAAAAAAAAA", dec!(10.00)).await;
    let app = app(store);

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            "/api/accounts/AAAAAAAAAA/balance",
            json!({"balance": 42.50}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["balance"]), dec!(42.50));

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            "/api/accounts/AAAAAAAAAA/balance",
            json!({"balance": -1.00}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_balance");

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            "/api/accounts/ZZZZZZZZZZ/balance",
            json!({"balance": 1.00}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_account");
}

#[tokio::test]
async fn test_payment_listing_and_lookup() {
    let store = InMemoryStore::new();
    seed_account(&store, "AAAAAAAAAA", dec!(100.00)).await;
    seed_account(&store, "BBBBBBBBBB", dec!(0.00)).await;
    let app = app(store);

    for amount in ["10.00", "20.00"] {
        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/transfers",
                json!({
                    "senderAccountId": "AAAAAAAAAA",
                    "receiverAccountId": "BBBBBBBBBB",
                    "amount": amount,
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app, get("/api/payments?accountId=AAAAAAAAAA")).await;
    assert_eq!(status, StatusCode::OK);
    let payments = body.as_array().unwrap();
    assert_eq!(payments.len(), 2);
    // Newest first.
    assert_eq!(payments[0]["id"], 2);
    assert_eq!(payments[1]["id"], 1);

    // Receiver sees the same history.
    let (_, body) = send(&app, get("/api/payments?accountId=BBBBBBBBBB")).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    // A commit-year filter in the future excludes everything.
    let (_, body) = send(&app, get("/api/payments?accountId=AAAAAAAAAA&fromYear=9999")).await;
    assert_eq!(body, json!([]));

    let (status, body) = send(&app, get("/api/payments/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["amount"]), dec!(10.00));

    let (status, body) = send(&app, get("/api/payments/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "payment_not_found");

    let (status, body) = send(&app, get("/api/payments?accountId=not-an-id")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_field");
}
