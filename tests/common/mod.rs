//! Common test utilities and helpers.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use helpdesk::api;
use helpdesk::db::{create_pool_with_config, AccountStore, PoolConfig, TicketStore};
use helpdesk::AppState;
use serde_json::Value;

/// Prefix the test app is mounted under.
pub const PREFIX: &str = "/api";

/// Build state over two fresh in-memory databases.
pub async fn test_state() -> AppState {
    let tickets_pool = create_pool_with_config(":memory:", PoolConfig::test())
        .await
        .expect("Failed to create tickets database");
    let accounts_pool = create_pool_with_config(":memory:", PoolConfig::test())
        .await
        .expect("Failed to create accounts database");

    let tickets = TicketStore::new(tickets_pool)
        .await
        .expect("Failed to initialize tickets schema");
    let accounts = AccountStore::new(accounts_pool)
        .await
        .expect("Failed to initialize accounts schema");

    AppState::from_stores(accounts, tickets)
}

/// Build the full application (middleware included) over in-memory stores.
pub async fn test_app() -> Router {
    api::app(test_state().await, PREFIX)
}

/// Extract JSON body from response
pub async fn extract_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// Create a GET request
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Create a POST request with a raw body
pub fn post_raw(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Create a POST request with JSON body
pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    post_raw(uri, &serde_json::to_string(&body).unwrap())
}
