//! API Routes for helpdesk
//!
//! This module combines all API routes into a single router and wraps it in
//! the cross-cutting layers (CORS, request tracing, panic recovery, 404
//! fallback).

mod auth;
mod comments;
mod extract;
mod projects;
pub mod status;
mod tickets;

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Build the API routes, unprefixed.
///
/// Route structure:
/// - /projects/* - Project hierarchy
/// - /tickets/* - Tickets and their comments
/// - /signup, /login, /users - Accounts
/// - /health, /health/ready - Health checks
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(status::routes())
        .merge(projects::routes())
        .merge(tickets::routes())
        .merge(comments::routes())
        .merge(auth::routes())
}

/// Build the complete application: routes nested under `prefix`, plus
/// fallback and middleware. An empty prefix mounts at the root.
pub fn app(state: AppState, prefix: &str) -> Router {
    let api = if prefix.is_empty() {
        routes()
    } else {
        Router::new().nest(prefix, routes())
    };

    api.fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods(cors::Any)
                .allow_headers(cors::Any),
        )
        .with_state(state)
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Something went wrong!" })),
    )
        .into_response()
}
