//! Status Routes
//!
//! Routes:
//! - GET /health - Liveness check
//! - GET /health/ready - Readiness check (both stores answer)

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::db::health_check;
use crate::AppState;

/// Build status routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub checks: StoreChecks,
}

#[derive(Debug, Serialize)]
pub struct StoreChecks {
    pub tickets: &'static str,
    pub accounts: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}

/// GET /health/ready
///
/// 503 if either database does not answer a trivial query.
async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let tickets = check("tickets", health_check(state.tickets.pool()).await);
    let accounts = check("accounts", health_check(state.accounts.pool()).await);

    let ready = tickets == "ok" && accounts == "ok";
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            status: if ready { "ok" } else { "unavailable" },
            timestamp: Utc::now(),
            checks: StoreChecks { tickets, accounts },
        }),
    )
}

fn check(store: &str, result: crate::Result<()>) -> &'static str {
    match result {
        Ok(()) => "ok",
        Err(e) => {
            warn!(store, error = %e, "Store health check failed");
            "unavailable"
        }
    }
}
