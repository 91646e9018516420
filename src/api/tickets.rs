//! Tickets Routes
//!
//! Routes:
//! - GET /tickets - List tickets (`q`, `status`, `projectId` filters)
//! - POST /tickets - Create a ticket
//! - GET /tickets/:id - Get a ticket with its comment count
//! - PATCH /tickets/:id - Update some fields of a ticket
//! - DELETE /tickets/:id - Delete a ticket and its comments

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::extract::JsonBody;
use crate::db::{Ticket, TicketFilter, TicketWithCount};
use crate::validation::{
    validate_ticket_create, validate_ticket_update, TicketCreateRequest, TicketUpdateRequest,
};
use crate::{AppState, Result};

/// Build ticket routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tickets", get(list_tickets).post(create_ticket))
        .route(
            "/tickets/:id",
            get(get_ticket).patch(update_ticket).delete(delete_ticket),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing tickets.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTicketsQuery {
    /// Substring of title or description
    pub q: Option<String>,
    /// Exact status, or `ALL`
    pub status: Option<String>,
    /// Leaf project id, or parent id to match its children
    pub project_id: Option<String>,
}

impl From<ListTicketsQuery> for TicketFilter {
    fn from(query: ListTicketsQuery) -> Self {
        TicketFilter::new(query.q, query.status, query.project_id)
    }
}

#[derive(Debug, Serialize)]
pub struct TicketListResponse {
    pub items: Vec<TicketWithCount>,
    pub total: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /tickets
#[axum::debug_handler]
async fn list_tickets(
    State(state): State<AppState>,
    Query(query): Query<ListTicketsQuery>,
) -> Result<Json<TicketListResponse>> {
    let filter = TicketFilter::from(query);
    let items = state.tickets.list_tickets(&filter).await?;
    let total = items.len();

    Ok(Json(TicketListResponse { items, total }))
}

/// POST /tickets
///
/// The created ticket is always OPEN, whatever the payload says.
#[axum::debug_handler]
async fn create_ticket(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<TicketCreateRequest>,
) -> Result<(StatusCode, Json<Ticket>)> {
    let input = validate_ticket_create(&request)?;
    let ticket = state.tickets.create_ticket(input).await?;

    Ok((StatusCode::CREATED, Json(ticket)))
}

/// GET /tickets/:id
#[axum::debug_handler]
async fn get_ticket(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TicketWithCount>> {
    Ok(Json(state.tickets.get_ticket(&id).await?))
}

/// PATCH /tickets/:id
///
/// 422 if a supplied field breaks a rule, 400 if nothing was supplied,
/// 404 if the ticket does not exist.
#[axum::debug_handler]
async fn update_ticket(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<TicketUpdateRequest>,
) -> Result<Json<Ticket>> {
    let input = validate_ticket_update(&request)?;
    let ticket = state.tickets.update_ticket(&id, input).await?;

    Ok(Json(ticket))
}

/// DELETE /tickets/:id
#[axum::debug_handler]
async fn delete_ticket(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    state.tickets.delete_ticket(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
