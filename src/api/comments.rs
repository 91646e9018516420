//! Comment Routes
//!
//! Routes:
//! - GET /tickets/:id/comments - List a ticket's comments, oldest first
//! - POST /tickets/:id/comments - Add a comment

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use super::extract::JsonBody;
use crate::db::Comment;
use crate::validation::{validate_comment_create, CommentCreateRequest};
use crate::{AppState, Result};

/// Build comment routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/tickets/:id/comments",
        get(list_comments).post(add_comment),
    )
}

/// GET /tickets/:id/comments
#[axum::debug_handler]
async fn list_comments(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
) -> Result<Json<Vec<Comment>>> {
    Ok(Json(state.tickets.list_comments(&ticket_id).await?))
}

/// POST /tickets/:id/comments
///
/// The payload is validated before the ticket is looked up.
#[axum::debug_handler]
async fn add_comment(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
    JsonBody(request): JsonBody<CommentCreateRequest>,
) -> Result<(StatusCode, Json<Comment>)> {
    let input = validate_comment_create(&request)?;
    let comment = state.tickets.add_comment(&ticket_id, input).await?;

    Ok((StatusCode::CREATED, Json(comment)))
}
