//! Projects Routes
//!
//! Routes:
//! - POST /projects - Create a project
//! - GET /projects/:parent_project - List projects under a parent
//! - DELETE /projects/:id - Delete a project
//!
//! The GET and DELETE share a path shape; the segment is a parent key for
//! one and a project id for the other.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::extract::JsonBody;
use crate::db::Project;
use crate::validation::{validate_project_create, ProjectCreateRequest};
use crate::{AppState, Result};

/// Build project routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/projects", post(create_project))
        .route("/projects/:key", get(list_projects).delete(delete_project))
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub success: bool,
    pub project: Project,
}

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub success: bool,
    pub projects: Vec<Project>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a project.
///
/// POST /projects
#[axum::debug_handler]
async fn create_project(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ProjectCreateRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>)> {
    let input = validate_project_create(&request)?;
    let project = state.tickets.create_project(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse {
            success: true,
            project,
        }),
    ))
}

/// List the projects whose parent is `:parent_project`, oldest first.
///
/// GET /projects/:parent_project
#[axum::debug_handler]
async fn list_projects(
    State(state): State<AppState>,
    Path(parent_project): Path<String>,
) -> Result<Json<ProjectListResponse>> {
    let projects = state.tickets.list_projects_by_parent(&parent_project).await?;

    Ok(Json(ProjectListResponse {
        success: true,
        projects,
    }))
}

/// Delete a project. Tickets filed under it are left as they are.
///
/// DELETE /projects/:id
#[axum::debug_handler]
async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>> {
    state.tickets.delete_project(&id).await?;
    Ok(Json(DeletedResponse { success: true }))
}
