//! Account Routes
//!
//! Routes:
//! - POST /signup - Register a user
//! - POST /login - Check credentials and return the user
//! - GET /users - List users, newest first
//!
//! There are no sessions or tokens: a successful login just returns the
//! stored user. Every response here, success or failure, uses the
//! `{success, message, ...}` envelope rather than the `{error}` shape used
//! by the ticket routes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use super::extract::JsonBody;
use crate::db::{CreateUser, User};
use crate::services::password::{hash_password_blocking, verify_password_blocking};
use crate::validation::{validate_login, validate_signup, LoginRequest, SignupRequest, ValidationErrors};
use crate::{AppState, Error};

/// Build account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/users", get(list_users))
}

// ============================================================================
// Envelope
// ============================================================================

/// Error rendered as `{success: false, message}`.
#[derive(Debug)]
pub struct AuthError(Error);

impl From<Error> for AuthError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl From<ValidationErrors> for AuthError {
    fn from(errors: ValidationErrors) -> Self {
        Self(Error::Validation(errors))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.0.log();
        let body = json!({
            "success": false,
            "message": self.0.public_message(),
        });
        (self.0.status_code(), Json(body)).into_response()
    }
}

type AuthResult<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: &'static str,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<User>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /signup
///
/// A taken email is detected by the store's unique constraint and answered
/// with 400.
#[axum::debug_handler]
async fn signup(
    State(state): State<AppState>,
    payload: std::result::Result<JsonBody<SignupRequest>, Error>,
) -> AuthResult<(StatusCode, Json<AuthResponse>)> {
    let JsonBody(request) = payload?;
    let signup = validate_signup(&request)?;

    let password_hash = hash_password_blocking(signup.password).await?;
    let user = state
        .accounts
        .create_user(CreateUser {
            name: signup.name,
            email: signup.email,
            password_hash,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            message: "Account created successfully",
            user,
        }),
    ))
}

/// POST /login
///
/// Unknown email is 400, wrong password is 401.
#[axum::debug_handler]
async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<JsonBody<LoginRequest>, Error>,
) -> AuthResult<Json<AuthResponse>> {
    let JsonBody(request) = payload?;
    let credentials = validate_login(&request)?;

    let user = state
        .accounts
        .get_user_by_email(&credentials.email)
        .await?
        .ok_or_else(|| Error::InvalidInput("No user found with this email".into()))?;

    let valid = verify_password_blocking(credentials.password, user.password_hash.clone()).await?;
    if !valid {
        warn!(user_id = user.id, "Login rejected: wrong password");
        return Err(Error::Unauthorized("Invalid email or password".into()).into());
    }

    info!(user_id = user.id, "User logged in");

    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful",
        user,
    }))
}

/// GET /users
#[axum::debug_handler]
async fn list_users(State(state): State<AppState>) -> AuthResult<Json<UsersResponse>> {
    let users = state.accounts.list_users().await?;

    Ok(Json(UsersResponse {
        success: true,
        users,
    }))
}
