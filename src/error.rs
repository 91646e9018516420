//! Error types for helpdesk.
//!
//! Uses thiserror for ergonomic error definitions that integrate
//! with axum's response system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::validation::ValidationErrors;

pub type Result<T> = std::result::Result<T, Error>;

/// Generic message for every 5xx. Internal detail goes to the log only.
pub const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Client errors
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    // Server errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 422
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,

            // 400: duplicate signup email is reported as a bad request
            Self::InvalidInput(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,

            // 404
            Self::NotFound(_) => StatusCode::NOT_FOUND,

            // 401
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,

            // 500
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Message safe to show a client.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(errors) => errors.first_message().to_string(),
            Self::Database(_) | Self::Internal(_) => INTERNAL_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// Log server faults before they are flattened into a generic response.
    pub(crate) fn log(&self) {
        if self.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status_code();

        let body = match &self {
            Self::Validation(errors) => json!({
                "error": errors.first_message(),
                "issues": errors,
            }),
            _ => json!({ "error": self.public_message() }),
        };

        (status, Json(body)).into_response()
    }
}

// Convenience conversions
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("Background task failed: {}", err))
    }
}
