//! Request extractors.

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;

use crate::validation::ValidationErrors;
use crate::Error;

/// JSON body extractor whose rejection is a validation error.
///
/// A body that is not JSON, or has a field of the wrong type, is reported
/// with the same 422 shape as a rule violation instead of axum's plain-text
/// rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct JsonBody<T>(pub T);

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation(ValidationErrors::single("body", rejection.body_text()))
    }
}
