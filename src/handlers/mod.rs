// handlers/mod.rs - two-tier handler layout
//
// Public (no auth) -> Protected (bearer token + live account)
pub mod public;    // sign-up, login
pub mod protected; // users, notes, contacts, files

use axum::{extract::rejection::JsonRejection, Json};
use uuid::Uuid;

use crate::database::models::FieldErrors;
use crate::error::ApiError;

/// Parses a path id; a malformed id is a 400, never a lookup.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("Invalid {} ID", what)))
}

/// Unwraps a JSON body that was extracted as `Result` so the ownership check
/// can run before body errors are reported.
pub(crate) fn bind_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(ApiError::from)
}

pub(crate) fn invalid(what: &str, errors: FieldErrors) -> ApiError {
    ApiError::validation_error(format!("Invalid {}", what), Some(errors))
}
