use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{extract_bearer, AuthError};
use crate::error::ApiError;

/// Verifies the bearer token and injects `AuthUser` into request extensions.
///
/// Runs before any handler touches the database, so a missing or bad
/// credential is always answered with 401.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = request.uri().path().to_string();
    let reject = |e: AuthError| {
        tracing::warn!("Rejected request to {}: {}", path, e);
        ApiError::from(e)
    };

    let header = match request.headers().get(AUTHORIZATION) {
        Some(value) => Some(value.to_str().map_err(|_| reject(AuthError::MalformedCredential))?),
        None => None,
    };
    let token = extract_bearer(header).map(str::to_owned).map_err(&reject)?;

    let auth_user = state.verifier.verify(&token).await.map_err(&reject)?;

    tracing::debug!("Authenticated account {}", auth_user.account_id);
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}
