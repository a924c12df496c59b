use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{AuthError, AuthUser};
use crate::database::repository::accounts;
use crate::error::ApiError;

/// Rejects tokens whose account has since been deleted.
/// Must run after `jwt_auth_middleware`.
pub async fn validate_account_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or_else(|| ApiError::unauthorized("Authentication required before account validation"))?;

    let mut conn = state.db.acquire().await?;
    if !accounts::exists(&mut conn, auth_user.account_id).await? {
        tracing::warn!("Account validation failed: {} not found or deleted", auth_user.account_id);
        return Err(AuthError::AccountInactive.into());
    }
    drop(conn);

    Ok(next.run(request).await)
}
