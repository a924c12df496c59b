// handlers/public/auth/login.rs - POST /auth/login

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::auth::{verify_password, AuthError};
use crate::database::models::Account;
use crate::database::repository::accounts;
use crate::error::ApiError;
use crate::handlers::bind_body;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: Account,
}

/**
 * POST /auth/login - exchange credentials for a bearer token
 *
 * Input:  { "email": "...", "password": "..." }
 * Output: { "success": true, "data": { "token", "expires_in", "user" } }
 *
 * An unknown email, an account without a local password and a wrong
 * password all produce the same 401.
 */
pub async fn login_post(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let request = bind_body(body)?;
    let email = request.email.trim();
    if email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }
    if email.contains('\0') {
        return Err(ApiError::bad_request("Email must not contain NUL characters"));
    }

    let mut conn = state.db.acquire().await?;
    let account = accounts::find_by_email(&mut conn, email).await?;
    drop(conn);

    let account = match account {
        Some(account) => account,
        None => {
            tracing::warn!("Login failed: unknown email {}", email);
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    let matches = match account.password_hash.as_deref() {
        Some(hash) => verify_password(&request.password, hash)?,
        None => false,
    };
    if !matches {
        tracing::warn!("Login failed for account {}", account.id);
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.tokens.issue(account.id)?;
    tracing::info!("Account {} logged in", account.id);

    Ok(ApiResponse::success(LoginResponse {
        token,
        expires_in: state.tokens.expires_in_secs(),
        user: account,
    }))
}
