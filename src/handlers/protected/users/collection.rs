use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::auth::AuthUser;
use crate::database::models::Account;
use crate::database::repository::accounts;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /users - only ever contains the caller.
pub async fn list(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Vec<Account>> {
    let mut conn = state.db.acquire().await?;
    let accounts = accounts::list_by_owner(&mut conn, caller.account_id).await?;
    Ok(ApiResponse::success(accounts))
}
