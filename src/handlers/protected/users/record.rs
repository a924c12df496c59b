use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::{authorize, AuthUser};
use crate::database::models::{Account, UpdateAccountInput};
use crate::database::repository::accounts;
use crate::error::ApiError;
use crate::handlers::{bind_body, invalid, parse_id};
use crate::middleware::{ApiResponse, ApiResult};

/// GET /users/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Account> {
    let id = parse_id(&id, "user")?;
    let mut conn = state.db.acquire().await?;
    let account = authorize(caller.account_id, accounts::get_by_id(&mut conn, id).await?, "User")?;
    Ok(ApiResponse::success(account))
}

/// PUT /users/:id - replaces email, names and image URL.
pub async fn put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Result<Json<UpdateAccountInput>, JsonRejection>,
) -> ApiResult<Account> {
    let id = parse_id(&id, "user")?;
    let mut tx = state.db.begin().await?;

    let current = accounts::get_by_id_for_update(&mut *tx, id).await?;
    let current = authorize(caller.account_id, current, "User")?;

    let input = bind_body(body)?;
    input.validate().map_err(|errors| invalid("user", errors))?;

    if !current.email.eq_ignore_ascii_case(input.email.trim()) {
        if let Some(other) = accounts::find_by_email(&mut *tx, input.email.trim()).await? {
            if other.id != current.id {
                return Err(ApiError::conflict("Email is already in use"));
            }
        }
    }

    let account = accounts::update(&mut *tx, id, &input).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(account))
}

/// DELETE /users/:id - soft delete; the token stops working afterwards.
pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "user")?;
    let mut tx = state.db.begin().await?;

    let account = accounts::get_by_id_for_update(&mut *tx, id).await?;
    authorize(caller.account_id, account, "User")?;

    accounts::soft_delete(&mut *tx, id).await?;
    tx.commit().await?;

    tracing::info!("Account {} deleted", id);
    Ok(ApiResponse::success(json!({ "message": "User deleted successfully" })))
}
