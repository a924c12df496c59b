use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};

use crate::app::AppState;
use crate::auth::AuthUser;
use crate::database::models::{Contact, ContactInput};
use crate::database::repository::contacts;
use crate::handlers::{bind_body, invalid};
use crate::middleware::{ApiResponse, ApiResult};

/// GET /contacts
pub async fn list(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Vec<Contact>> {
    let mut conn = state.db.acquire().await?;
    let owned = contacts::list_by_owner(&mut conn, caller.account_id).await?;
    Ok(ApiResponse::success(owned))
}

/// POST /contacts
pub async fn post(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    body: Result<Json<ContactInput>, JsonRejection>,
) -> ApiResult<Contact> {
    let input = bind_body(body)?;
    input.validate().map_err(|errors| invalid("contact", errors))?;

    let mut conn = state.db.acquire().await?;
    let contact = contacts::create(&mut conn, caller.account_id, &input).await?;

    tracing::info!("Account {} created contact {}", caller.account_id, contact.id);
    Ok(ApiResponse::created(contact))
}
