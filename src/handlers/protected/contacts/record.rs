use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::{authorize, AuthUser};
use crate::database::models::{Contact, ContactInput};
use crate::database::repository::contacts;
use crate::handlers::{bind_body, invalid, parse_id};
use crate::middleware::{ApiResponse, ApiResult};

/// GET /contacts/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Contact> {
    let id = parse_id(&id, "contact")?;
    let mut conn = state.db.acquire().await?;
    let contact = authorize(caller.account_id, contacts::get_by_id(&mut conn, id).await?, "Contact")?;
    Ok(ApiResponse::success(contact))
}

/// PUT /contacts/:id
pub async fn put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Result<Json<ContactInput>, JsonRejection>,
) -> ApiResult<Contact> {
    let id = parse_id(&id, "contact")?;
    let mut tx = state.db.begin().await?;

    let contact = contacts::get_by_id_for_update(&mut *tx, id).await?;
    authorize(caller.account_id, contact, "Contact")?;

    let input = bind_body(body)?;
    input.validate().map_err(|errors| invalid("contact", errors))?;

    let contact = contacts::update(&mut *tx, id, caller.account_id, &input).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(contact))
}

/// DELETE /contacts/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "contact")?;
    let mut tx = state.db.begin().await?;

    let contact = contacts::get_by_id_for_update(&mut *tx, id).await?;
    authorize(caller.account_id, contact, "Contact")?;

    contacts::soft_delete(&mut *tx, id).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(json!({ "message": "Contact deleted successfully" })))
}
