use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::{authorize, AuthUser};
use crate::database::models::{NoteDetail, NoteInput};
use crate::database::repository::notes;
use crate::handlers::{bind_body, invalid, parse_id};
use crate::middleware::{ApiResponse, ApiResult};

/// GET /notes/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<NoteDetail> {
    let id = parse_id(&id, "note")?;
    let mut conn = state.db.acquire().await?;

    let note = authorize(caller.account_id, notes::get_by_id(&mut conn, id).await?, "Note")?;
    let detail = notes::load_detail(&mut conn, note).await?;
    Ok(ApiResponse::success(detail))
}

/// PUT /notes/:id - full replacement, children included.
pub async fn put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Result<Json<NoteInput>, JsonRejection>,
) -> ApiResult<NoteDetail> {
    let id = parse_id(&id, "note")?;
    let mut tx = state.db.begin().await?;

    let note = notes::get_by_id_for_update(&mut *tx, id).await?;
    authorize(caller.account_id, note, "Note")?;

    let input = bind_body(body)?;
    input.validate().map_err(|errors| invalid("note", errors))?;

    let note = notes::update(&mut *tx, id, caller.account_id, &input).await?;
    notes::delete_children(&mut *tx, id).await?;
    let detail = notes::insert_children(&mut *tx, note, &input).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(detail))
}

/// DELETE /notes/:id - soft-deletes the note and removes its children.
pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "note")?;
    let mut tx = state.db.begin().await?;

    let note = notes::get_by_id_for_update(&mut *tx, id).await?;
    authorize(caller.account_id, note, "Note")?;

    notes::delete_children(&mut *tx, id).await?;
    notes::soft_delete(&mut *tx, id).await?;
    tx.commit().await?;

    tracing::info!("Account {} deleted note {}", caller.account_id, id);
    Ok(ApiResponse::success(json!({ "message": "Note deleted successfully" })))
}
