use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};

use crate::app::AppState;
use crate::auth::AuthUser;
use crate::database::models::{NoteDetail, NoteInput};
use crate::database::repository::notes;
use crate::handlers::{bind_body, invalid};
use crate::middleware::{ApiResponse, ApiResult};

/// GET /notes - the caller's notes with their children.
pub async fn list(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Vec<NoteDetail>> {
    let mut conn = state.db.acquire().await?;
    let owned = notes::list_by_owner(&mut conn, caller.account_id).await?;
    let details = notes::load_details(&mut conn, owned).await?;
    Ok(ApiResponse::success(details))
}

/// POST /notes - the note and every child in one transaction.
pub async fn post(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    body: Result<Json<NoteInput>, JsonRejection>,
) -> ApiResult<NoteDetail> {
    let input = bind_body(body)?;
    input.validate().map_err(|errors| invalid("note", errors))?;

    let mut tx = state.db.begin().await?;
    let note = notes::create(&mut *tx, caller.account_id, &input).await?;
    let detail = notes::insert_children(&mut *tx, note, &input).await?;
    tx.commit().await?;

    tracing::info!(
        "Account {} created note {} ({} items, {} reminders, {} attachments)",
        caller.account_id,
        detail.note.id,
        detail.checklist_items.len(),
        detail.reminders.len(),
        detail.attachments.len()
    );
    Ok(ApiResponse::created(detail))
}
