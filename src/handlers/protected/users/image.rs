use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    Extension,
};
use serde::Serialize;

use crate::app::AppState;
use crate::auth::{authorize, AuthUser};
use crate::database::repository::accounts;
use crate::handlers::parse_id;
use crate::handlers::protected::files::read_upload;
use crate::middleware::{ApiResponse, ApiResult};
use crate::storage::blob_key;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub message: String,
    pub image_url: String,
}

/// POST /users/:id/image - stores the `file` part and points `imageUrl` at it.
///
/// No database connection is held while the body streams in.
pub async fn post(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ImageResponse> {
    let id = parse_id(&id, "user")?;

    let mut conn = state.db.acquire().await?;
    let account = authorize(caller.account_id, accounts::get_by_id(&mut conn, id).await?, "User")?;
    drop(conn);

    let upload = read_upload(multipart).await?;
    let key = blob_key(account.id, &upload.file_name)?;
    let stored = state.blobs.put(&key, upload.bytes, &upload.content_type).await?;

    let updated = match state.db.acquire().await {
        Ok(mut conn) => accounts::update_image_url(&mut conn, account.id, &stored.url).await,
        Err(e) => Err(e.into()),
    };
    let account = match updated {
        Ok(account) => account,
        Err(e) => {
            if let Err(cleanup) = state.blobs.delete(&key).await {
                tracing::warn!("Failed to remove orphaned blob {}: {}", key, cleanup);
            }
            return Err(e.into());
        }
    };
    tracing::info!("Account {} profile image set to {}", account.id, key);

    Ok(ApiResponse::success(ImageResponse {
        message: "Profile image uploaded".to_string(),
        image_url: account.image_url,
    }))
}
