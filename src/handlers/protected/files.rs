// handlers/protected/files.rs - per-account blob storage
//
// POST   /files/upload     multipart field "file"
// GET    /files            names of the caller's files
// DELETE /files/:filename

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    Extension,
};
use bytes::Bytes;
use serde::Serialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::storage::{blob_key, owner_prefix};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// The `file` part of a multipart upload.
#[derive(Debug)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Reads the first part named `file`; other parts are skipped.
pub async fn read_upload(multipart: Result<Multipart, MultipartRejection>) -> Result<Upload, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().trim().to_string();
        let content_type = field
            .content_type()
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let bytes = field.bytes().await?;

        return Ok(Upload { file_name, content_type, bytes });
    }

    Err(ApiError::bad_request("File is required"))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub file_name: String,
    pub url: String,
    pub content_type: String,
}

/// POST /files/upload
pub async fn upload(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<UploadResponse> {
    let upload = read_upload(multipart).await?;
    let key = blob_key(caller.account_id, &upload.file_name)?;

    let stored = state.blobs.put(&key, upload.bytes, &upload.content_type).await?;
    tracing::info!("Account {} uploaded {} ({} bytes)", caller.account_id, key, stored.size);

    Ok(ApiResponse::success(UploadResponse {
        message: "File uploaded successfully".to_string(),
        file_name: upload.file_name,
        url: stored.url,
        content_type: stored.content_type,
    }))
}

/// GET /files
pub async fn list(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Value> {
    let prefix = owner_prefix(caller.account_id);
    let files: Vec<String> = state
        .blobs
        .list(&prefix)
        .await?
        .into_iter()
        .filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
        .collect();

    Ok(ApiResponse::success(json!({ "files": files })))
}

/// DELETE /files/:filename
pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(filename): Path<String>,
) -> ApiResult<Value> {
    let key = blob_key(caller.account_id, &filename)?;
    state.blobs.delete(&key).await?;
    tracing::info!("Account {} deleted {}", caller.account_id, key);

    Ok(ApiResponse::success(json!({ "message": "File deleted successfully" })))
}
