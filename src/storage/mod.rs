//! Blob storage for user uploads.
//!
//! Every object lives under an owner-scoped key `user-<account id>/<filename>`.
//! Keys are only ever built by [`blob_key`], which rejects filenames that could
//! escape the owner's prefix.

pub mod local;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{StorageBackend, StorageConfig};

pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidKey(String),

    #[error("Blob I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a successful `put`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBlob {
    pub key: String,
    pub url: String,
    pub content_type: String,
    pub size: usize,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes `bytes` at `key`, replacing any existing object.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<StoredBlob, BlobError>;

    /// Keys beginning with `prefix`, sorted.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, BlobError>;

    /// Fails with `NotFound` if nothing is stored at `key`.
    async fn delete(&self, key: &str) -> Result<(), BlobError>;

    fn public_url(&self, key: &str) -> String;
}

/// Builds the configured store.
pub async fn from_config(config: &StorageConfig) -> Result<Arc<dyn BlobStore>, BlobError> {
    let store: Arc<dyn BlobStore> = match config.backend {
        StorageBackend::Local => Arc::new(
            LocalBlobStore::new(config.root_dir.join(&config.container), &config.public_base_url).await?,
        ),
        StorageBackend::Memory => Arc::new(MemoryBlobStore::new(&config.public_base_url)),
    };
    Ok(store)
}

pub fn owner_prefix(owner: Uuid) -> String {
    format!("user-{}/", owner)
}

pub fn blob_key(owner: Uuid, filename: &str) -> Result<String, BlobError> {
    let filename = validate_filename(filename)?;
    Ok(format!("{}{}", owner_prefix(owner), filename))
}

/// Trims the name and rejects anything that is not a single plain path segment.
pub fn validate_filename(filename: &str) -> Result<&str, BlobError> {
    let name = filename.trim();
    if name.is_empty() {
        return Err(BlobError::InvalidKey("File name is required".to_string()));
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") || name.chars().any(char::is_control) {
        return Err(BlobError::InvalidKey(format!("Invalid file name '{}'", name)));
    }
    Ok(name)
}

pub(crate) fn join_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}
