use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, info};

use super::{join_url, BlobError, BlobStore, StoredBlob};

/// Stores blobs as plain files under a root directory, one subdirectory per owner.
pub struct LocalBlobStore {
    root_dir: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub async fn new<P: AsRef<Path>>(root_dir: P, public_base_url: &str) -> Result<Self, BlobError> {
        let root_dir = root_dir.as_ref().to_path_buf();
        fs::create_dir_all(&root_dir).await?;

        info!(path = %root_dir.display(), "Initialized local blob store");

        Ok(Self {
            root_dir,
            public_base_url: public_base_url.to_string(),
        })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BlobError> {
        let relative = Path::new(key);
        if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(BlobError::InvalidKey(format!("Invalid blob key '{}'", key)));
        }
        Ok(self.root_dir.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<StoredBlob, BlobError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &bytes).await?;

        info!(key = %key, size = bytes.len(), "Stored blob");

        Ok(StoredBlob {
            key: key.to_string(),
            url: self.public_url(key),
            content_type: content_type.to_string(),
            size: bytes.len(),
        })
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, BlobError> {
        // Prefixes are always "<dir>/", so only one directory needs reading.
        let (dir, name_prefix) = match prefix.rsplit_once('/') {
            Some((dir, rest)) => (self.path_for(dir)?, rest),
            None => (self.root_dir.clone(), prefix),
        };
        let key_dir = prefix.rsplit_once('/').map(|(dir, _)| dir);

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(name_prefix) {
                continue;
            }
            keys.push(match key_dir {
                Some(dir) => format!("{}/{}", dir, name),
                None => name,
            });
        }
        keys.sort();

        debug!(prefix = %prefix, count = keys.len(), "Listed blobs");
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!(key = %key, "Deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BlobError::NotFound(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.public_base_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store() -> (TempDir, LocalBlobStore) {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path().join("user-files"), "http://localhost:8080/blobs")
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn put_list_delete() {
        let (_dir, store) = store().await;

        let stored = store
            .put("user-a/notes.txt", Bytes::from_static(b"hello"), "text/plain")
            .await
            .unwrap();
        assert_eq!(stored.url, "http://localhost:8080/blobs/user-a/notes.txt");
        assert_eq!(stored.size, 5);
        assert!(store.root_dir().join("user-a/notes.txt").exists());

        store.put("user-a/b.png", Bytes::from_static(b"png"), "image/png").await.unwrap();
        store.put("user-b/c.txt", Bytes::from_static(b"c"), "text/plain").await.unwrap();

        assert_eq!(store.list("user-a/").await.unwrap(), vec!["user-a/b.png", "user-a/notes.txt"]);

        store.delete("user-a/notes.txt").await.unwrap();
        assert_eq!(store.list("user-a/").await.unwrap(), vec!["user-a/b.png"]);
    }

    #[tokio::test]
    async fn list_of_unknown_owner_is_empty() {
        let (_dir, store) = store().await;
        assert!(store.list("user-nobody/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let (_dir, store) = store().await;
        let result = store.delete("user-a/missing.txt").await;
        assert!(matches!(result, Err(BlobError::NotFound(_))));
    }

    #[tokio::test]
    async fn refuses_keys_outside_root() {
        let (_dir, store) = store().await;
        let result = store.put("../escape.txt", Bytes::from_static(b"x"), "text/plain").await;
        assert!(matches!(result, Err(BlobError::InvalidKey(_))));
    }
}
