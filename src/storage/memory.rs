use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{join_url, BlobError, BlobStore, StoredBlob};

#[derive(Debug, Clone)]
pub struct MemoryObject {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Process-local store. Contents vanish on restart.
pub struct MemoryBlobStore {
    objects: RwLock<BTreeMap<String, MemoryObject>>,
    public_base_url: String,
}

impl MemoryBlobStore {
    pub fn new(public_base_url: &str) -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            public_base_url: public_base_url.to_string(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<MemoryObject> {
        self.objects.read().await.get(key).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<StoredBlob, BlobError> {
        let size = bytes.len();
        self.objects.write().await.insert(
            key.to_string(),
            MemoryObject { bytes, content_type: content_type.to_string() },
        );

        Ok(StoredBlob {
            key: key.to_string(),
            url: self.public_url(key),
            content_type: content_type.to_string(),
            size,
        })
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, BlobError> {
        let objects = self.objects.read().await;
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        match self.objects.write().await.remove(key) {
            Some(_) => Ok(()),
            None => Err(BlobError::NotFound(key.to_string())),
        }
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.public_base_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_is_prefix_scoped() {
        let store = MemoryBlobStore::new("/blobs");
        store.put("user-a/1.txt", Bytes::from_static(b"1"), "text/plain").await.unwrap();
        store.put("user-a/2.txt", Bytes::from_static(b"2"), "text/plain").await.unwrap();
        store.put("user-ab/3.txt", Bytes::from_static(b"3"), "text/plain").await.unwrap();

        assert_eq!(store.list("user-a/").await.unwrap(), vec!["user-a/1.txt", "user-a/2.txt"]);
    }

    #[tokio::test]
    async fn put_overwrites_and_delete_removes() {
        let store = MemoryBlobStore::new("/blobs");
        store.put("user-a/x", Bytes::from_static(b"old"), "text/plain").await.unwrap();
        let stored = store.put("user-a/x", Bytes::from_static(b"new!"), "application/json").await.unwrap();
        assert_eq!(stored.url, "/blobs/user-a/x");
        assert_eq!(stored.size, 4);

        let object = store.get("user-a/x").await.unwrap();
        assert_eq!(&object.bytes[..], b"new!");
        assert_eq!(object.content_type, "application/json");

        store.delete("user-a/x").await.unwrap();
        assert!(matches!(store.delete("user-a/x").await, Err(BlobError::NotFound(_))));
    }
}
