use super::{BlobName, BlobResponse, BlobStore, StorageError, StorageResult};
use crate::constants::{DELETE_ACCEPTED_STATUS, UPLOAD_CREATED_STATUS};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// In-process blob store. Contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, StoredBlob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, blob: &BlobName) -> Option<StoredBlob> {
        self.blobs.read().await.get(blob.as_str()).cloned()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upload(
        &self,
        blob: &BlobName,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> StorageResult<BlobResponse> {
        self.blobs.write().await.insert(
            blob.to_string(),
            StoredBlob {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        Ok(BlobResponse {
            status: UPLOAD_CREATED_STATUS,
            request_id: None,
            etag: None,
        })
    }

    async fn delete(&self, blob: &BlobName) -> StorageResult<BlobResponse> {
        match self.blobs.write().await.remove(blob.as_str()) {
            Some(_) => Ok(BlobResponse {
                status: DELETE_ACCEPTED_STATUS,
                request_id: None,
                etag: None,
            }),
            None => Err(StorageError::NotFound(blob.to_string())),
        }
    }

    async fn exists(&self, blob: &BlobName) -> StorageResult<bool> {
        Ok(self.blobs.read().await.contains_key(blob.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use receipt_types::ReceiptId;

    #[tokio::test]
    async fn upload_replaces_and_delete_removes() {
        let store = MemoryBlobStore::new();
        let blob = BlobName::new(&ReceiptId::parse("r1").unwrap(), "jpeg");

        store.upload(&blob, "image/jpeg", vec![1]).await.unwrap();
        store.upload(&blob, "image/jpeg", vec![2]).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(&blob).await.unwrap().bytes, vec![2]);

        store.delete(&blob).await.unwrap();
        assert!(!store.exists(&blob).await.unwrap());
        assert!(matches!(
            store.delete(&blob).await,
            Err(StorageError::NotFound(_))
        ));
    }
}
