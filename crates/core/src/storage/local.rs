use super::{BlobName, BlobResponse, BlobStore, StorageResult};
use crate::constants::{DELETE_ACCEPTED_STATUS, UPLOAD_CREATED_STATUS};
use async_trait::async_trait;
use receipt_files::LocalBlobStorage;
use std::path::Path;
use std::sync::Arc;

/// Blob store writing into a local directory via [`LocalBlobStorage`].
///
/// File I/O runs on the blocking pool. Responses mimic the Azure statuses (201 on upload, 202 on
/// delete) so callers see the same codes whichever backend is configured.
#[derive(Clone)]
pub struct LocalBlobStore {
    storage: Arc<LocalBlobStorage>,
}

impl LocalBlobStore {
    /// Opens (creating if needed) the directory at `root`.
    pub fn open(root: &Path) -> StorageResult<Self> {
        std::fs::create_dir_all(root).map_err(receipt_files::FilesError::from)?;
        Ok(Self {
            storage: Arc::new(LocalBlobStorage::new(root)?),
        })
    }

    pub fn storage(&self) -> &LocalBlobStorage {
        &self.storage
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn upload(
        &self,
        blob: &BlobName,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> StorageResult<BlobResponse> {
        let storage = self.storage.clone();
        let name = blob.to_string();
        let content_type = content_type.to_string();

        let metadata =
            tokio::task::spawn_blocking(move || storage.put(&name, &content_type, &bytes))
                .await??;

        Ok(BlobResponse {
            status: UPLOAD_CREATED_STATUS,
            request_id: None,
            etag: Some(metadata.hash),
        })
    }

    async fn delete(&self, blob: &BlobName) -> StorageResult<BlobResponse> {
        let storage = self.storage.clone();
        let name = blob.to_string();

        tokio::task::spawn_blocking(move || storage.remove(&name)).await??;

        Ok(BlobResponse {
            status: DELETE_ACCEPTED_STATUS,
            request_id: None,
            etag: None,
        })
    }

    async fn exists(&self, blob: &BlobName) -> StorageResult<bool> {
        let storage = self.storage.clone();
        let name = blob.to_string();

        Ok(tokio::task::spawn_blocking(move || storage.exists(&name)).await??)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;
    use receipt_types::ReceiptId;
    use tempfile::TempDir;

    const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn blob() -> BlobName {
        BlobName::new(&ReceiptId::parse("r1").unwrap(), "png")
    }

    #[tokio::test]
    async fn open_creates_missing_directory() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("nested").join("blobs");

        let store = LocalBlobStore::open(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(store.name(), "local");
    }

    #[tokio::test]
    async fn upload_then_delete_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = LocalBlobStore::open(temp.path()).unwrap();

        let uploaded = store
            .upload(&blob(), "image/png", PNG_HEADER.to_vec())
            .await
            .unwrap();
        assert_eq!(uploaded.status, 201);
        assert_eq!(uploaded.etag.as_ref().map(String::len), Some(64));
        assert!(store.exists(&blob()).await.unwrap());
        assert_eq!(store.storage().read("r1.png").unwrap(), PNG_HEADER.to_vec());

        let deleted = store.delete(&blob()).await.unwrap();
        assert_eq!(deleted.status, 202);
        assert!(!store.exists(&blob()).await.unwrap());
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = LocalBlobStore::open(temp.path()).unwrap();

        let err = store.delete(&blob()).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn upload_rejects_non_image_bytes() {
        let temp = TempDir::new().unwrap();
        let store = LocalBlobStore::open(temp.path()).unwrap();

        let err = store
            .upload(&blob(), "image/png", b"%PDF-1.7 not an image".to_vec())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(415));
    }
}
