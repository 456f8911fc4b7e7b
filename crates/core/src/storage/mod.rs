//! Object storage gateway.
//!
//! Receipts are stored as single blobs named `{receipt id}.{extension}`. The [`BlobStore`] trait
//! hides which service holds them so handlers never depend on a particular vendor.

mod azure;
mod local;
mod memory;

pub use azure::AzureBlobStore;
pub use local::LocalBlobStore;
pub use memory::{MemoryBlobStore, StoredBlob};

use async_trait::async_trait;
use receipt_files::FilesError;
use receipt_types::ReceiptId;

/// Name of a receipt blob inside its container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobName(String);

impl BlobName {
    /// `{id}.{extension}`. Both parts are already restricted to characters that need no escaping
    /// in a URL path segment or file name by [`ReceiptId`] and the data URL decoder.
    pub fn new(id: &ReceiptId, extension: &str) -> Self {
        Self(format!("{id}.{extension}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlobName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the storage service answered for a write or delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobResponse {
    pub status: u16,
    pub request_id: Option<String>,
    pub etag: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage service returned {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("unsupported media type: {0}")]
    UnsupportedMedia(String),
    #[error("storage request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("local storage error: {0}")]
    Files(FilesError),
    #[error("storage task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl StorageError {
    /// Status code to report for this failure, if the layer that failed produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            StorageError::Rejected { status, .. } => Some(*status),
            StorageError::NotFound(_) => Some(404),
            StorageError::UnsupportedMedia(_) => Some(415),
            StorageError::Files(FilesError::InvalidBlobName(_)) => Some(400),
            StorageError::Transport(e) => e.status().map(|s| s.as_u16()),
            StorageError::Files(_) | StorageError::Join(_) => None,
        }
    }
}

impl From<FilesError> for StorageError {
    fn from(err: FilesError) -> Self {
        match err {
            FilesError::BlobNotFound(name) => StorageError::NotFound(name),
            FilesError::MediaTypeMismatch { declared, detected } => StorageError::UnsupportedMedia(
                format!("declared {declared}, content looks like {detected}"),
            ),
            other => StorageError::Files(other),
        }
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// A blob container that receipt images are written to.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Short backend name for logs (`azure`, `local`, `memory`).
    fn name(&self) -> &str;

    /// Writes `bytes` under `blob`, replacing any existing blob.
    async fn upload(
        &self,
        blob: &BlobName,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> StorageResult<BlobResponse>;

    /// Deletes `blob`. Missing blobs are an error.
    async fn delete(&self, blob: &BlobName) -> StorageResult<BlobResponse>;

    /// Returns true if `blob` is stored.
    async fn exists(&self, blob: &BlobName) -> StorageResult<bool>;
}
