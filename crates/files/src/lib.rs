//! Receipt Blob Files
//!
//! A directory-backed stand-in for a cloud blob container. Used when the receipt server runs
//! without cloud storage (local development, demos, CI).
//!
//! ## Layout
//!
//! ```text
//! <root>/
//! ├── <receipt-id>.jpeg           # blob bytes, named exactly like the cloud blob
//! └── .meta/
//!     └── <receipt-id>.jpeg.yaml  # BlobMetadata sidecar
//! ```
//!
//! Uploading a blob that already exists replaces it, matching block-blob upload semantics.
//!
//! ## Example Usage
//!
//! ```no_run
//! use receipt_files::LocalBlobStorage;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = LocalBlobStorage::new(Path::new("receipt_blobs"))?;
//! let metadata = storage.put("r1.png", "image/png", &[0x89, 0x50, 0x4E, 0x47])?;
//! assert_eq!(metadata.size_bytes, 4);
//! storage.remove("r1.png")?;
//! # Ok(())
//! # }
//! ```

mod files;

pub use files::{BlobMetadata, LocalBlobStorage};

/// Name of the hidden directory holding metadata sidecars.
pub const METADATA_FOLDER_NAME: &str = ".meta";

/// Errors that can occur during local blob operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Root directory does not exist or is not a directory
    #[error("Invalid root directory: {0}")]
    InvalidRootDirectory(String),

    /// Blob name would escape the root or is otherwise unusable as a file name
    #[error("Invalid blob name: {0}")]
    InvalidBlobName(String),

    /// No blob stored under this name
    #[error("Blob not found: {0}")]
    BlobNotFound(String),

    /// Bytes do not look like the declared content type
    #[error("Declared content type {declared} does not match detected {detected}")]
    MediaTypeMismatch { declared: String, detected: String },

    /// Metadata sidecar could not be written or read
    #[error("Metadata error: {0}")]
    Metadata(#[from] serde_yaml::Error),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
