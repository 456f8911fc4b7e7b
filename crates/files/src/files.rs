//! Directory-backed blob storage implementation
//!
//! [`LocalBlobStorage`] keeps each blob as a plain file directly under the root directory and
//! records a YAML [`BlobMetadata`] sidecar next to it under `.meta/`.
//!
//! # Security Model
//!
//! - The root is canonicalised once at construction time
//! - Blob names are single path components; separators, `..` and leading dots are rejected
//! - Declared content types are checked against the bytes (best effort, via `infer`)

use crate::{FilesError, METADATA_FOLDER_NAME};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata for a stored blob
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct BlobMetadata {
    /// Name the blob is stored under (`<receipt-id>.<extension>`)
    pub blob_name: String,

    /// Hashing algorithm used (always "sha256")
    pub hash_algorithm: String,

    /// Hexadecimal digest of the blob content
    pub hash: String,

    /// Size of the blob in bytes
    pub size_bytes: u64,

    /// Content type supplied by the uploader
    pub content_type: String,

    /// Media type detected from the bytes, if recognised
    pub detected_media_type: Option<String>,

    /// UTC timestamp when the blob was stored
    pub stored_at: DateTime<Utc>,
}

/// Blob container backed by a directory
#[derive(Debug)]
pub struct LocalBlobStorage {
    root_directory: PathBuf,
}

impl LocalBlobStorage {
    /// Opens storage rooted at `root_directory`
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidRootDirectory` if the directory does not exist, is not a
    /// directory, or cannot be canonicalised.
    pub fn new(root_directory: &Path) -> Result<Self, FilesError> {
        if !root_directory.exists() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Directory does not exist: {}",
                root_directory.display()
            )));
        }

        if !root_directory.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Path is not a directory: {}",
                root_directory.display()
            )));
        }

        let root_directory = root_directory.canonicalize().map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot canonicalize path {}: {}",
                root_directory.display(),
                e
            ))
        })?;

        Ok(Self { root_directory })
    }

    /// Stores `bytes` under `blob_name`, replacing any existing blob of that name
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - `blob_name` is not a safe single path component
    /// - the bytes are recognised as a different media family than `content_type`
    /// - the blob or its metadata sidecar cannot be written
    pub fn put(
        &self,
        blob_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<BlobMetadata, FilesError> {
        validate_blob_name(blob_name)?;

        let detected_media_type = infer::get(bytes).map(|kind| kind.mime_type().to_string());
        if let Some(detected) = &detected_media_type {
            if media_family(detected) != media_family(content_type) {
                return Err(FilesError::MediaTypeMismatch {
                    declared: content_type.to_string(),
                    detected: detected.clone(),
                });
            }
        }

        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let hash = hex::encode(hasher.finalize());

        let blob_path = self.blob_path(blob_name);
        fs::write(&blob_path, bytes).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write blob to {}: {}", blob_path.display(), e),
            ))
        })?;

        let metadata = BlobMetadata {
            blob_name: blob_name.to_string(),
            hash_algorithm: "sha256".to_string(),
            hash,
            size_bytes: bytes.len() as u64,
            content_type: content_type.to_string(),
            detected_media_type,
            stored_at: Utc::now(),
        };

        let metadata_path = self.metadata_path(blob_name);
        if let Some(parent) = metadata_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&metadata_path, serde_yaml::to_string(&metadata)?)?;

        Ok(metadata)
    }

    /// Reads a stored blob's bytes
    ///
    /// # Errors
    ///
    /// Returns `FilesError::BlobNotFound` if nothing is stored under `blob_name`.
    pub fn read(&self, blob_name: &str) -> Result<Vec<u8>, FilesError> {
        validate_blob_name(blob_name)?;
        let blob_path = self.blob_path(blob_name);
        if !blob_path.is_file() {
            return Err(FilesError::BlobNotFound(blob_name.to_string()));
        }
        Ok(fs::read(&blob_path)?)
    }

    /// Reads the metadata sidecar of a stored blob
    pub fn metadata(&self, blob_name: &str) -> Result<BlobMetadata, FilesError> {
        validate_blob_name(blob_name)?;
        let metadata_path = self.metadata_path(blob_name);
        if !metadata_path.is_file() {
            return Err(FilesError::BlobNotFound(blob_name.to_string()));
        }
        let raw = fs::read_to_string(&metadata_path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    /// Returns true if a blob is stored under `blob_name`
    pub fn exists(&self, blob_name: &str) -> Result<bool, FilesError> {
        validate_blob_name(blob_name)?;
        Ok(self.blob_path(blob_name).is_file())
    }

    /// Deletes a blob and its metadata sidecar
    ///
    /// # Errors
    ///
    /// Returns `FilesError::BlobNotFound` if nothing is stored under `blob_name`.
    pub fn remove(&self, blob_name: &str) -> Result<(), FilesError> {
        validate_blob_name(blob_name)?;
        let blob_path = self.blob_path(blob_name);
        if !blob_path.is_file() {
            return Err(FilesError::BlobNotFound(blob_name.to_string()));
        }
        fs::remove_file(&blob_path)?;

        let metadata_path = self.metadata_path(blob_name);
        if metadata_path.is_file() {
            fs::remove_file(&metadata_path)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    fn blob_path(&self, blob_name: &str) -> PathBuf {
        self.root_directory.join(blob_name)
    }

    fn metadata_path(&self, blob_name: &str) -> PathBuf {
        self.root_directory
            .join(METADATA_FOLDER_NAME)
            .join(format!("{blob_name}.yaml"))
    }
}

fn validate_blob_name(blob_name: &str) -> Result<(), FilesError> {
    let unsafe_name = blob_name.is_empty()
        || blob_name.starts_with('.')
        || blob_name.contains("..")
        || blob_name.contains(['/', '\\', '\0']);
    if unsafe_name {
        return Err(FilesError::InvalidBlobName(blob_name.to_string()));
    }
    Ok(())
}

fn media_family(mime: &str) -> &str {
    mime.split('/').next().unwrap_or(mime)
}
