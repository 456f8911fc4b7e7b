//! # Receipt Core
//!
//! Core logic for the receipt processor: turning a captured receipt into a stored blob and a
//! list of extracted line items.
//!
//! This crate contains:
//! - Data URL decoding (`decoder`)
//! - The object storage gateway behind the [`BlobStore`] trait (Azure, local directory, memory)
//! - The document analysis gateway behind the [`DocumentAnalyzer`] trait (Azure prebuilt receipt)
//! - [`ReceiptService`], which composes both and exposes `upload`, `analyze` and `delete`
//!
//! **No API concerns**: routing, status-code mapping and error bodies belong in `api-rest`.

pub mod analysis;
pub mod config;
pub mod constants;
pub mod decoder;
pub mod error;
pub mod service;
pub mod storage;

pub use api_shared::{AnalyzedItem, Receipt};
pub use receipt_types::ReceiptId;

pub use analysis::{AnalysisError, AnalysisSource, AzureDocumentAnalyzer, DocumentAnalyzer};
pub use config::{AnalysisConfig, CoreConfig, StorageBackend, StorageCredential};
pub use decoder::{DecodeError, DecodedImage};
pub use error::{ReceiptError, ReceiptResult};
pub use service::{AnalysisSourceMode, ReceiptService};
pub use storage::{
    AzureBlobStore, BlobName, BlobResponse, BlobStore, LocalBlobStore, MemoryBlobStore,
    StorageError,
};
