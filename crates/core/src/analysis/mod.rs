//! Document analysis gateway.
//!
//! An analyzer takes a receipt image (by URL, or inline when the image is not publicly
//! reachable), waits for the service's long-running operation to finish, and returns the
//! `items` field of the first recognised document.

mod azure;
pub mod fields;

pub use azure::AzureDocumentAnalyzer;

use api_shared::AnalyzedItem;
use async_trait::async_trait;

/// Where the analysis service reads the image from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisSource {
    /// Publicly readable URL of the stored blob.
    Url(String),
    /// Image bytes sent with the request.
    Inline { content_type: String, bytes: Vec<u8> },
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("analysis service returned {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("analysis request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("analysis service did not return an Operation-Location header")]
    MissingOperationLocation,
    #[error("analysis failed: {0}")]
    Failed(String),
    #[error("analysis did not finish after {polls} status checks")]
    TimedOut { polls: u32 },
    #[error("analysis result contains no documents")]
    NoDocument,
    #[error("unexpected analysis response: {0}")]
    InvalidResponse(String),
}

impl AnalysisError {
    pub fn status(&self) -> Option<u16> {
        match self {
            AnalysisError::Rejected { status, .. } => Some(*status),
            AnalysisError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

/// A document-understanding service able to extract receipt line items.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    /// Analyzes the receipt and returns the first document's items.
    ///
    /// `Ok(None)` means the document was recognised but had no `items` field.
    async fn analyze(&self, source: &AnalysisSource) -> AnalysisResult<Option<Vec<AnalyzedItem>>>;
}
