use crate::analysis::AnalysisError;
use crate::decoder::DecodeError;
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ReceiptError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error("invalid receipt id: {0}")]
    InvalidReceiptId(#[from] receipt_types::IdError),
    #[error("invalid receipt content: {0}")]
    Decode(#[from] DecodeError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("analysis error: {0}")]
    Analysis(#[from] AnalysisError),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),
}

impl ReceiptError {
    /// Status code received from (or implied by) the failing layer, if any.
    ///
    /// Malformed receipts are reported as 400; storage failures carry whatever the backend
    /// answered. Transport failures without a response have no status.
    pub fn transport_status(&self) -> Option<u16> {
        match self {
            ReceiptError::MalformedBody(_)
            | ReceiptError::InvalidReceiptId(_)
            | ReceiptError::Decode(_) => Some(400),
            ReceiptError::Storage(e) => e.status(),
            ReceiptError::Analysis(e) => e.status(),
            ReceiptError::InvalidInput(_) | ReceiptError::HttpClient(_) => None,
        }
    }
}

pub type ReceiptResult<T> = std::result::Result<T, ReceiptError>;
