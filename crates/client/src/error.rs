use api_shared::CustomErrorResponse;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with an error body.
    #[error("server error: {0}")]
    Server(CustomErrorResponse),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("another operation is in progress")]
    Busy,
    #[error("no receipt has been captured")]
    NoReceipt,
    #[error("receipt {0} has not been uploaded")]
    NotUploaded(String),
    #[error("unsupported media type: {0}")]
    UnsupportedMedia(String),
    #[error("invalid receipt id: {0}")]
    InvalidReceiptId(#[from] receipt_types::IdError),
}

impl ClientError {
    /// Status code reported by the server, if the request got that far.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Server(body) => Some(body.status_code),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
