//! Data URL decoding for captured receipt images.
//!
//! Clients send images as `data:<mime>;base64,<payload>`. The MIME subtype doubles as the blob
//! file extension (`image/jpeg` → `jpeg`), so storage and analysis can derive the same blob name
//! without decoding the payload.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("content is not a data URL")]
    MissingDataPrefix,
    #[error("data URL is not base64 encoded")]
    MissingBase64Marker,
    #[error("invalid MIME type: {0:?}")]
    InvalidMimeType(String),
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Raw image bytes and their declared MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DecodedImage {
    /// File extension derived from the MIME subtype.
    pub fn extension(&self) -> &str {
        // mime_type was validated by split_data_url, so the subtype is always present.
        self.mime_type
            .split_once('/')
            .map(|(_, subtype)| subtype)
            .unwrap_or(&self.mime_type)
    }
}

/// Returns the MIME type declared by a data URL without decoding the payload.
pub fn mime_type_of(content: &str) -> DecodeResult<&str> {
    split_data_url(content).map(|(mime, _)| mime)
}

/// Returns the file extension (MIME subtype) declared by a data URL.
pub fn extension_of(content: &str) -> DecodeResult<&str> {
    let mime = mime_type_of(content)?;
    Ok(mime.split_once('/').map(|(_, subtype)| subtype).unwrap_or(mime))
}

/// Decodes a data URL into its MIME type and raw bytes.
pub fn decode_data_url(content: &str) -> DecodeResult<DecodedImage> {
    let (mime, payload) = split_data_url(content)?;
    let bytes = BASE64.decode(payload.trim())?;
    Ok(DecodedImage {
        mime_type: mime.to_string(),
        bytes,
    })
}

/// Encodes raw bytes as a base64 data URL.
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "{DATA_PREFIX}{mime_type}{BASE64_MARKER}{}",
        BASE64.encode(bytes)
    )
}

fn split_data_url(content: &str) -> DecodeResult<(&str, &str)> {
    let rest = content
        .strip_prefix(DATA_PREFIX)
        .ok_or(DecodeError::MissingDataPrefix)?;
    let (mime, payload) = rest
        .split_once(BASE64_MARKER)
        .ok_or(DecodeError::MissingBase64Marker)?;

    match mime.split_once('/') {
        Some((kind, subtype)) if is_token(kind) && is_token(subtype) => Ok((mime, payload)),
        _ => Err(DecodeError::InvalidMimeType(mime.to_string())),
    }
}

// The subtype becomes part of a blob name, so only plain MIME token characters are allowed.
fn is_token(part: &str) -> bool {
    !part.is_empty()
        && !part.starts_with('.')
        && !part.contains("..")
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
