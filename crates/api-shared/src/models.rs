//! JSON bodies exchanged between the receipt client and the REST server.
//!
//! Field names are camelCase on the wire to match what browser clients already send.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// A captured receipt as sent by the client.
///
/// `content` is a data URL (`data:image/jpeg;base64,...`). The server never stores the receipt
/// itself; each operation re-derives the blob name from `id` and the MIME type in `content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Blob-name stem: ASCII letters, digits and `-_.~!$&'()+,;=@`, at most 128 characters,
    /// not starting with `.` and without `..`.
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub uploaded_to_blob_storage: bool,
}

/// One element of the `items` field extracted from a receipt.
///
/// `kind` is the field type reported by the analysis service (`object` for line items) and
/// `properties` maps field names (`description`, `totalPrice`, ...) to their normalised values.
/// The analysis service does not assign ids; clients do that when storing results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalyzedItem {
    pub kind: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub properties: Map<String, Value>,
}

/// Uniform error body written by the error middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomErrorResponse {
    pub message: String,
    pub status_code: u16,
}

impl CustomErrorResponse {
    pub fn new(message: impl Into<String>, status_code: u16) -> Self {
        Self {
            message: message.into(),
            status_code,
        }
    }
}

impl std::fmt::Display for CustomErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.status_code)
    }
}

impl std::error::Error for CustomErrorResponse {}

/// Success body for upload and delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusMessage {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}
