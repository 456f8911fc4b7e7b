//! Client-side view models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// An analyzed receipt item as held in client state.
///
/// The analysis service does not assign ids, so the client gives every item a fresh v4 UUID
/// when it stores a result. Ids are never reused across calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrAzureResult {
    pub id: Uuid,
    pub kind: String,
    pub properties: Map<String, Value>,
}

/// UI element a tooltip is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TooltipId {
    OcrProcessor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TooltipContent {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tooltip {
    pub id: TooltipId,
    pub content: TooltipContent,
}

impl Tooltip {
    pub fn new(id: TooltipId, message: impl Into<String>) -> Self {
        Self {
            id,
            content: TooltipContent {
                message: message.into(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptionFabKey {
    Delete,
}

/// One entry of the floating option menu shown next to a captured receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionFabButton {
    pub key: OptionFabKey,
    pub name: String,
    pub icon: String,
    pub background_color: String,
}
