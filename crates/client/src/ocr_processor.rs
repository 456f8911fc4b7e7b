//! The "analyze receipt" trigger.
//!
//! Clicking it either warns that the receipt has to be uploaded first, or runs the analysis
//! and stores the result. The button is disabled while the receipt is not uploaded or any
//! request is in flight, and a click that arrives while loading is ignored.

use crate::api::ReceiptApi;
use crate::error::ClientResult;
use crate::models::{OcrAzureResult, Tooltip, TooltipId};
use crate::store::{Action, Store};
use api_shared::{AnalyzedItem, Receipt};
use std::sync::Arc;
use uuid::Uuid;

pub const PROCESS_LABEL: &str = "Press button below to start analyzing document";
pub const PROCESS_ICON: &str = "analytics";
pub const UPLOAD_FIRST_MESSAGE: &str = "Upload image to Blob Storage";

/// What the trigger renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessButton {
    pub label: &'static str,
    pub icon: &'static str,
    pub disabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Receipt not uploaded yet; a tooltip was shown and nothing was sent.
    Blocked,
    /// Another request holds the loading flag; the click was ignored.
    Ignored,
    /// Analysis finished and this many items were stored.
    Analyzed(usize),
}

pub struct OcrProcessor {
    api: Arc<dyn ReceiptApi>,
    store: Store,
}

impl OcrProcessor {
    pub fn new(api: Arc<dyn ReceiptApi>, store: Store) -> Self {
        Self { api, store }
    }

    pub fn view(&self, receipt: &Receipt) -> ProcessButton {
        ProcessButton {
            label: PROCESS_LABEL,
            icon: PROCESS_ICON,
            disabled: !receipt.uploaded_to_blob_storage || self.store.is_loading(),
        }
    }

    /// Handles a click on the trigger.
    ///
    /// # Errors
    ///
    /// Returns the analysis request's error. `loading` has been reset by then and the stored
    /// result is left untouched.
    pub async fn click(&self, receipt: &Receipt) -> ClientResult<ClickOutcome> {
        if !receipt.uploaded_to_blob_storage {
            self.store.dispatch(Action::SetTooltip(Tooltip::new(
                TooltipId::OcrProcessor,
                UPLOAD_FIRST_MESSAGE,
            )));
            return Ok(ClickOutcome::Blocked);
        }

        if !self.store.begin_loading() {
            tracing::debug!(id = %receipt.id, "Analysis already in progress, ignoring click");
            return Ok(ClickOutcome::Ignored);
        }

        let response = self.api.analyze_receipt(receipt).await;
        self.store.dispatch(Action::SetLoading(false));

        match response {
            Ok(items) => {
                let result = with_generated_ids(items.unwrap_or_default());
                let count = result.len();
                self.store.dispatch(Action::SetOcrAzureResult(result));
                Ok(ClickOutcome::Analyzed(count))
            }
            Err(e) => {
                tracing::warn!(id = %receipt.id, error = %e, "Receipt analysis failed");
                Err(e)
            }
        }
    }
}

fn with_generated_ids(items: Vec<AnalyzedItem>) -> Vec<OcrAzureResult> {
    items
        .into_iter()
        .map(|item| OcrAzureResult {
            id: Uuid::new_v4(),
            kind: item.kind,
            properties: item.properties,
        })
        .collect()
}
