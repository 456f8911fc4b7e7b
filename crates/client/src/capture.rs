//! Capturing a receipt image and the upload and delete actions around it.

use crate::api::ReceiptApi;
use crate::error::{ClientError, ClientResult};
use crate::models::{OptionFabButton, OptionFabKey};
use crate::store::{Action, Store};
use api_shared::{Receipt, StatusMessage};
use receipt_core::decoder::encode_data_url;
use receipt_types::ReceiptId;
use std::sync::Arc;
use uuid::Uuid;

/// Builds a receipt from raw image bytes with a fresh id.
pub fn capture_receipt(bytes: &[u8]) -> ClientResult<Receipt> {
    capture_receipt_with_id(&Uuid::new_v4().to_string(), bytes)
}

/// Builds a receipt from raw image bytes. The MIME type is detected from the bytes.
///
/// # Errors
///
/// Returns an error if `id` is not a valid receipt id or the bytes are not a recognised image.
pub fn capture_receipt_with_id(id: &str, bytes: &[u8]) -> ClientResult<Receipt> {
    let id = ReceiptId::parse(id)?;
    let mime_type = match infer::get(bytes) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => kind.mime_type(),
        Some(kind) => return Err(ClientError::UnsupportedMedia(kind.mime_type().to_string())),
        None => return Err(ClientError::UnsupportedMedia("unknown".into())),
    };

    Ok(Receipt {
        id: id.to_string(),
        content: encode_data_url(mime_type, bytes),
        uploaded_to_blob_storage: false,
    })
}

/// Options offered for a captured receipt.
pub fn option_fab_buttons() -> Vec<OptionFabButton> {
    vec![OptionFabButton {
        key: OptionFabKey::Delete,
        name: "Delete".into(),
        icon: "trash".into(),
        background_color: "var(--ion-color-danger)".into(),
    }]
}

/// Upload and delete for the receipt held in the store.
pub struct ReceiptActions {
    api: Arc<dyn ReceiptApi>,
    store: Store,
}

impl ReceiptActions {
    pub fn new(api: Arc<dyn ReceiptApi>, store: Store) -> Self {
        Self { api, store }
    }

    /// Captures `bytes` as the current receipt.
    pub fn capture(&self, bytes: &[u8]) -> ClientResult<Receipt> {
        let receipt = capture_receipt(bytes)?;
        self.store.dispatch(Action::SetReceipt(receipt.clone()));
        Ok(receipt)
    }

    /// Uploads the current receipt and marks it as uploaded.
    pub async fn upload(&self) -> ClientResult<StatusMessage> {
        let receipt = self.current()?;
        let message = self.with_loading(self.api.upload_receipt(&receipt)).await?;
        self.store.dispatch(Action::SetUploaded(true));
        self.store.dispatch(Action::ClearTooltip);
        Ok(message)
    }

    /// Deletes the current receipt's blob, clears the analysis result and marks the receipt
    /// as not uploaded. A receipt that is not uploaded is refused without a request.
    pub async fn delete(&self) -> ClientResult<StatusMessage> {
        let receipt = self.current()?;
        if !receipt.uploaded_to_blob_storage {
            return Err(ClientError::NotUploaded(receipt.id));
        }
        let message = self.with_loading(self.api.delete_receipt(&receipt)).await?;
        self.store.dispatch(Action::SetUploaded(false));
        self.store.dispatch(Action::SetOcrAzureResult(Vec::new()));
        Ok(message)
    }

    /// Runs the action behind an option button.
    pub async fn press(&self, key: OptionFabKey) -> ClientResult<StatusMessage> {
        match key {
            OptionFabKey::Delete => self.delete().await,
        }
    }

    fn current(&self) -> ClientResult<Receipt> {
        self.store.snapshot().receipt.ok_or(ClientError::NoReceipt)
    }

    async fn with_loading<T>(
        &self,
        request: impl std::future::Future<Output = ClientResult<T>>,
    ) -> ClientResult<T> {
        if !self.store.begin_loading() {
            return Err(ClientError::Busy);
        }
        let result = request.await;
        self.store.dispatch(Action::SetLoading(false));
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Receipt request failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OcrAzureResult;
    use api_shared::{AnalyzedItem, CustomErrorResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const PNG: [u8; 12] = [
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D,
    ];
    const PDF: &[u8] = b"%PDF-1.7\n";

    /// Remembers which blobs exist, like the server would.
    #[derive(Default)]
    struct StubApi {
        stored: Mutex<Vec<String>>,
        delete_calls: AtomicUsize,
    }

    #[async_trait]
    impl ReceiptApi for StubApi {
        async fn upload_receipt(&self, receipt: &Receipt) -> ClientResult<StatusMessage> {
            self.stored.lock().unwrap().push(receipt.id.clone());
            Ok(StatusMessage {
                message: "Uploading receipt was successful".into(),
            })
        }

        async fn analyze_receipt(
            &self,
            _receipt: &Receipt,
        ) -> ClientResult<Option<Vec<AnalyzedItem>>> {
            Ok(None)
        }

        async fn delete_receipt(&self, receipt: &Receipt) -> ClientResult<StatusMessage> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            let mut stored = self.stored.lock().unwrap();
            match stored.iter().position(|id| *id == receipt.id) {
                Some(index) => {
                    stored.remove(index);
                    Ok(StatusMessage {
                        message: "Deleting receipt was successful".into(),
                    })
                }
                None => Err(ClientError::Server(CustomErrorResponse::new(
                    "Receipt does not exist",
                    404,
                ))),
            }
        }
    }

    #[test]
    fn capture_detects_image_type() {
        let receipt = capture_receipt(&PNG).unwrap();
        assert!(receipt.content.starts_with("data:image/png;base64,"));
        assert!(!receipt.uploaded_to_blob_storage);
        assert!(ReceiptId::parse(&receipt.id).is_ok());
        assert_ne!(capture_receipt(&PNG).unwrap().id, receipt.id);
    }

    #[test]
    fn capture_rejects_non_images() {
        assert!(matches!(
            capture_receipt(PDF),
            Err(ClientError::UnsupportedMedia(ref m)) if m == "application/pdf"
        ));
        assert!(matches!(
            capture_receipt(b"plain text"),
            Err(ClientError::UnsupportedMedia(_))
        ));
        assert!(matches!(
            capture_receipt_with_id("../r1", &PNG),
            Err(ClientError::InvalidReceiptId(_))
        ));
    }

    #[tokio::test]
    async fn upload_then_delete_toggles_flag_and_clears_result() {
        let store = Store::default();
        let actions = ReceiptActions::new(Arc::new(StubApi::default()), store.clone());

        actions.capture(&PNG).unwrap();
        actions.upload().await.unwrap();
        assert!(store.snapshot().receipt.unwrap().uploaded_to_blob_storage);

        store.dispatch(Action::SetOcrAzureResult(vec![OcrAzureResult {
            id: Uuid::new_v4(),
            kind: "item".into(),
            properties: Default::default(),
        }]));

        let deleted = actions.press(OptionFabKey::Delete).await.unwrap();
        assert_eq!(deleted.message, "Deleting receipt was successful");
        let state = store.snapshot();
        assert!(!state.receipt.unwrap().uploaded_to_blob_storage);
        assert!(state.ocr_azure_result.is_empty());
        assert!(!state.loading);

        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn delete_of_unuploaded_receipt_sends_nothing() {
        let api = Arc::new(StubApi::default());
        let store = Store::default();
        let actions = ReceiptActions::new(api.clone(), store.clone());
        let receipt = actions.capture(&PNG).unwrap();

        let err = actions.press(OptionFabKey::Delete).await.unwrap_err();
        assert!(matches!(err, ClientError::NotUploaded(ref id) if *id == receipt.id));
        assert_eq!(api.delete_calls.load(Ordering::SeqCst), 0);
        assert!(!store.is_loading());

        actions.upload().await.unwrap();
        actions.delete().await.unwrap();
        assert!(matches!(
            actions.delete().await,
            Err(ClientError::NotUploaded(_))
        ));
        assert_eq!(api.delete_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn server_refusal_of_delete_is_returned() {
        let store = Store::default();
        let actions = ReceiptActions::new(Arc::new(StubApi::default()), store.clone());
        let mut receipt = capture_receipt(&PNG).unwrap();
        receipt.uploaded_to_blob_storage = true;
        store.dispatch(Action::SetReceipt(receipt));

        let err = actions.delete().await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert!(!store.is_loading());
        assert!(store.snapshot().receipt.unwrap().uploaded_to_blob_storage);
    }

    #[tokio::test]
    async fn actions_need_a_captured_receipt() {
        let actions = ReceiptActions::new(Arc::new(StubApi::default()), Store::default());
        assert!(matches!(actions.upload().await, Err(ClientError::NoReceipt)));
    }

    #[tokio::test]
    async fn busy_store_rejects_upload() {
        let store = Store::default();
        let actions = ReceiptActions::new(Arc::new(StubApi::default()), store.clone());
        actions.capture(&PNG).unwrap();

        assert!(store.begin_loading());
        assert!(matches!(actions.upload().await, Err(ClientError::Busy)));
    }

    #[test]
    fn delete_is_the_only_option() {
        let buttons = option_fab_buttons();
        assert_eq!(buttons.len(), 1);
        assert_eq!(buttons[0].key, OptionFabKey::Delete);
    }
}
