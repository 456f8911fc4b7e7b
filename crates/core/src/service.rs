//! Receipt service: the `upload`, `analyze` and `delete` operations that handlers call.
//!
//! The service owns one [`BlobStore`] and one [`DocumentAnalyzer`] and derives the blob name
//! for a receipt the same way for every operation: `{id}.{extension}`, where the extension is
//! the MIME subtype declared by the receipt's data URL.

use crate::analysis::{AnalysisSource, AzureDocumentAnalyzer, DocumentAnalyzer};
use crate::config::{CoreConfig, StorageBackend};
use crate::decoder::{decode_data_url, extension_of};
use crate::storage::{
    AzureBlobStore, BlobName, BlobResponse, BlobStore, LocalBlobStore, MemoryBlobStore,
};
use crate::{ReceiptError, ReceiptResult};
use api_shared::{AnalyzedItem, Receipt};
use receipt_types::ReceiptId;
use reqwest::Client;
use std::sync::Arc;

/// How the analyzer gets hold of the stored image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisSourceMode {
    /// The blob is publicly readable under this URL prefix.
    BlobPath(String),
    /// The image is decoded from the receipt and sent with the request.
    Inline,
}

#[derive(Clone)]
pub struct ReceiptService {
    store: Arc<dyn BlobStore>,
    analyzer: Arc<dyn DocumentAnalyzer>,
    source_mode: AnalysisSourceMode,
}

impl ReceiptService {
    pub fn new(
        store: Arc<dyn BlobStore>,
        analyzer: Arc<dyn DocumentAnalyzer>,
        source_mode: AnalysisSourceMode,
    ) -> Self {
        Self {
            store,
            analyzer,
            source_mode,
        }
    }

    /// Builds the configured storage backend and the Azure analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the local blob directory cannot
    /// be opened.
    pub fn from_config(config: &CoreConfig) -> ReceiptResult<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(ReceiptError::HttpClient)?;

        let store: Arc<dyn BlobStore> = match config.storage() {
            StorageBackend::Azure(azure) => Arc::new(AzureBlobStore::new(client.clone(), azure)),
            StorageBackend::Local { root } => Arc::new(LocalBlobStore::open(root)?),
            StorageBackend::Memory => Arc::new(MemoryBlobStore::new()),
        };

        let source_mode = match (config.storage(), config.blob_path_prefix()) {
            (StorageBackend::Azure(_), Some(prefix)) => {
                AnalysisSourceMode::BlobPath(prefix.to_string())
            }
            _ => AnalysisSourceMode::Inline,
        };

        let analyzer = Arc::new(AzureDocumentAnalyzer::new(client, config.analysis()));

        tracing::info!(
            backend = config.storage().name(),
            inline_analysis = source_mode == AnalysisSourceMode::Inline,
            "Receipt service configured"
        );

        Ok(Self::new(store, analyzer, source_mode))
    }

    pub fn backend_name(&self) -> &str {
        self.store.name()
    }

    pub fn source_mode(&self) -> &AnalysisSourceMode {
        &self.source_mode
    }

    /// Blob name for `receipt`, derived without decoding its payload.
    pub fn blob_name(receipt: &Receipt) -> ReceiptResult<BlobName> {
        let id = ReceiptId::parse(&receipt.id)?;
        Ok(BlobName::new(&id, extension_of(&receipt.content)?))
    }

    /// Decodes the receipt image and writes it to the blob store.
    pub async fn upload(&self, receipt: &Receipt) -> ReceiptResult<BlobResponse> {
        let id = ReceiptId::parse(&receipt.id)?;
        let image = decode_data_url(&receipt.content)?;
        let blob = BlobName::new(&id, image.extension());

        tracing::debug!(%blob, size = image.bytes.len(), "Uploading receipt");
        let response = self
            .store
            .upload(&blob, &image.mime_type, image.bytes)
            .await?;
        tracing::info!(%blob, status = response.status, "Uploaded receipt");

        Ok(response)
    }

    /// Runs the prebuilt receipt model on the stored image and returns its line items.
    pub async fn analyze(&self, receipt: &Receipt) -> ReceiptResult<Option<Vec<AnalyzedItem>>> {
        let source = match &self.source_mode {
            AnalysisSourceMode::BlobPath(prefix) => {
                let blob = Self::blob_name(receipt)?;
                AnalysisSource::Url(format!("{prefix}/{blob}"))
            }
            AnalysisSourceMode::Inline => {
                ReceiptId::parse(&receipt.id)?;
                let image = decode_data_url(&receipt.content)?;
                AnalysisSource::Inline {
                    content_type: image.mime_type,
                    bytes: image.bytes,
                }
            }
        };

        let items = self.analyzer.analyze(&source).await?;
        tracing::info!(
            id = %receipt.id,
            items = items.as_ref().map(Vec::len),
            "Analyzed receipt"
        );
        Ok(items)
    }

    /// Deletes the receipt's blob. Fails if it does not exist.
    pub async fn delete(&self, receipt: &Receipt) -> ReceiptResult<BlobResponse> {
        let blob = Self::blob_name(receipt)?;
        let response = self.store.delete(&blob).await?;
        tracing::info!(%blob, status = response.status, "Deleted receipt");
        Ok(response)
    }

    pub async fn exists(&self, receipt: &Receipt) -> ReceiptResult<bool> {
        let blob = Self::blob_name(receipt)?;
        Ok(self.store.exists(&blob).await?)
    }
}
