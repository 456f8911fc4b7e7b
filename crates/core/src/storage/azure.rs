//! Azure Blob Storage backend, spoken over the Blob service REST API.

use super::{BlobName, BlobResponse, BlobStore, StorageError, StorageResult};
use crate::config::{AzureStorageConfig, StorageCredential};
use crate::constants::BLOB_SERVICE_VERSION;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tracing::debug;

/// Block blobs in a single Azure container.
pub struct AzureBlobStore {
    client: Client,
    container_url: String,
    credential: StorageCredential,
}

impl AzureBlobStore {
    pub fn new(client: Client, config: &AzureStorageConfig) -> Self {
        Self {
            client,
            container_url: format!("{}/{}", config.service_url(), config.container),
            credential: config.credential.clone(),
        }
    }

    fn request(&self, method: Method, blob: &BlobName) -> RequestBuilder {
        let mut url = format!("{}/{}", self.container_url, blob);
        if let StorageCredential::SasToken(sas) = &self.credential {
            url.push('?');
            url.push_str(sas);
        }

        let request = self
            .client
            .request(method, url)
            .header("x-ms-version", BLOB_SERVICE_VERSION)
            .header(
                "x-ms-date",
                chrono::Utc::now()
                    .format("%a, %d %b %Y %H:%M:%S GMT")
                    .to_string(),
            );

        match &self.credential {
            StorageCredential::Bearer(token) => request.bearer_auth(token),
            StorageCredential::SasToken(_) | StorageCredential::Anonymous => request,
        }
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    fn name(&self) -> &str {
        "azure"
    }

    async fn upload(
        &self,
        blob: &BlobName,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> StorageResult<BlobResponse> {
        debug!(blob = %blob, size = bytes.len(), "Uploading block blob");

        let response = self
            .request(Method::PUT, blob)
            .header("x-ms-blob-type", "BlockBlob")
            .header("x-ms-blob-content-type", content_type)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        into_blob_response(response).await
    }

    async fn delete(&self, blob: &BlobName) -> StorageResult<BlobResponse> {
        debug!(blob = %blob, "Deleting blob");

        let response = self.request(Method::DELETE, blob).send().await?;
        into_blob_response(response).await
    }

    async fn exists(&self, blob: &BlobName) -> StorageResult<bool> {
        let response = self.request(Method::HEAD, blob).send().await?;
        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => into_blob_response(response).await.map(|_| false),
        }
    }
}

async fn into_blob_response(response: Response) -> StorageResult<BlobResponse> {
    let status = response.status();
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    if status.is_success() {
        return Ok(BlobResponse {
            status: status.as_u16(),
            request_id: header("x-ms-request-id"),
            etag: header("etag"),
        });
    }

    let error_code = header("x-ms-error-code");
    let body = response.text().await.unwrap_or_default();
    let message = error_code
        .or_else(|| Some(body).filter(|b| !b.trim().is_empty()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

    Err(StorageError::Rejected {
        status: status.as_u16(),
        message,
    })
}
