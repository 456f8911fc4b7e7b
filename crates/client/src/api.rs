//! Typed client for the receipt REST routes.

use crate::error::{ClientError, ClientResult};
use api_shared::{AnalyzedItem, CustomErrorResponse, Receipt, StatusMessage};
use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// The three receipt operations the server exposes.
#[async_trait]
pub trait ReceiptApi: Send + Sync {
    async fn upload_receipt(&self, receipt: &Receipt) -> ClientResult<StatusMessage>;

    /// Returns the analyzed items, or `None` when the document had no items field.
    async fn analyze_receipt(&self, receipt: &Receipt) -> ClientResult<Option<Vec<AnalyzedItem>>>;

    async fn delete_receipt(&self, receipt: &Receipt) -> ClientResult<StatusMessage>;
}

pub struct HttpReceiptApi {
    client: Client,
    base_url: String,
}

impl HttpReceiptApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        receipt: &Receipt,
    ) -> ClientResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, id = %receipt.id, "Sending receipt request");

        let response = self
            .client
            .request(method, url)
            .json(receipt)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }
}

/// Turns a non-2xx response into [`ClientError::Server`], decoding the server's error body
/// when it has one.
async fn ensure_success(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<CustomErrorResponse>(&text).unwrap_or_else(|_| {
        let message = if text.is_empty() {
            status.canonical_reason().unwrap_or("request failed").to_string()
        } else {
            text
        };
        CustomErrorResponse::new(message, status.as_u16())
    });
    Err(ClientError::Server(body))
}

#[async_trait]
impl ReceiptApi for HttpReceiptApi {
    async fn upload_receipt(&self, receipt: &Receipt) -> ClientResult<StatusMessage> {
        self.send(Method::POST, "/azure/upload", receipt).await
    }

    async fn analyze_receipt(&self, receipt: &Receipt) -> ClientResult<Option<Vec<AnalyzedItem>>> {
        self.send(Method::POST, "/azure/analyze", receipt).await
    }

    async fn delete_receipt(&self, receipt: &Receipt) -> ClientResult<StatusMessage> {
        self.send(Method::DELETE, "/azure/delete", receipt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn spawn_server() -> String {
        let app = Router::new()
            .route(
                "/azure/upload",
                post(|| async {
                    (
                        StatusCode::CREATED,
                        Json(json!({"message": "Uploading receipt was successful"})),
                    )
                }),
            )
            .route(
                "/azure/analyze",
                post(|Json(receipt): Json<Value>| async move {
                    if receipt["id"] == "empty" {
                        return (StatusCode::OK, Json(Value::Null));
                    }
                    (
                        StatusCode::OK,
                        Json(json!([{"kind": "item", "properties": {"name": "Milk"}}])),
                    )
                }),
            )
            .route(
                "/azure/delete",
                axum::routing::delete(|| async {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({"message": "Receipt does not exist", "statusCode": 404})),
                    )
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/", listener.local_addr().unwrap());
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        base
    }

    fn receipt(id: &str) -> Receipt {
        Receipt {
            id: id.into(),
            content: "data:image/png;base64,iVBORw0KGgo=".into(),
            uploaded_to_blob_storage: true,
        }
    }

    #[tokio::test]
    async fn decodes_success_bodies() {
        let api = HttpReceiptApi::new(spawn_server().await);

        let uploaded = api.upload_receipt(&receipt("r1")).await.unwrap();
        assert_eq!(uploaded.message, "Uploading receipt was successful");

        let items = api.analyze_receipt(&receipt("r1")).await.unwrap().unwrap();
        assert_eq!(items[0].kind, "item");
        assert_eq!(items[0].properties["name"], json!("Milk"));

        assert_eq!(api.analyze_receipt(&receipt("empty")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn decodes_error_bodies() {
        let api = HttpReceiptApi::new(spawn_server().await);

        let err = api.delete_receipt(&receipt("r1")).await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert!(matches!(
            err,
            ClientError::Server(ref body) if body.message == "Receipt does not exist"
        ));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let api = HttpReceiptApi::new("http://127.0.0.1:9");
        let err = api.upload_receipt(&receipt("r1")).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(err.status_code(), None);
    }
}
