//! Azure Document Intelligence (Form Recognizer) client for the prebuilt receipt model.
//!
//! Analysis is a long-running operation: the submit call answers `202 Accepted` with an
//! `Operation-Location` URL, which is polled until its status is `succeeded` or `failed`.

use super::{fields, AnalysisError, AnalysisResult, AnalysisSource, DocumentAnalyzer};
use crate::config::AnalysisConfig;
use api_shared::AnalyzedItem;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

pub struct AzureDocumentAnalyzer {
    client: Client,
    endpoint: String,
    key: String,
    model_id: String,
    api_version: String,
    poll_interval: Duration,
    max_polls: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationStatus {
    status: String,
    analyze_result: Option<Value>,
    error: Option<ServiceError>,
}

#[derive(Deserialize)]
struct ServiceError {
    code: Option<String>,
    message: Option<String>,
}

impl AzureDocumentAnalyzer {
    pub fn new(client: Client, config: &AnalysisConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.as_str().trim_end_matches('/').to_string(),
            key: config.key.as_str().to_string(),
            model_id: config.model_id.clone(),
            api_version: config.api_version.clone(),
            poll_interval: config.poll_interval,
            max_polls: config.max_polls,
        }
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/formrecognizer/documentModels/{}:analyze?api-version={}",
            self.endpoint, self.model_id, self.api_version
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(KEY_HEADER, &self.key)
    }

    /// Submits the document and returns the operation URL to poll.
    async fn begin_analyze(&self, source: &AnalysisSource) -> AnalysisResult<String> {
        let body = match source {
            AnalysisSource::Url(url) => json!({ "urlSource": url }),
            AnalysisSource::Inline { bytes, .. } => json!({ "base64Source": BASE64.encode(bytes) }),
        };

        let response = self
            .authorized(self.client.post(self.analyze_url()))
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(AnalysisError::MissingOperationLocation)
    }

    /// Polls the operation until it settles and returns its `analyzeResult`.
    async fn poll_until_done(&self, operation_url: &str) -> AnalysisResult<Value> {
        for _ in 0..self.max_polls {
            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .authorized(self.client.get(operation_url))
                .send()
                .await?;
            let operation: OperationStatus = ensure_success(response).await?.json().await?;

            info!("status: {}", operation.status);
            match operation.status.as_str() {
                "succeeded" => {
                    return operation.analyze_result.ok_or_else(|| {
                        AnalysisError::InvalidResponse("succeeded without analyzeResult".into())
                    })
                }
                "failed" | "canceled" => {
                    let message = operation
                        .error
                        .map(|e| {
                            e.message
                                .or(e.code)
                                .unwrap_or_else(|| "unknown error".to_string())
                        })
                        .unwrap_or_else(|| format!("operation {}", operation.status));
                    return Err(AnalysisError::Failed(message));
                }
                _ => continue,
            }
        }

        Err(AnalysisError::TimedOut {
            polls: self.max_polls,
        })
    }
}

#[async_trait]
impl DocumentAnalyzer for AzureDocumentAnalyzer {
    async fn analyze(&self, source: &AnalysisSource) -> AnalysisResult<Option<Vec<AnalyzedItem>>> {
        debug!(model = %self.model_id, "Submitting document for analysis");
        let operation_url = self.begin_analyze(source).await?;
        let analyze_result = self.poll_until_done(&operation_url).await?;
        fields::first_document_items(&analyze_result)
    }
}

async fn ensure_success(response: Response) -> AnalysisResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AnalysisError::Rejected {
        status: status.as_u16(),
        message: if body.is_empty() {
            "Invalid key or endpoint?".to_string()
        } else {
            body
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::{get, post},
        Json, Router,
    };
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct FakeService {
        base: Arc<Mutex<String>>,
        polls_until_done: u32,
        polls: Arc<AtomicU32>,
        final_status: &'static str,
        submitted: Arc<Mutex<Option<Value>>>,
    }

    impl FakeService {
        fn new(polls_until_done: u32, final_status: &'static str) -> Self {
            Self {
                base: Arc::new(Mutex::new(String::new())),
                polls_until_done,
                polls: Arc::new(AtomicU32::new(0)),
                final_status,
                submitted: Arc::new(Mutex::new(None)),
            }
        }
    }

    async fn submit(
        State(fake): State<FakeService>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> impl IntoResponse {
        if headers.get(KEY_HEADER).map(|v| v.as_bytes()) != Some(b"secret") {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        *fake.submitted.lock().unwrap() = Some(body);
        let location = format!("{}/operations/1", fake.base.lock().unwrap());
        (StatusCode::ACCEPTED, [("Operation-Location", location)]).into_response()
    }

    async fn operation(State(fake): State<FakeService>) -> Json<Value> {
        let seen = fake.polls.fetch_add(1, Ordering::SeqCst) + 1;
        if seen < fake.polls_until_done {
            return Json(json!({"status": "running"}));
        }
        match fake.final_status {
            "succeeded" => Json(json!({
                "status": "succeeded",
                "analyzeResult": {
                    "documents": [{
                        "fields": {
                            "Items": {
                                "type": "array",
                                "valueArray": [
                                    {"type": "object", "valueObject": {"Description": {"type": "string", "valueString": "Milk"}}},
                                    {"type": "object", "valueObject": {"Description": {"type": "string", "valueString": "Bread"}}}
                                ]
                            }
                        }
                    }]
                }
            })),
            _ => Json(json!({
                "status": "failed",
                "error": {"code": "InvalidImage", "message": "The image is corrupted"}
            })),
        }
    }

    async fn spawn_fake(fake: FakeService) -> String {
        let app = Router::new()
            .route("/formrecognizer/documentModels/:model", post(submit))
            .route("/operations/1", get(operation))
            .with_state(fake.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        *fake.base.lock().unwrap() = base.clone();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        base
    }

    fn analyzer(endpoint: &str, key: &str, max_polls: u32) -> AzureDocumentAnalyzer {
        let mut config = AnalysisConfig::new(endpoint, key).unwrap();
        config.poll_interval = Duration::from_millis(5);
        config.max_polls = max_polls;
        AzureDocumentAnalyzer::new(Client::new(), &config)
    }

    #[tokio::test]
    async fn polls_until_succeeded() {
        let fake = FakeService::new(3, "succeeded");
        let endpoint = spawn_fake(fake.clone()).await;

        let items = analyzer(&endpoint, "secret", 10)
            .analyze(&AnalysisSource::Url(
                "https://acct.blob.core.windows.net/receipts/r1.jpeg".into(),
            ))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[1].properties["description"]["value"], json!("Bread"));
        assert_eq!(fake.polls.load(Ordering::SeqCst), 3);
        assert_eq!(
            fake.submitted.lock().unwrap().clone(),
            Some(json!({"urlSource": "https://acct.blob.core.windows.net/receipts/r1.jpeg"}))
        );
    }

    #[tokio::test]
    async fn inline_source_is_base64_encoded() {
        let fake = FakeService::new(1, "succeeded");
        let endpoint = spawn_fake(fake.clone()).await;

        analyzer(&endpoint, "secret", 3)
            .analyze(&AnalysisSource::Inline {
                content_type: "image/jpeg".into(),
                bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
            })
            .await
            .unwrap();

        assert_eq!(
            fake.submitted.lock().unwrap().clone(),
            Some(json!({"base64Source": "/9j/4A=="}))
        );
    }

    #[tokio::test]
    async fn failed_operation_reports_service_message() {
        let endpoint = spawn_fake(FakeService::new(1, "failed")).await;

        let err = analyzer(&endpoint, "secret", 3)
            .analyze(&AnalysisSource::Url("https://x/r1.png".into()))
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::Failed(ref m) if m == "The image is corrupted"));
    }

    #[tokio::test]
    async fn gives_up_after_max_polls() {
        let fake = FakeService::new(100, "succeeded");
        let endpoint = spawn_fake(fake.clone()).await;

        let err = analyzer(&endpoint, "secret", 2)
            .analyze(&AnalysisSource::Url("https://x/r1.png".into()))
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::TimedOut { polls: 2 }));
        assert_eq!(fake.polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn wrong_key_is_rejected_with_status() {
        let endpoint = spawn_fake(FakeService::new(1, "succeeded")).await;

        let err = analyzer(&endpoint, "wrong", 3)
            .analyze(&AnalysisSource::Url("https://x/r1.png".into()))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(401));
    }
}
