//! # API REST
//!
//! REST API for the receipt processor.
//!
//! Handles:
//! - HTTP endpoints with axum (`/azure/upload`, `/azure/analyze`, `/azure/delete`, `/health`)
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes, error bodies)
//!
//! Uses `api-shared` for the wire types and `receipt-core` for the operations themselves.

#![warn(rust_2018_idioms)]

pub mod error;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{AnalyzedItem, CustomErrorResponse, HealthRes, HealthService, Receipt, StatusMessage};
use error::{error_middleware, OperationFailure};
use receipt_core::{ReceiptError, ReceiptService};

pub const UPLOAD_SUCCEEDED: &str = "Uploading receipt was successful";
pub const DELETE_SUCCEEDED: &str = "Deleting receipt was successful";

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReceiptService>,
}

impl AppState {
    pub fn new(service: ReceiptService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, upload_receipt, analyze_receipt, delete_receipt),
    components(schemas(
        HealthRes,
        Receipt,
        AnalyzedItem,
        StatusMessage,
        CustomErrorResponse
    ))
)]
pub struct ApiDoc;

/// Builds the REST router.
///
/// Receipt routes run behind [`error_middleware`]; the whole app is wrapped in request tracing
/// and permissive CORS so a browser client on another origin can call it.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/azure/upload", post(upload_receipt))
        .route("/azure/analyze", post(analyze_receipt))
        .route("/azure/delete", delete(delete_receipt))
        .layer(middleware::from_fn(error_middleware))
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/azure/upload",
    request_body = Receipt,
    responses(
        (status = 201, description = "Receipt stored", body = StatusMessage),
        (status = 400, description = "Receipt content is not a base64 data URL", body = CustomErrorResponse),
        (status = 500, description = "Storage failure", body = CustomErrorResponse)
    )
)]
/// Upload a receipt image to blob storage
///
/// Decodes the receipt's data URL and stores the bytes as `{id}.{extension}`.
///
/// # Returns
/// * `Ok((StatusCode, Json<StatusMessage>))` - The storage service's status and a success message
///
/// # Errors
/// Returns `Failed to upload receipt` with the storage status (400 for undecodable content,
/// 500 when no status was received).
#[axum::debug_handler]
async fn upload_receipt(
    State(state): State<AppState>,
    payload: Result<Json<Receipt>, JsonRejection>,
) -> Result<(StatusCode, Json<StatusMessage>), OperationFailure> {
    let receipt = parse_receipt(payload).map_err(OperationFailure::Upload)?;
    let response = state
        .service
        .upload(&receipt)
        .await
        .map_err(OperationFailure::Upload)?;

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::CREATED);
    Ok((
        status,
        Json(StatusMessage {
            message: UPLOAD_SUCCEEDED.into(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/azure/analyze",
    request_body = Receipt,
    responses(
        (status = 200, description = "Items of the first recognised document, or null", body = Vec<AnalyzedItem>),
        (status = 400, description = "Analysis failed", body = CustomErrorResponse)
    )
)]
/// Analyze a stored receipt with the prebuilt receipt model
///
/// Waits for the analysis to finish and returns the `items` field of the first document.
///
/// # Errors
/// Returns `Failed to analyze receipt` with status 400 for any failure.
#[axum::debug_handler]
async fn analyze_receipt(
    State(state): State<AppState>,
    payload: Result<Json<Receipt>, JsonRejection>,
) -> Result<Json<Option<Vec<AnalyzedItem>>>, OperationFailure> {
    let receipt = parse_receipt(payload).map_err(OperationFailure::Analysis)?;
    state
        .service
        .analyze(&receipt)
        .await
        .map(Json)
        .map_err(OperationFailure::Analysis)
}

#[utoipa::path(
    delete,
    path = "/azure/delete",
    request_body = Receipt,
    responses(
        (status = 200, description = "Receipt deleted", body = StatusMessage),
        (status = 404, description = "Receipt does not exist", body = CustomErrorResponse),
        (status = 500, description = "Storage failure", body = CustomErrorResponse)
    )
)]
/// Delete a receipt image from blob storage
///
/// # Errors
/// Returns `Receipt does not exist` with the storage status (404 when the blob is missing,
/// 500 when no status was received).
#[axum::debug_handler]
async fn delete_receipt(
    State(state): State<AppState>,
    payload: Result<Json<Receipt>, JsonRejection>,
) -> Result<Json<StatusMessage>, OperationFailure> {
    let receipt = parse_receipt(payload).map_err(OperationFailure::Delete)?;
    state
        .service
        .delete(&receipt)
        .await
        .map_err(OperationFailure::Delete)?;

    Ok(Json(StatusMessage {
        message: DELETE_SUCCEEDED.into(),
    }))
}

/// Turns axum's body rejection into a receipt error so it is reported by the error middleware
/// like any other failure of the operation.
fn parse_receipt(payload: Result<Json<Receipt>, JsonRejection>) -> Result<Receipt, ReceiptError> {
    payload
        .map(|Json(receipt)| receipt)
        .map_err(|rejection| ReceiptError::MalformedBody(rejection.body_text()))
}
