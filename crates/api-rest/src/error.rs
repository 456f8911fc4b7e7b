//! Handler failures and the error middleware that reports them.
//!
//! Handlers never build error bodies themselves. A failed operation becomes an
//! [`OperationFailure`], whose response carries a [`FailureContext`] extension and no body.
//! [`error_middleware`] takes that extension out, logs it and writes the
//! [`CustomErrorResponse`] JSON body, so every failure passes through one place.

use api_shared::CustomErrorResponse;
use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use receipt_core::ReceiptError;

pub const UPLOAD_FAILED: &str = "Failed to upload receipt";
pub const ANALYSIS_FAILED: &str = "Failed to analyze receipt";
pub const DELETE_FAILED: &str = "Receipt does not exist";

const ANALYSIS_FAILURE_STATUS: u16 = 400;
const DEFAULT_FAILURE_STATUS: u16 = 500;

#[derive(Debug, thiserror::Error)]
pub enum OperationFailure {
    #[error("{}", UPLOAD_FAILED)]
    Upload(#[source] ReceiptError),
    #[error("{}", ANALYSIS_FAILED)]
    Analysis(#[source] ReceiptError),
    #[error("{}", DELETE_FAILED)]
    Delete(#[source] ReceiptError),
}

impl OperationFailure {
    fn cause(&self) -> &ReceiptError {
        match self {
            OperationFailure::Upload(e)
            | OperationFailure::Analysis(e)
            | OperationFailure::Delete(e) => e,
        }
    }

    /// Status to report. Analysis always fails with 400; upload and delete pass on the status
    /// the storage layer saw, falling back to 500.
    pub fn status_code(&self) -> u16 {
        match self {
            OperationFailure::Analysis(_) => ANALYSIS_FAILURE_STATUS,
            OperationFailure::Upload(e) | OperationFailure::Delete(e) => e
                .transport_status()
                .filter(|s| (400..600).contains(s))
                .unwrap_or(DEFAULT_FAILURE_STATUS),
        }
    }

    pub fn to_error_response(&self) -> CustomErrorResponse {
        CustomErrorResponse::new(self.to_string(), self.status_code())
    }
}

/// Failure details handed from a handler to [`error_middleware`].
#[derive(Debug, Clone)]
pub struct FailureContext {
    pub error: CustomErrorResponse,
    pub cause: String,
}

impl IntoResponse for OperationFailure {
    fn into_response(self) -> Response {
        let error = self.to_error_response();
        let status =
            StatusCode::from_u16(error.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = status.into_response();
        response.extensions_mut().insert(FailureContext {
            error,
            cause: self.cause().to_string(),
        });
        response
    }
}

/// Writes the JSON body for failed operations and logs them.
pub async fn error_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;
    let Some(failure) = response.extensions_mut().remove::<FailureContext>() else {
        return response;
    };

    tracing::error!(
        %method,
        %path,
        status = failure.error.status_code,
        cause = %failure.cause,
        "{}",
        failure.error.message
    );
    (response.status(), Json(failure.error)).into_response()
}
