//! Constants used throughout the receipt core crate.

/// Default directory for the `local` storage backend.
pub const DEFAULT_LOCAL_BLOB_DIR: &str = "receipt_blobs";

/// Default delay between analysis status polls, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Default number of status polls before an analysis is reported as timed out.
pub const DEFAULT_MAX_POLLS: u32 = 60;

/// Default timeout for outbound HTTP requests, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 120;

/// Prebuilt receipt model of the document analysis service.
pub const RECEIPT_MODEL_ID: &str = "prebuilt-receipt";

/// Document analysis REST API version.
pub const ANALYZE_API_VERSION: &str = "2023-07-31";

/// Blob service REST API version sent as `x-ms-version`.
pub const BLOB_SERVICE_VERSION: &str = "2021-08-06";

/// Status reported by in-process backends for a successful upload (matches Put Blob).
pub const UPLOAD_CREATED_STATUS: u16 = 201;

/// Status reported by in-process backends for a successful delete (matches Delete Blob).
pub const DELETE_ACCEPTED_STATUS: u16 = 202;
