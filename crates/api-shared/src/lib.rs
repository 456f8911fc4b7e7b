//! # API Shared
//!
//! Wire types shared by the REST server and its clients.
//!
//! Contains:
//! - Request/response bodies (`models` module), with OpenAPI schemas
//! - Shared services like `HealthService`
//!
//! Used by `api-rest`, `receipt-core` and `receipt-client`.

pub mod health;
pub mod models;

pub use health::HealthService;
pub use models::*;
