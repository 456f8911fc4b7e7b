//! # Receipt Client
//!
//! Client side of the receipt processor: the state a UI renders from and the operations it
//! triggers.
//!
//! - [`store`]: one [`ClientState`] changed only through typed [`Action`]s
//! - [`api`]: typed HTTP client for the upload, analyze and delete routes
//! - [`ocr_processor`]: the analyze trigger (tooltip when not uploaded, loading guard, result ids)
//! - [`capture`]: building a receipt from image bytes, upload, and the delete option
//!
//! Failures are returned to the caller and logged; the only message shown to the user is the
//! "upload first" tooltip.

pub mod api;
pub mod capture;
pub mod error;
pub mod models;
pub mod ocr_processor;
pub mod store;

pub use api_shared::{AnalyzedItem, Receipt};
pub use api::{HttpReceiptApi, ReceiptApi, DEFAULT_SERVER_URL};
pub use capture::{capture_receipt, capture_receipt_with_id, option_fab_buttons, ReceiptActions};
pub use error::{ClientError, ClientResult};
pub use models::{OcrAzureResult, OptionFabButton, OptionFabKey, Tooltip, TooltipId};
pub use ocr_processor::{ClickOutcome, OcrProcessor, ProcessButton};
pub use store::{reduce, Action, ClientState, Store};
