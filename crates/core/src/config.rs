//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into [`ReceiptService`].
//! Nothing in this crate reads process-wide environment variables during request handling;
//! [`CoreConfig::from_lookup`] takes the lookup as a closure so tests can supply values directly.
//!
//! [`ReceiptService`]: crate::ReceiptService

use crate::constants::{
    ANALYZE_API_VERSION, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_LOCAL_BLOB_DIR, DEFAULT_MAX_POLLS,
    DEFAULT_POLL_INTERVAL_MS, RECEIPT_MODEL_ID,
};
use crate::{ReceiptError, ReceiptResult};
use receipt_types::NonEmptyText;
use std::path::PathBuf;
use std::time::Duration;

/// How requests to the blob service are authorised.
#[derive(Clone, PartialEq, Eq)]
pub enum StorageCredential {
    /// Container allows anonymous writes (emulators only).
    Anonymous,
    /// Shared access signature appended to every blob URL.
    SasToken(String),
    /// OAuth bearer token sent in `Authorization`.
    Bearer(String),
}

impl std::fmt::Debug for StorageCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageCredential::Anonymous => f.write_str("Anonymous"),
            StorageCredential::SasToken(_) => f.write_str("SasToken(..)"),
            StorageCredential::Bearer(_) => f.write_str("Bearer(..)"),
        }
    }
}

/// Azure blob container settings.
#[derive(Clone, Debug)]
pub struct AzureStorageConfig {
    pub account_name: NonEmptyText,
    pub container: NonEmptyText,
    pub credential: StorageCredential,
    /// Overrides `https://{account}.blob.core.windows.net` (e.g. an Azurite emulator).
    pub endpoint_override: Option<String>,
}

impl AzureStorageConfig {
    /// Base URL of the blob service, without a trailing slash.
    pub fn service_url(&self) -> String {
        match &self.endpoint_override {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.blob.core.windows.net", self.account_name),
        }
    }
}

/// Which object storage backend receipts are written to.
#[derive(Clone, Debug)]
pub enum StorageBackend {
    Azure(AzureStorageConfig),
    Local { root: PathBuf },
    Memory,
}

impl StorageBackend {
    pub fn name(&self) -> &'static str {
        match self {
            StorageBackend::Azure(_) => "azure",
            StorageBackend::Local { .. } => "local",
            StorageBackend::Memory => "memory",
        }
    }
}

/// Document analysis service settings.
#[derive(Clone)]
pub struct AnalysisConfig {
    pub endpoint: NonEmptyText,
    pub key: NonEmptyText,
    pub model_id: String,
    pub api_version: String,
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl std::fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("endpoint", &self.endpoint)
            .field("model_id", &self.model_id)
            .field("api_version", &self.api_version)
            .field("poll_interval", &self.poll_interval)
            .field("max_polls", &self.max_polls)
            .finish_non_exhaustive()
    }
}

impl AnalysisConfig {
    /// Settings for the prebuilt receipt model with default polling.
    pub fn new(endpoint: &str, key: &str) -> ReceiptResult<Self> {
        Ok(Self {
            endpoint: required("AZURE_ENDPOINT", Some(endpoint.to_string()))?,
            key: required("AZURE_KEY", Some(key.to_string()))?,
            model_id: RECEIPT_MODEL_ID.to_string(),
            api_version: ANALYZE_API_VERSION.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_polls: DEFAULT_MAX_POLLS,
        })
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    storage: StorageBackend,
    blob_path_prefix: Option<String>,
    analysis: AnalysisConfig,
    http_timeout: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// The analysis service fetches Azure blobs by URL, so the Azure backend requires a public
    /// blob path prefix. Other backends send images inline and ignore the prefix.
    pub fn new(
        storage: StorageBackend,
        blob_path_prefix: Option<String>,
        analysis: AnalysisConfig,
        http_timeout: Duration,
    ) -> ReceiptResult<Self> {
        let blob_path_prefix = blob_path_prefix
            .map(|p| p.trim().trim_end_matches('/').to_string())
            .filter(|p| !p.is_empty());

        if matches!(storage, StorageBackend::Azure(_)) && blob_path_prefix.is_none() {
            return Err(ReceiptError::InvalidInput(
                "AZURE_STORAGE_BLOB_PATH is required for the azure storage backend".into(),
            ));
        }
        if http_timeout.is_zero() {
            return Err(ReceiptError::InvalidInput(
                "http timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            storage,
            blob_path_prefix,
            analysis,
            http_timeout,
        })
    }

    /// Build the configuration from a key lookup, normally `|k| std::env::var(k).ok()`.
    ///
    /// Keys: `RECEIPT_STORAGE_BACKEND`, `RECEIPT_LOCAL_BLOB_DIR`, `AZURE_STORAGE_ACCOUNT_NAME`,
    /// `AZURE_STORAGE_CONTAINER`, `AZURE_STORAGE_SAS_TOKEN`, `AZURE_STORAGE_BEARER_TOKEN`,
    /// `AZURE_STORAGE_BLOB_ENDPOINT`, `AZURE_STORAGE_BLOB_PATH`, `AZURE_ENDPOINT`, `AZURE_KEY`,
    /// `RECEIPT_ANALYSIS_POLL_INTERVAL_MS`, `RECEIPT_ANALYSIS_MAX_POLLS`,
    /// `RECEIPT_HTTP_TIMEOUT_SECS`.
    pub fn from_lookup<F>(lookup: F) -> ReceiptResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage = match storage_backend_name_from_env_value(lookup("RECEIPT_STORAGE_BACKEND"))?
        {
            "azure" => StorageBackend::Azure(AzureStorageConfig {
                account_name: required(
                    "AZURE_STORAGE_ACCOUNT_NAME",
                    lookup("AZURE_STORAGE_ACCOUNT_NAME"),
                )?,
                container: required("AZURE_STORAGE_CONTAINER", lookup("AZURE_STORAGE_CONTAINER"))?,
                credential: storage_credential_from_env_values(
                    lookup("AZURE_STORAGE_SAS_TOKEN"),
                    lookup("AZURE_STORAGE_BEARER_TOKEN"),
                ),
                endpoint_override: non_empty(lookup("AZURE_STORAGE_BLOB_ENDPOINT")),
            }),
            "local" => StorageBackend::Local {
                root: non_empty(lookup("RECEIPT_LOCAL_BLOB_DIR"))
                    .unwrap_or_else(|| DEFAULT_LOCAL_BLOB_DIR.to_string())
                    .into(),
            },
            _ => StorageBackend::Memory,
        };

        let mut analysis = AnalysisConfig::new(
            required("AZURE_ENDPOINT", lookup("AZURE_ENDPOINT"))?.as_str(),
            required("AZURE_KEY", lookup("AZURE_KEY"))?.as_str(),
        )?;
        analysis.poll_interval = Duration::from_millis(u64_from_env_value(
            "RECEIPT_ANALYSIS_POLL_INTERVAL_MS",
            lookup("RECEIPT_ANALYSIS_POLL_INTERVAL_MS"),
            DEFAULT_POLL_INTERVAL_MS,
        )?);
        analysis.max_polls = u64_from_env_value(
            "RECEIPT_ANALYSIS_MAX_POLLS",
            lookup("RECEIPT_ANALYSIS_MAX_POLLS"),
            u64::from(DEFAULT_MAX_POLLS),
        )?
        .try_into()
        .map_err(|_| ReceiptError::InvalidInput("RECEIPT_ANALYSIS_MAX_POLLS is too large".into()))?;
        if analysis.max_polls == 0 {
            return Err(ReceiptError::InvalidInput(
                "RECEIPT_ANALYSIS_MAX_POLLS must be at least 1".into(),
            ));
        }

        let http_timeout = Duration::from_secs(u64_from_env_value(
            "RECEIPT_HTTP_TIMEOUT_SECS",
            lookup("RECEIPT_HTTP_TIMEOUT_SECS"),
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?);

        Self::new(
            storage,
            lookup("AZURE_STORAGE_BLOB_PATH"),
            analysis,
            http_timeout,
        )
    }

    pub fn storage(&self) -> &StorageBackend {
        &self.storage
    }

    pub fn blob_path_prefix(&self) -> Option<&str> {
        self.blob_path_prefix.as_deref()
    }

    pub fn analysis(&self) -> &AnalysisConfig {
        &self.analysis
    }

    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }
}

/// Parse the storage backend name. Missing or empty values select `azure`.
pub fn storage_backend_name_from_env_value(value: Option<String>) -> ReceiptResult<&'static str> {
    match non_empty(value).map(|v| v.to_ascii_lowercase()).as_deref() {
        None | Some("azure") => Ok("azure"),
        Some("local") => Ok("local"),
        Some("memory") => Ok("memory"),
        Some(other) => Err(ReceiptError::InvalidInput(format!(
            "RECEIPT_STORAGE_BACKEND must be azure, local or memory, got {other:?}"
        ))),
    }
}

/// Pick the blob credential. A SAS token wins over a bearer token; neither means anonymous.
pub fn storage_credential_from_env_values(
    sas_token: Option<String>,
    bearer_token: Option<String>,
) -> StorageCredential {
    if let Some(sas) = non_empty(sas_token) {
        return StorageCredential::SasToken(sas.trim_start_matches('?').to_string());
    }
    match non_empty(bearer_token) {
        Some(token) => StorageCredential::Bearer(token),
        None => StorageCredential::Anonymous,
    }
}

fn u64_from_env_value(name: &str, value: Option<String>, default: u64) -> ReceiptResult<u64> {
    match non_empty(value) {
        None => Ok(default),
        Some(v) => v
            .parse::<u64>()
            .map_err(|_| ReceiptError::InvalidInput(format!("{name} must be an integer, got {v:?}"))),
    }
}

fn required(name: &str, value: Option<String>) -> ReceiptResult<NonEmptyText> {
    value
        .and_then(|v| NonEmptyText::new(v).ok())
        .ok_or_else(|| ReceiptError::InvalidInput(format!("{name} must be set")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
