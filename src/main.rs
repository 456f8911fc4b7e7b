use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use receipt_core::{CoreConfig, ReceiptService};

/// Main entry point for the receipt processor
///
/// Starts the REST server (default port 3000) with Swagger UI at `/swagger-ui`.
///
/// # Environment Variables
/// - `RECEIPT_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `RECEIPT_STORAGE_BACKEND`: `azure` (default), `local` or `memory`
/// - `AZURE_STORAGE_ACCOUNT_NAME`, `AZURE_STORAGE_CONTAINER`, `AZURE_STORAGE_SAS_TOKEN`,
///   `AZURE_STORAGE_BLOB_PATH`: blob container settings for the `azure` backend
/// - `AZURE_ENDPOINT`, `AZURE_KEY`: document analysis service
///
/// The remaining keys are listed on [`CoreConfig::from_lookup`].
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration is invalid or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("receipt_run=info".parse()?)
                .add_directive("receipt_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("RECEIPT_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = CoreConfig::from_lookup(|key| std::env::var(key).ok())?;
    let service = ReceiptService::from_config(&cfg)?;

    tracing::info!(
        "++ Starting receipt REST on {} (storage: {})",
        rest_addr,
        service.backend_name()
    );

    let app = api_rest::app(AppState::new(service));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
