use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use receipt_client::{
    capture_receipt, capture_receipt_with_id, Action, ClickOutcome, HttpReceiptApi, OcrProcessor,
    Receipt, ReceiptActions, Store, DEFAULT_SERVER_URL,
};

#[derive(Parser)]
#[command(name = "receipt")]
#[command(about = "Receipt processor CLI")]
struct Cli {
    /// Receipt server base URL
    #[arg(long, global = true, env = "RECEIPT_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    server: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a receipt image to blob storage
    Upload {
        /// Image file
        file: PathBuf,
        /// Receipt id (generated if omitted)
        #[arg(long)]
        id: Option<String>,
    },
    /// Analyze a receipt that was already uploaded
    Analyze {
        /// Image file the receipt was uploaded from
        file: PathBuf,
        /// Receipt id used for the upload
        #[arg(long)]
        id: String,
    },
    /// Delete an uploaded receipt
    Delete {
        /// Image file the receipt was uploaded from
        file: PathBuf,
        /// Receipt id used for the upload
        #[arg(long)]
        id: String,
    },
    /// Upload and analyze a receipt image, then print the items
    Process {
        /// Image file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let api = Arc::new(HttpReceiptApi::new(cli.server));
    let store = Store::default();
    let actions = ReceiptActions::new(api.clone(), store.clone());
    let processor = OcrProcessor::new(api, store.clone());

    match cli.command {
        Some(Commands::Upload { file, id }) => {
            let bytes = read_image(&file).await?;
            let receipt = match id {
                Some(id) => capture_receipt_with_id(&id, &bytes)?,
                None => capture_receipt(&bytes)?,
            };
            store.dispatch(Action::SetReceipt(receipt.clone()));
            let res = actions.upload().await?;
            println!("{} (id: {})", res.message, receipt.id);
        }
        Some(Commands::Analyze { file, id }) => {
            let mut receipt = capture_receipt_with_id(&id, &read_image(&file).await?)?;
            receipt.uploaded_to_blob_storage = true;
            analyze(&processor, &store, &receipt).await?;
        }
        Some(Commands::Delete { file, id }) => {
            let mut receipt = capture_receipt_with_id(&id, &read_image(&file).await?)?;
            receipt.uploaded_to_blob_storage = true;
            store.dispatch(Action::SetReceipt(receipt));
            let res = actions.delete().await?;
            println!("{}", res.message);
        }
        Some(Commands::Process { file }) => {
            let receipt = actions.capture(&read_image(&file).await?)?;
            let res = actions.upload().await?;
            eprintln!("{} (id: {})", res.message, receipt.id);

            let uploaded = store.snapshot().receipt.unwrap_or(receipt);
            analyze(&processor, &store, &uploaded).await?;
        }
        None => {
            println!("Use 'receipt --help' for commands");
        }
    }

    Ok(())
}

async fn read_image(file: &Path) -> anyhow::Result<Vec<u8>> {
    tokio::fs::read(file)
        .await
        .map_err(|e| anyhow::anyhow!("cannot read {}: {}", file.display(), e))
}

async fn analyze(
    processor: &OcrProcessor,
    store: &Store,
    receipt: &Receipt,
) -> anyhow::Result<()> {
    match processor.click(receipt).await? {
        ClickOutcome::Analyzed(count) => {
            eprintln!("Analyzed {} item(s)", count);
            let result = store.snapshot().ocr_azure_result;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        ClickOutcome::Blocked | ClickOutcome::Ignored => {
            anyhow::bail!("receipt is not ready for analysis");
        }
    }
    Ok(())
}
