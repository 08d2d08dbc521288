use clap::{Parser, Subcommand};
use docstore::{DocumentPatch, DocumentStore, StoreConfig, UploadFile};
use docstore_core::{HttpDocumentApi, StaticSession};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Command-line client for a remote document library.
#[derive(Parser, Debug)]
#[command(name = "docstore", version, about)]
struct Cli {
    /// JSON configuration file
    #[arg(long, env = "DOCSTORE_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides `api.base_url` from the configuration file
    #[arg(long, env = "DOCSTORE_BASE_URL")]
    base_url: Option<String>,

    /// Signed-in user
    #[arg(long, env = "DOCSTORE_USER_ID")]
    user: Option<String>,

    /// Bearer token for API requests
    #[arg(long, env = "DOCSTORE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the user's library
    List,
    /// Show one document with its content
    Show { id: String },
    /// Full-text search
    Search { query: String },
    /// Upload a file as a new document
    Upload {
        path: PathBuf,
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Update a document's title, author or tag
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        tag: Option<String>,
    },
    /// Delete a document
    Delete { id: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let mut config = match &cli.config {
        Some(path) => load_config(path).await?,
        None => StoreConfig::default(),
    };
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }

    let session = Arc::new(StaticSession::new(cli.user, cli.token));
    let api = HttpDocumentApi::new(
        &config.api.base_url,
        session.clone(),
        config.api.client_options(),
    )
    .map_err(|e| e.to_string())?;
    let store = DocumentStore::new(Arc::new(api), &config);

    match cli.command {
        Command::List => {
            // Each invocation starts with an empty cache, so this always fetches.
            let docs = store
                .load_for_session(session.as_ref(), false)
                .await
                .map_err(|e| e.to_string())?;
            print_json(&docs)
        }
        Command::Show { id } => {
            let doc = store.load_one(&id).await.map_err(|e| e.to_string())?;
            print_json(&doc)
        }
        Command::Search { query } => {
            let docs = store.search(&query).await.map_err(|e| e.to_string())?;
            print_json(&docs)
        }
        Command::Upload { path, content_type } => {
            let file = read_upload(&path, content_type).await?;
            let doc = store.upload(file).await.map_err(|e| e.to_string())?;
            print_json(&doc)
        }
        Command::Update {
            id,
            title,
            author,
            tag,
        } => {
            let patch = DocumentPatch {
                title,
                author,
                tag,
            };
            if patch.is_empty() {
                return Err("nothing to update, pass --title, --author or --tag".into());
            }
            let doc = store
                .update_document_details(&id, &patch)
                .await
                .map_err(|e| e.to_string())?;
            print_json(&doc)
        }
        Command::Delete { id } => {
            store.delete_document(&id).await.map_err(|e| e.to_string())?;
            tracing::info!("deleted {}", id);
            Ok(())
        }
    }
}

async fn load_config(path: &Path) -> Result<StoreConfig, String> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&raw).map_err(|e| format!("invalid config {}: {}", path.display(), e))
}

async fn read_upload(path: &Path, content_type: Option<String>) -> Result<UploadFile, String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    let file_name = path
        .file_name()
        .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());

    let file = UploadFile::new(file_name, bytes::Bytes::from(bytes));
    Ok(match content_type {
        Some(content_type) => file.with_content_type(content_type),
        None => file,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}
