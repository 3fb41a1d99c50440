//! echoes - upload pipeline and gallery for the Echoes installation
//!
//! # サブコマンド
//! - `serve`: HTTP API を起動
//! - `upload <path>`: 1 枚の画像を pipeline に通す
//! - `gallery`: 表示可能な contribution を一覧
//! - `cleanup <folder_key>`: folder の artifact を削除

mod api;
mod config;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use echoes_core::app::{GalleryReader, cleanup_folder};
use echoes_core::domain::FolderKey;
use echoes_core::impls::TracingProgressSink;
use tracing::info;

use crate::api::{AppState, DEFAULT_BODY_LIMIT, build_router};
use crate::config::Config;

#[derive(Parser)]
#[command(name = "echoes", version, about)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API.
    Serve {
        #[arg(long, env = "ECHOES_BIND", default_value = "127.0.0.1:3000")]
        bind: SocketAddr,

        /// Set to false to refuse uploads with 503.
        #[arg(long, env = "ECHOES_ACCEPTING_UPLOADS", default_value_t = true, action = ArgAction::Set)]
        accepting_uploads: bool,

        #[arg(long, env = "ECHOES_BODY_LIMIT", default_value_t = DEFAULT_BODY_LIMIT)]
        body_limit: usize,
    },
    /// Run one image through the pipeline and print the contribution.
    Upload {
        path: PathBuf,

        /// Defaults to a guess from the file extension.
        #[arg(long)]
        mime: Option<String>,
    },
    /// Print displayable contributions, newest first.
    Gallery,
    /// Delete every artifact of one folder.
    Cleanup { folder_key: FolderKey },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    match cli.command {
        Command::Serve {
            bind,
            accepting_uploads,
            body_limit,
        } => {
            info!("Starting echoes v{}", env!("CARGO_PKG_VERSION"));
            let store = config.blob_store()?;
            let orchestrator = config.orchestrator(store, Arc::new(TracingProgressSink))?;
            let app = build_router(AppState::new(orchestrator, accepting_uploads), body_limit);

            let listener = tokio::net::TcpListener::bind(bind).await?;
            info!(%bind, accepting_uploads, store = ?config.store, "echoes listening");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        Command::Upload { path, mime } => {
            let mime = match mime {
                Some(mime) => mime,
                None => guess_mime(&path)?.to_string(),
            };
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            let orchestrator = config.orchestrator(config.blob_store()?, Arc::new(TracingProgressSink))?;
            let contribution = orchestrator.run(bytes.into(), &mime).await?;
            println!("{}", serde_json::to_string_pretty(&contribution)?);
        }
        Command::Gallery => {
            let entries = GalleryReader::new(config.blob_store()?).list_complete().await?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Command::Cleanup { folder_key } => {
            let store = config.blob_store()?;
            let report = cleanup_folder(store.as_ref(), folder_key).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.is_complete() {
                bail!("cleanup of {folder_key} is incomplete");
            }
        }
    }
    Ok(())
}

fn guess_mime(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    Ok(match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        _ => bail!("cannot tell the image type of {}, pass --mime", path.display()),
    })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
