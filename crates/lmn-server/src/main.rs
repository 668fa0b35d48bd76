//! LMN server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store and media root, and serves the JSON API over HTTP.
//!
//! ```text
//! lmn-server serve
//! lmn-server --config /etc/lmn.toml import catalog.json
//! ```

mod import;
mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use lmn_api::AppState;
use lmn_core::{media::MediaRoot, service::Service};
use lmn_store_sqlite::SqliteStore;
use settings::{ServerConfig, expand_tilde};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Live music notes server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Load venues, artists and shows from a JSON catalog file.
  Import {
    file: PathBuf,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;

  let database_path = expand_tilde(&cfg.database_path);
  let store = SqliteStore::open(&database_path)
    .await
    .with_context(|| format!("failed to open store at {database_path:?}"))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(cfg, store).await,
    Command::Import { file } => {
      let catalog = import::CatalogFile::read(&file).await?;
      let summary = import::import_catalog(&store, catalog).await?;
      println!(
        "imported {} venues, {} artists, {} shows",
        summary.venues, summary.artists, summary.shows
      );
      Ok(())
    }
  }
}

async fn serve(cfg: ServerConfig, store: SqliteStore) -> anyhow::Result<()> {
  let media_root = expand_tilde(&cfg.media_root);
  tokio::fs::create_dir_all(&media_root)
    .await
    .with_context(|| format!("failed to create media root {media_root:?}"))?;

  let service = Service::new(
    Arc::new(store),
    MediaRoot::new(media_root, cfg.max_upload_bytes),
    cfg.badge_policy()?,
  );
  let app = lmn_api::api_router(AppState::new(service));
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
