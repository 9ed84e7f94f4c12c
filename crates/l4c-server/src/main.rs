//! l4c-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `L4C_*` environment variables, opens the SQLite store, and serves the API
//! and public pages over HTTP.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use l4c_api::AppState;
use l4c_remote::{GithubClient, VapiClient};
use l4c_server::{Live, ServerConfig};
use l4c_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Link4Coders portfolio server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
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

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let github = GithubClient::new(server_cfg.github.clone()).context("failed to build GitHub client")?;
  let vapi = VapiClient::new(server_cfg.vapi.clone()).context("failed to build VAPI client")?;
  if vapi.config().private_key.is_none() {
    tracing::warn!("no VAPI private key configured; assistants will be stored as placeholders");
  }

  let state = AppState::<Live>::new(store, github, vapi, server_cfg.api_config());
  let app = l4c_server::app(state);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
