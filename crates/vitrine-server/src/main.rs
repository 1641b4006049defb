//! vitrine-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) plus
//! `VITRINE_*` environment variables, opens the SQLite catalogue and serves
//! the JSON API over HTTP.
//!
//! # Seeding
//!
//! To install the default category tags and exit:
//!
//! ```
//! cargo run -p vitrine-server -- --seed-tags
//! ```

use std::{
  net::SocketAddr,
  path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vitrine_server::{ServerConfig, live_state, seed::seed_default_tags};
use vitrine_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Vitrine influencer catalogue server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Upsert the default category tags and exit.
  #[arg(long)]
  seed_tags: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .set_default("host", "0.0.0.0")?
    .set_default("port", 3001)?
    .set_default("store_path", "vitrine.db")?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("VITRINE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: seed tags and exit.
  if cli.seed_tags {
    let created = seed_default_tags(&store)
      .await
      .context("failed to seed default tags")?;
    println!("{created} tags created");
    return Ok(());
  }

  let state = live_state(store, &server_cfg.scrape)?;
  let app = vitrine_server::router(state, &server_cfg.rate_limit);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(
    upstream = %server_cfg.scrape.upstream_base_url,
    min_spacing_ms = server_cfg.scrape.min_spacing_ms,
    rate_limit = server_cfg.rate_limit.enabled,
    "Listening on http://{address}"
  );
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  // Peer addresses feed the per-client request limit.
  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .await
    .context("server error")?;

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
