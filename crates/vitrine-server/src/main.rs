//! vitrine server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `VITRINE_*` environment variables, connects the configured remote store
//! and local cache, and serves the JSON API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `admin_password_hash`:
//!
//! ```sh
//! cargo run -p vitrine-server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vitrine_core::{
  cache::{FileCache, LocalCache, MemoryCache},
  site::Site,
  store::RemoteStore,
};
use vitrine_server::{Backend, ServerConfig, auth};
use vitrine_store_rest::RestStore;
use vitrine_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Vitrine content server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
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

  // Helper mode: hash a password and exit.
  if cli.hash_password {
    let password = rpassword_or_stdin()?;
    let hash = auth::hash_password(&password)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("VITRINE"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if server_cfg.admin_password_hash.is_none() {
    tracing::warn!("no admin_password_hash configured; admin routes are locked");
  }

  match server_cfg.backend {
    Backend::Rest => {
      let store = RestStore::new(server_cfg.rest()).context("failed to build HTTP client")?;
      tracing::info!(url = %server_cfg.store_url, "using remote row store");
      with_cache(store, &server_cfg).await
    }
    Backend::Sqlite => {
      let path = expand_tilde(&server_cfg.sqlite_path);
      let store = SqliteStore::open(&path)
        .await
        .with_context(|| format!("failed to open store at {path:?}"))?;
      tracing::info!(?path, "using SQLite store");
      with_cache(store, &server_cfg).await
    }
  }
}

async fn with_cache<R>(store: R, cfg: &ServerConfig) -> anyhow::Result<()>
where
  R: RemoteStore + 'static,
{
  match &cfg.cache_dir {
    Some(dir) => {
      let dir = expand_tilde(dir);
      let cache = FileCache::open(&dir)
        .with_context(|| format!("failed to open cache directory {dir:?}"))?;
      serve(store, cache, cfg).await
    }
    None => serve(store, MemoryCache::new(), cfg).await,
  }
}

async fn serve<R, C>(store: R, cache: C, cfg: &ServerConfig) -> anyhow::Result<()>
where
  R: RemoteStore + 'static,
  C: LocalCache + 'static,
{
  let site = Arc::new(Site::new(Arc::new(store), Arc::new(cache)));
  let app = vitrine_server::router(site, Arc::new(cfg.auth()));
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn rpassword_or_stdin() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
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
