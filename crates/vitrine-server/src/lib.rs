//! HTTP server assembly for Vitrine.
//!
//! Wires a [`Site`] over the configured remote store and local cache into the
//! public and admin routers, with the admin half behind Basic auth.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use vitrine_core::{cache::LocalCache, site::Site, store::RemoteStore};
use vitrine_store_rest::RestConfig;

use auth::{AuthConfig, require_admin};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Used when `store_url` is not configured.
pub const FALLBACK_STORE_URL: &str = "http://127.0.0.1:54321";
/// Used when `store_key` is not configured.
pub const FALLBACK_STORE_KEY: &str = "vitrine-public-anon-key";

/// Which [`RemoteStore`] implementation backs the site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
  /// Hosted PostgREST-style row store at `store_url`.
  #[default]
  Rest,
  /// SQLite file at `sqlite_path`.
  Sqlite,
}

/// Runtime server configuration, deserialised from `config.toml` and
/// `VITRINE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  #[serde(default)]
  pub backend:             Backend,
  #[serde(default = "default_store_url")]
  pub store_url:           String,
  #[serde(default = "default_store_key")]
  pub store_key:           String,
  #[serde(default = "default_sqlite_path")]
  pub sqlite_path:         PathBuf,
  /// Directory for the file-backed local cache. In-memory when unset.
  #[serde(default)]
  pub cache_dir:           Option<PathBuf>,
  #[serde(default = "default_admin_username")]
  pub admin_username:      String,
  #[serde(default)]
  pub admin_password_hash: Option<String>,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_url() -> String { FALLBACK_STORE_URL.to_string() }

fn default_store_key() -> String { FALLBACK_STORE_KEY.to_string() }

fn default_sqlite_path() -> PathBuf { PathBuf::from("vitrine.db") }

fn default_admin_username() -> String { "admin".to_string() }

impl ServerConfig {
  pub fn rest(&self) -> RestConfig {
    RestConfig { url: self.store_url.clone(), api_key: self.store_key.clone() }
  }

  pub fn auth(&self) -> AuthConfig {
    AuthConfig {
      username:      self.admin_username.clone(),
      password_hash: self.admin_password_hash.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: `/api` is public, `/api/admin`
/// requires credentials matching `auth`.
pub fn router<R, C>(site: Arc<Site<R, C>>, auth: Arc<AuthConfig>) -> Router
where
  R: RemoteStore + 'static,
  C: LocalCache + 'static,
{
  let admin = vitrine_api::admin_router(site.clone())
    .layer(middleware::from_fn_with_state(auth, require_admin));

  Router::new()
    .nest("/api/admin", admin)
    .nest("/api", vitrine_api::public_router(site))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────
