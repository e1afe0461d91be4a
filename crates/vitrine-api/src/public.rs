//! Handlers for the public read endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/{kind}` | Published records of one section |
//! | `GET`  | `/theme` | The current theme record |
//! | `GET`  | `/health` | Remote reachability and per-section mode |

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;
use vitrine_core::{
  cache::LocalCache,
  content::Theme,
  reconcile::Snapshot,
  site::{Section, SectionStatus, Site},
  store::RemoteStore,
};

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /{kind}`. Never fails; a degraded read carries a notice instead.
pub async fn list<E, R, C>(State(site): State<Arc<Site<R, C>>>) -> Json<Snapshot<E>>
where
  E: Section,
  R: RemoteStore,
  C: LocalCache,
{
  let mut snapshot = site.section::<E>().fetch().await;
  snapshot.records.retain(|r| r.is_published());
  Json(snapshot)
}

// ─── Theme ────────────────────────────────────────────────────────────────────

/// `GET /theme`
pub async fn theme<R, C>(State(site): State<Arc<Site<R, C>>>) -> Result<Json<Theme>, ApiError>
where
  R: RemoteStore,
  C: LocalCache,
{
  site
    .theme
    .fetch()
    .await
    .records
    .into_iter()
    .next()
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("no theme configured".into()))
}

// ─── Health ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Health {
  /// Whether a trivial read against the remote store succeeded just now.
  pub remote:   bool,
  /// Each section's mode as of its last read or write.
  pub sections: Vec<SectionStatus>,
}

/// `GET /health`
pub async fn health<R, C>(State(site): State<Arc<Site<R, C>>>) -> Json<Health>
where
  R: RemoteStore,
  C: LocalCache,
{
  let remote = site.check_remote().await.is_ok();
  Json(Health { remote, sections: site.statuses() })
}
