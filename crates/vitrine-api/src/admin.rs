//! Handlers for the admin endpoints. Authentication is the caller's concern.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/{kind}` | Full snapshot, unpublished records included |
//! | `POST`   | `/{kind}` | Body: one record; returns 201 + write outcome |
//! | `PUT`    | `/{kind}/{id}` | Body: the replacement record |
//! | `DELETE` | `/{kind}/{id}` | 404 only when local-backed and missing |
//! | `POST`   | `/{kind}/sync` | Body: `{"confirm":true}`; 428 without it |
//! | `GET`    | `/logs` | Optional `?limit=N` (default 50) |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use vitrine_core::{
  cache::LocalCache,
  entity::RecordId,
  reconcile::{Snapshot, SyncReport, WriteOutcome},
  site::{Section, Site},
  store::{AuditEntry, RemoteStore},
};

use crate::error::ApiError;

pub const DEFAULT_LOG_LIMIT: usize = 50;

fn parse_id<E: Section>(raw: &str) -> Result<RecordId, ApiError> {
  RecordId::parse(E::TABLE.identity, raw)
    .ok_or_else(|| ApiError::BadRequest(format!("invalid {} id: {raw:?}", E::TABLE.kind)))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /{kind}`
pub async fn list<E, R, C>(State(site): State<Arc<Site<R, C>>>) -> Json<Snapshot<E>>
where
  E: Section,
  R: RemoteStore,
  C: LocalCache,
{
  Json(site.section::<E>().fetch().await)
}

// ─── Create / update / delete ────────────────────────────────────────────────

/// `POST /{kind}`
pub async fn create<E, R, C>(
  State(site): State<Arc<Site<R, C>>>,
  Json(record): Json<E>,
) -> Result<impl IntoResponse, ApiError>
where
  E: Section,
  R: RemoteStore,
  C: LocalCache,
{
  let outcome = site.section::<E>().create(record).await?;
  Ok((StatusCode::CREATED, Json(outcome)))
}

/// `PUT /{kind}/{id}`
pub async fn update<E, R, C>(
  State(site): State<Arc<Site<R, C>>>,
  Path(id): Path<String>,
  Json(record): Json<E>,
) -> Result<Json<WriteOutcome<E>>, ApiError>
where
  E: Section,
  R: RemoteStore,
  C: LocalCache,
{
  let id = parse_id::<E>(&id)?;
  Ok(Json(site.section::<E>().update(id, record).await?))
}

/// `DELETE /{kind}/{id}`
pub async fn delete<E, R, C>(
  State(site): State<Arc<Site<R, C>>>,
  Path(id): Path<String>,
) -> Result<Json<WriteOutcome<E>>, ApiError>
where
  E: Section,
  R: RemoteStore,
  C: LocalCache,
{
  let id = parse_id::<E>(&id)?;
  Ok(Json(site.section::<E>().delete(id).await?))
}

// ─── Sync ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SyncBody {
  #[serde(default)]
  pub confirm: bool,
}

/// `POST /{kind}/sync` with body `{"confirm":true}`
pub async fn sync<E, R, C>(
  State(site): State<Arc<Site<R, C>>>,
  body: Option<Json<SyncBody>>,
) -> Result<Json<SyncReport<E>>, ApiError>
where
  E: Section,
  R: RemoteStore,
  C: LocalCache,
{
  let confirmed = body.is_some_and(|Json(body)| body.confirm);
  Ok(Json(site.section::<E>().sync(confirmed).await?))
}

// ─── Audit log ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LogParams {
  pub limit: Option<usize>,
}

/// `GET /logs[?limit=N]`
pub async fn logs<R, C>(
  State(site): State<Arc<Site<R, C>>>,
  Query(params): Query<LogParams>,
) -> Result<Json<Vec<AuditEntry>>, ApiError>
where
  R: RemoteStore,
  C: LocalCache,
{
  let limit = params.limit.unwrap_or(DEFAULT_LOG_LIMIT);
  Ok(Json(site.recent_audit(limit).await?))
}
