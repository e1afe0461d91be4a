//! Error types for `vitrine-core`.

use thiserror::Error;

use crate::{
  cache::CacheError,
  entity::{EntityKind, RecordId},
};

/// A type-erased error coming out of a [`RemoteStore`](crate::store::RemoteStore)
/// backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{entity} record not found: {id}")]
  RecordNotFound { entity: EntityKind, id: RecordId },

  #[error("syncing {0} to the remote store requires explicit confirmation")]
  ConfirmationRequired(EntityKind),

  /// The health check before a manual sync failed; nothing was written.
  #[error("remote store unreachable, {entity} sync aborted: {source}")]
  SyncPrecondition {
    entity: EntityKind,
    #[source]
    source: BoxError,
  },

  /// The upsert of local records failed; the local cache is untouched.
  #[error("pushing local {entity} to the remote store failed: {source}")]
  Sync {
    entity: EntityKind,
    #[source]
    source: BoxError,
  },

  #[error("remote store error: {0}")]
  Remote(#[source] BoxError),

  #[error("local cache error: {0}")]
  Cache(#[from] CacheError),

  #[error("{0} record did not serialise to a JSON object")]
  NotARow(EntityKind),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
