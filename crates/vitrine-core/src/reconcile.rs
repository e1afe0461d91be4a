//! [`Reconciler`]: the remote-first, local-fallback policy for one content
//! type.
//!
//! # Reads
//!
//! [`Reconciler::fetch`] asks the remote store first. A non-empty answer is
//! authoritative (merged with the defaults to fill blanks) and is remembered
//! as the remote view. An empty answer or an error puts the reconciler in
//! local-backed mode and serves the cached array, or the hardcoded defaults
//! when the cache is empty or corrupt.
//!
//! # Writes
//!
//! Mutations go to the remote store unless a remote failure has already
//! been observed. An empty remote table still accepts writes. A failed
//! remote mutation flips the mode and is replayed against the remote view,
//! so the local copy starts from the records the admin was looking at.
//! Once local, writes apply to the cached array and carry a warning.
//!
//! Successful remote mutations append an audit entry on a best-effort basis:
//! the audit write is not part of the mutation and its failure is reported,
//! not raised. Updating or deleting an id the remote store does not have is
//! [`Error::RecordNotFound`], as it is locally.
//!
//! # Sync
//!
//! [`Reconciler::sync`] pushes the cached array to the remote store after an
//! explicit confirmation and a health check. Records identical to a shipped
//! default are left out.
//!
//! Mode is plain shared state: concurrent operations resolve independently
//! and whichever finishes last decides the mode.

use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
  BoxError, Error, Result,
  cache::LocalCache,
  entity::{Entity, Identity, RecordId, from_row, strip_server_fields, to_row},
  merge::merge_with_defaults,
  store::{AuditAction, NewAuditEntry, RemoteStore},
};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Why a reconciler is serving local data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
  /// The remote table has no rows yet. Not an error.
  RemoteEmpty,
  /// The remote store failed a read or a write.
  RemoteUnreachable,
}

/// Where a reconciler currently reads from and writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Status {
  /// Nothing fetched yet; writes try the remote store first.
  Unknown,
  RemoteBacked,
  /// "Demo mode": reads and writes use the local cache.
  LocalBacked { reason: FallbackReason },
}

impl Status {
  pub fn is_local(&self) -> bool { matches!(self, Self::LocalBacked { .. }) }

  /// Whether writes skip the remote store. An empty table is no reason to.
  pub fn writes_locally(&self) -> bool {
    matches!(self, Self::LocalBacked { reason: FallbackReason::RemoteUnreachable })
  }
}

/// Which layer produced a snapshot's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
  Remote,
  Cache,
  Defaults,
}

// ─── Notices ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
  Warning,
  Error,
}

/// A user-facing inline banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
  pub level:   NoticeLevel,
  pub message: String,
}

impl Notice {
  pub fn warning(message: impl Into<String>) -> Self {
    Self { level: NoticeLevel::Warning, message: message.into() }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self { level: NoticeLevel::Error, message: message.into() }
  }

  fn local_only() -> Self {
    Self::warning(
      "The database is unavailable. Changes are saved on this device only until \
       you sync.",
    )
  }
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// A renderable list plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot<E> {
  pub records: Vec<E>,
  pub origin:  Origin,
  pub status:  Status,
  pub notice:  Option<Notice>,
}

/// What happened to the audit entry of a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
  Recorded,
  /// The mutation succeeded but the audit write did not.
  Failed,
  /// Local-only mutations are never audited.
  Skipped,
}

/// The result of a create, update or delete.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteOutcome<E> {
  /// The record as written; `None` for deletes.
  pub record:   Option<E>,
  /// The list re-derived after the write.
  pub snapshot: Snapshot<E>,
  /// Set when the write was saved locally only.
  pub notice:   Option<Notice>,
  pub audit:    AuditOutcome,
}

/// The result of a manual sync.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport<E> {
  /// Number of cached records upserted.
  pub pushed:   usize,
  pub snapshot: Snapshot<E>,
  pub audit:    AuditOutcome,
}

enum Mutation<E> {
  Create(E),
  Update(RecordId, E),
  Delete(RecordId),
}

impl<E: Entity> Mutation<E> {
  fn audit(&self, stored: Option<&E>) -> (AuditAction, String) {
    match self {
      Self::Create(r) => {
        let label = stored.unwrap_or(r).label();
        (AuditAction::Create, format!("created {label}"))
      }
      Self::Update(_, r) => (AuditAction::Update, format!("updated {}", r.label())),
      Self::Delete(id) => (AuditAction::Delete, format!("deleted #{id}")),
    }
  }
}

/// What the remote store made of a mutation.
enum Applied<E> {
  Done(Option<E>),
  /// No row has the targeted id.
  Missing(RecordId),
}

// ─── Reconciler ──────────────────────────────────────────────────────────────

/// The reconciliation service for content type `E`.
///
/// One instance per content type, shared by every consumer.
pub struct Reconciler<E, R, C> {
  remote:      Arc<R>,
  cache:       Arc<C>,
  defaults:    Vec<E>,
  status:      RwLock<Status>,
  /// Records of the last non-empty remote read, before merging.
  remote_view: RwLock<Option<Vec<E>>>,
}

impl<E, R, C> Reconciler<E, R, C>
where
  E: Entity,
  R: RemoteStore,
  C: LocalCache,
{
  /// A reconciler using `E`'s shipped defaults.
  pub fn new(remote: Arc<R>, cache: Arc<C>) -> Self {
    Self {
      remote,
      cache,
      defaults: E::defaults(),
      status: RwLock::new(Status::Unknown),
      remote_view: RwLock::new(None),
    }
  }

  /// Replace the fallback dataset.
  pub fn with_defaults(mut self, defaults: Vec<E>) -> Self {
    self.defaults = defaults;
    self
  }

  pub fn status(&self) -> Status {
    *self.status.read().unwrap_or_else(PoisonError::into_inner)
  }

  fn set_status(&self, status: Status) {
    *self.status.write().unwrap_or_else(PoisonError::into_inner) = status;
  }

  fn remote_view(&self) -> Option<Vec<E>> {
    self.remote_view.read().unwrap_or_else(PoisonError::into_inner).clone()
  }

  fn set_remote_view(&self, view: Option<Vec<E>>) {
    *self.remote_view.write().unwrap_or_else(PoisonError::into_inner) = view;
  }

  // ── Read path ─────────────────────────────────────────────────────────────

  /// Produce the list to display. Never fails; see the module docs.
  pub async fn fetch(&self) -> Snapshot<E> {
    let kind = E::TABLE.kind;

    match self.fetch_remote().await {
      Ok(records) if !records.is_empty() => {
        self.set_status(Status::RemoteBacked);
        self.set_remote_view(Some(records.clone()));
        debug!(entity = %kind, count = records.len(), "serving remote records");
        Snapshot {
          records: merge_with_defaults(records, &self.defaults),
          origin:  Origin::Remote,
          status:  Status::RemoteBacked,
          notice:  None,
        }
      }
      Ok(_) => {
        debug!(entity = %kind, "remote table is empty, serving local data");
        self.set_remote_view(None);
        self.fall_back(FallbackReason::RemoteEmpty, None)
      }
      Err(e) => {
        warn!(entity = %kind, error = %e, "remote fetch failed, serving local data");
        let notice = Notice::error(format!(
          "Could not load {kind} from the database; showing locally saved content."
        ));
        self.fall_back(FallbackReason::RemoteUnreachable, Some(notice))
      }
    }
  }

  async fn fetch_remote(&self) -> std::result::Result<Vec<E>, BoxError> {
    let rows = self.remote.select(E::TABLE).await?;
    let records = rows
      .into_iter()
      .map(from_row::<E>)
      .collect::<Result<Vec<_>>>()?;
    Ok(records)
  }

  fn fall_back(&self, reason: FallbackReason, notice: Option<Notice>) -> Snapshot<E> {
    let status = Status::LocalBacked { reason };
    self.set_status(status);
    let (records, origin) = self.local_records();
    Snapshot { records, origin, status, notice }
  }

  /// The cached array, if present, decodable and non-empty.
  fn read_cache(&self) -> Option<Vec<E>> {
    let table = E::TABLE;
    let raw = self.cache.get(table.cache_key)?;
    match serde_json::from_str::<Vec<E>>(&raw) {
      Ok(records) if !records.is_empty() => Some(records),
      Ok(_) => None,
      Err(e) => {
        warn!(entity = %table.kind, error = %e, "discarding corrupt cache slot");
        None
      }
    }
  }

  fn local_records(&self) -> (Vec<E>, Origin) {
    let (mut records, origin) = match self.read_cache() {
      Some(records) => (merge_with_defaults(records, &self.defaults), Origin::Cache),
      None => (self.defaults.clone(), Origin::Defaults),
    };
    E::TABLE.order.sort(&mut records);
    (records, origin)
  }

  fn local_snapshot(&self) -> Snapshot<E> {
    let (records, origin) = self.local_records();
    Snapshot { records, origin, status: self.status(), notice: None }
  }

  // ── Write path ────────────────────────────────────────────────────────────

  /// Create a record. Serial ids on the input are ignored.
  pub async fn create(&self, record: E) -> Result<WriteOutcome<E>> {
    self.apply(Mutation::Create(record)).await
  }

  /// Replace the record with the given id. The id in `record` is ignored.
  pub async fn update(&self, id: RecordId, mut record: E) -> Result<WriteOutcome<E>> {
    record.set_id(&id);
    self.apply(Mutation::Update(id, record)).await
  }

  pub async fn delete(&self, id: RecordId) -> Result<WriteOutcome<E>> {
    self.apply(Mutation::Delete(id)).await
  }

  async fn apply(&self, mutation: Mutation<E>) -> Result<WriteOutcome<E>> {
    let kind = E::TABLE.kind;

    if self.status().writes_locally() {
      let record = self.apply_local(&mutation, self.working_set(false))?;
      return Ok(WriteOutcome {
        record,
        snapshot: self.local_snapshot(),
        notice: Some(Notice::local_only()),
        audit: AuditOutcome::Skipped,
      });
    }

    match self.apply_remote(&mutation).await {
      Ok(Applied::Done(record)) => {
        let (action, description) = mutation.audit(record.as_ref());
        info!(entity = %kind, %action, "{description}");
        let audit = self.audit(action, description).await;
        let snapshot = self.fetch().await;
        Ok(WriteOutcome { record, snapshot, notice: None, audit })
      }
      Ok(Applied::Missing(id)) => Err(Error::RecordNotFound { entity: kind, id }),
      Err(e) => {
        warn!(entity = %kind, error = %e, "remote write failed, saving locally");
        self.set_status(Status::LocalBacked {
          reason: FallbackReason::RemoteUnreachable,
        });
        let record = self.apply_local(&mutation, self.working_set(true))?;
        Ok(WriteOutcome {
          record,
          snapshot: self.local_snapshot(),
          notice: Some(Notice::local_only()),
          audit: AuditOutcome::Skipped,
        })
      }
    }
  }

  async fn apply_remote(
    &self,
    mutation: &Mutation<E>,
  ) -> std::result::Result<Applied<E>, BoxError> {
    let table = E::TABLE;

    match mutation {
      Mutation::Create(record) => {
        let mut row = to_row(record)?;
        strip_server_fields(&mut row);
        if table.identity == Identity::Serial {
          row.remove(table.id_field);
        }
        let stored = self.remote.insert(table, row).await?;
        Ok(Applied::Done(Some(from_row(stored)?)))
      }
      Mutation::Update(id, record) => {
        let mut row = to_row(record)?;
        strip_server_fields(&mut row);
        row.remove(table.id_field);
        if !self.remote.update(table, id.clone(), row).await? {
          return Ok(Applied::Missing(id.clone()));
        }
        Ok(Applied::Done(Some(record.clone())))
      }
      Mutation::Delete(id) => {
        if !self.remote.delete(table, id.clone()).await? {
          return Ok(Applied::Missing(id.clone()));
        }
        Ok(Applied::Done(None))
      }
    }
  }

  /// The list a local write starts from.
  ///
  /// A write that has just lost the remote store starts from the remote
  /// view; later local writes start from the cache. Either falls back to the
  /// other, then to the defaults.
  fn working_set(&self, degraded: bool) -> Vec<E> {
    let found = if degraded {
      self.remote_view().or_else(|| self.read_cache())
    } else {
      self.read_cache().or_else(|| self.remote_view())
    };
    found.unwrap_or_else(|| self.defaults.clone())
  }

  /// Apply the mutation to `records` and persist the result to the cache.
  fn apply_local(&self, mutation: &Mutation<E>, mut records: Vec<E>) -> Result<Option<E>> {
    let table = E::TABLE;
    let not_found = |id: &RecordId| Error::RecordNotFound { entity: table.kind, id: id.clone() };

    let touched = match mutation {
      Mutation::Create(record) => {
        let mut record = record.clone();
        if table.identity == Identity::Serial {
          let next = records
            .iter()
            .filter_map(|r| r.id().as_serial())
            .max()
            .unwrap_or(0)
            + 1;
          record.set_id(&RecordId::Serial(next));
        }
        match records.iter_mut().find(|r| r.id() == record.id()) {
          Some(slot) => *slot = record.clone(),
          None => records.push(record.clone()),
        }
        Some(record)
      }
      Mutation::Update(id, record) => {
        let slot = records
          .iter_mut()
          .find(|r| &r.id() == id)
          .ok_or_else(|| not_found(id))?;
        *slot = record.clone();
        Some(record.clone())
      }
      Mutation::Delete(id) => {
        let before = records.len();
        records.retain(|r| &r.id() != id);
        if records.len() == before {
          return Err(not_found(id));
        }
        None
      }
    };

    self.write_cache(&records)?;
    debug!(entity = %table.kind, count = records.len(), "saved local copy");
    Ok(touched)
  }

  fn write_cache(&self, records: &[E]) -> Result<()> {
    let raw = serde_json::to_string(records)?;
    self.cache.set(E::TABLE.cache_key, &raw)?;
    Ok(())
  }

  async fn audit(&self, action: AuditAction, description: String) -> AuditOutcome {
    let entry = NewAuditEntry { action, entity: E::TABLE.kind, description };
    match self.remote.append_audit(entry).await {
      Ok(_) => AuditOutcome::Recorded,
      Err(e) => {
        warn!(entity = %E::TABLE.kind, error = %e, "audit log write failed");
        AuditOutcome::Failed
      }
    }
  }

  // ── Sync ──────────────────────────────────────────────────────────────────

  /// Push the cached array to the remote store, overwriting rows with the
  /// same ids, then re-fetch. Cached records equal to a shipped default were
  /// never edited and are not pushed.
  ///
  /// `confirmed` must be `true`: the push overwrites remote content. The
  /// cache is never modified, whatever the outcome.
  pub async fn sync(&self, confirmed: bool) -> Result<SyncReport<E>> {
    let table = E::TABLE;
    if !confirmed {
      return Err(Error::ConfirmationRequired(table.kind));
    }

    if let Err(e) = self.remote.health_check().await {
      warn!(entity = %table.kind, error = %e, "sync aborted, remote store unreachable");
      return Err(Error::SyncPrecondition { entity: table.kind, source: Box::new(e) });
    }

    let rows = self
      .read_cache()
      .unwrap_or_default()
      .iter()
      .filter(|record| !self.defaults.contains(*record))
      .map(|record| -> Result<_> {
        let mut row = to_row(record)?;
        strip_server_fields(&mut row);
        Ok(row)
      })
      .collect::<Result<Vec<_>>>()?;
    let pushed = rows.len();

    let audit = if pushed > 0 {
      self
        .remote
        .upsert(table, rows)
        .await
        .map_err(|e| Error::Sync { entity: table.kind, source: Box::new(e) })?;
      info!(entity = %table.kind, pushed, "pushed local records to remote store");
      self
        .audit(AuditAction::Sync, format!("pushed {pushed} local records"))
        .await
    } else {
      AuditOutcome::Skipped
    };

    let snapshot = self.fetch().await;
    Ok(SyncReport { pushed, snapshot, audit })
  }
}
