//! The `RemoteStore` trait and the audit-log types.
//!
//! The trait is implemented by storage backends (`vitrine-store-sqlite`,
//! `vitrine-store-rest`). The reconciliation layer depends on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::entity::{EntityKind, RecordId, Row, Table};

// ─── Audit log ───────────────────────────────────────────────────────────────

/// What an audit entry records.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditAction {
  Create,
  Update,
  Delete,
  Sync,
}

/// A stored row of the append-only `admin_logs` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
  pub id:          i64,
  pub action:      AuditAction,
  pub entity:      EntityKind,
  pub description: String,
  /// Server-assigned.
  pub created_at:  DateTime<Utc>,
}

/// Input to [`RemoteStore::append_audit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditEntry {
  pub action:      AuditAction,
  pub entity:      EntityKind,
  pub description: String,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A row-oriented remote system of record.
///
/// Rows are exchanged as JSON objects keyed by column name. The table's
/// identity column is `table.id_field`; `created_at` is owned by the store.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RemoteStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All rows of `table`, in `table.order`. Ties keep insertion order.
  fn select(
    &self,
    table: Table,
  ) -> impl Future<Output = Result<Vec<Row>, Self::Error>> + Send + '_;

  /// Insert a row and return it as stored, including any server-assigned
  /// identity and timestamp. For serial tables the row carries no id.
  fn insert(
    &self,
    table: Table,
    row: Row,
  ) -> impl Future<Output = Result<Row, Self::Error>> + Send + '_;

  /// Replace the non-identity columns of the row with the given id.
  /// Resolves to `false` when no row has that id.
  fn update(
    &self,
    table: Table,
    id: RecordId,
    row: Row,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete the row with the given id. Resolves to `false` when no row has
  /// that id.
  fn delete(
    &self,
    table: Table,
    id: RecordId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Insert-or-overwrite every row, keyed by identity. Each row must carry
  /// its id.
  fn upsert(
    &self,
    table: Table,
    rows: Vec<Row>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// A trivial read proving the store is reachable.
  fn health_check(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Append one entry to the audit log.
  fn append_audit(
    &self,
    entry: NewAuditEntry,
  ) -> impl Future<Output = Result<AuditEntry, Self::Error>> + Send + '_;

  /// The most recent audit entries, newest first.
  fn recent_audit(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<AuditEntry>, Self::Error>> + Send + '_;
}
