//! [`SqliteStore`]: the SQLite implementation of [`RemoteStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::types::Value as SqlValue;
use tracing::debug;

use vitrine_core::{
  entity::{Identity, RecordId, Row, Table},
  store::{AuditEntry, NewAuditEntry, RemoteStore},
};

use crate::{
  Error, Result,
  encode::{RawAuditEntry, RawRow, checked, encode_dt, encode_id, order_clause, split_row},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Vitrine content store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn select_sql(table: Table) -> String {
  format!("SELECT {}, data, created_at FROM {}", table.id_field, table.name)
}

// ─── RemoteStore impl ────────────────────────────────────────────────────────

impl RemoteStore for SqliteStore {
  type Error = Error;

  async fn select(&self, table: Table) -> Result<Vec<Row>> {
    let table = checked(table)?;
    let sql = format!("{} ORDER BY {}", select_sql(table), order_clause(table));

    let raws: Vec<RawRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawRow::from_sql)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(|raw| raw.into_row(table)).collect()
  }

  async fn insert(&self, table: Table, row: Row) -> Result<Row> {
    let table = checked(table)?;
    let (id, data) = split_row(table, row)?;
    let id = match (table.identity, id) {
      // The store assigns serial ids; a NULL rowid alias picks the next one.
      (Identity::Serial, _) => SqlValue::Null,
      (Identity::Key, Some(key)) => encode_id(&key),
      (Identity::Key, None) => return Err(Error::MissingId(table.name)),
    };
    let created_at = encode_dt(Utc::now());
    // Inserting an existing key replaces its data.
    let insert_sql = format!(
      "INSERT INTO {name} ({id}, data, created_at) VALUES (?1, ?2, ?3)
       ON CONFLICT({id}) DO UPDATE SET data = excluded.data",
      name = table.name,
      id = table.id_field,
    );
    let read_sql = format!("{} WHERE {} = ?1", select_sql(table), table.id_field);

    let raw: RawRow = self
      .conn
      .call(move |conn| {
        conn.execute(&insert_sql, rusqlite::params![id, data, created_at])?;
        let id = match id {
          SqlValue::Null => SqlValue::Integer(conn.last_insert_rowid()),
          key => key,
        };
        let raw = conn.query_row(&read_sql, rusqlite::params![id], RawRow::from_sql)?;
        Ok(raw)
      })
      .await?;

    debug!(table = table.name, "inserted row");
    raw.into_row(table)
  }

  async fn update(&self, table: Table, id: RecordId, row: Row) -> Result<bool> {
    let table = checked(table)?;
    let (_, data) = split_row(table, row)?;
    let id = encode_id(&id);
    let sql = format!("UPDATE {} SET data = ?1 WHERE {} = ?2", table.name, table.id_field);

    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params![data, id])?))
      .await?;

    debug!(table = table.name, changed, "updated row");
    Ok(changed > 0)
  }

  async fn delete(&self, table: Table, id: RecordId) -> Result<bool> {
    let table = checked(table)?;
    let id = encode_id(&id);
    let sql = format!("DELETE FROM {} WHERE {} = ?1", table.name, table.id_field);

    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params![id])?))
      .await?;

    debug!(table = table.name, changed, "deleted row");
    Ok(changed > 0)
  }

  async fn upsert(&self, table: Table, rows: Vec<Row>) -> Result<()> {
    let table = checked(table)?;
    let params = rows
      .into_iter()
      .map(|row| match split_row(table, row)? {
        (Some(id), data) => Ok((encode_id(&id), data)),
        (None, _) => Err(Error::MissingId(table.name)),
      })
      .collect::<Result<Vec<_>>>()?;
    let count = params.len();
    let created_at = encode_dt(Utc::now());
    let sql = format!(
      "INSERT INTO {name} ({id}, data, created_at) VALUES (?1, ?2, ?3)
       ON CONFLICT({id}) DO UPDATE SET data = excluded.data",
      name = table.name,
      id = table.id_field,
    );

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(&sql)?;
          for (id, data) in params {
            stmt.execute(rusqlite::params![id, data, created_at])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    debug!(table = table.name, count, "upserted rows");
    Ok(())
  }

  async fn health_check(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.query_row("SELECT count(*) FROM settings", [], |r| r.get::<_, i64>(0))?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn append_audit(&self, entry: NewAuditEntry) -> Result<AuditEntry> {
    let created_at = Utc::now();
    let action = entry.action.to_string();
    let entity = entry.entity.to_string();
    let description = entry.description.clone();
    let created_at_str = encode_dt(created_at);

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO admin_logs (action, entity, description, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![action, entity, description, created_at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(AuditEntry {
      id,
      action: entry.action,
      entity: entry.entity,
      description: entry.description,
      created_at,
    })
  }

  async fn recent_audit(&self, limit: usize) -> Result<Vec<AuditEntry>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawAuditEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, action, entity, description, created_at
           FROM admin_logs ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit], RawAuditEntry::from_sql)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAuditEntry::into_entry).collect()
  }
}
