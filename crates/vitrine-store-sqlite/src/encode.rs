//! Encoding and decoding helpers between store rows and SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. The identity column is a real
//! column (`id` or `key`); every other column of a row is stored as one
//! compact JSON object in `data`.

use chrono::{DateTime, Utc};
use rusqlite::types::Value as SqlValue;
use serde_json::Value;
use vitrine_core::{
  entity::{Identity, RecordId, Row, SERVER_FIELDS, Table},
  store::{AuditAction, AuditEntry},
};

use crate::{Error, Result, schema::CONTENT_TABLES};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Tables ──────────────────────────────────────────────────────────────────

/// Table and column names are interpolated into SQL, so only the names the
/// schema defines are accepted.
pub fn checked(table: Table) -> Result<Table> {
  let known = CONTENT_TABLES.contains(&table.name);
  let id_ok = matches!(
    (table.identity, table.id_field),
    (Identity::Serial, "id") | (Identity::Key, "key")
  );
  if known && id_ok {
    Ok(table)
  } else {
    Err(Error::UnknownTable(table.name.to_owned()))
  }
}

/// `ORDER BY` clause for a table. Ties keep insertion order.
pub fn order_clause(table: Table) -> String {
  let dir = if table.order.is_descending() { "DESC" } else { "ASC" };
  let field = table.order.field();
  if field == table.id_field {
    format!("{field} {dir}")
  } else if field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
    format!("json_extract(data, '$.{field}') {dir}, rowid ASC")
  } else {
    "rowid ASC".to_owned()
  }
}

// ─── Identity ────────────────────────────────────────────────────────────────

pub fn encode_id(id: &RecordId) -> SqlValue {
  match id {
    RecordId::Serial(n) => SqlValue::Integer(*n),
    RecordId::Key(k) => SqlValue::Text(k.clone()),
  }
}

fn decode_id(table: Table, value: SqlValue) -> Result<Value> {
  match value {
    SqlValue::Integer(n) => Ok(Value::from(n)),
    SqlValue::Text(s) => Ok(Value::from(s)),
    other => Err(Error::Decode(format!(
      "unexpected {} identity value {other:?}",
      table.name
    ))),
  }
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// A row split into its identity (if present) and its JSON `data` column.
/// Server-owned columns are dropped.
pub fn split_row(table: Table, mut row: Row) -> Result<(Option<RecordId>, String)> {
  let id = match row.remove(table.id_field) {
    None | Some(Value::Null) => None,
    Some(value) => {
      let id = RecordId::from_json(&value).ok_or_else(|| invalid_id(table, &value))?;
      let shape_ok = match table.identity {
        Identity::Serial => id.as_serial().is_some(),
        Identity::Key => id.as_serial().is_none(),
      };
      if !shape_ok {
        return Err(invalid_id(table, &value));
      }
      Some(id)
    }
  };
  for field in SERVER_FIELDS {
    row.remove(*field);
  }
  Ok((id, Value::Object(row).to_string()))
}

fn invalid_id(table: Table, value: &Value) -> Error {
  Error::InvalidId { table: table.name, value: value.to_string() }
}

/// Raw columns read directly from a content table.
pub struct RawRow {
  pub id:         SqlValue,
  pub data:       String,
  pub created_at: String,
}

impl RawRow {
  pub fn from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      data:       row.get(1)?,
      created_at: row.get(2)?,
    })
  }

  pub fn into_row(self, table: Table) -> Result<Row> {
    let mut row = match serde_json::from_str::<Value>(&self.data)? {
      Value::Object(row) => row,
      other => {
        return Err(Error::Decode(format!(
          "{} data column is not an object: {other}",
          table.name
        )));
      }
    };
    let created_at = decode_dt(&self.created_at)?;
    row.insert(table.id_field.to_owned(), decode_id(table, self.id)?);
    row.insert("created_at".to_owned(), Value::from(encode_dt(created_at)));
    Ok(row)
  }
}

// ─── Audit ───────────────────────────────────────────────────────────────────

/// Raw strings read directly from an `admin_logs` row.
pub struct RawAuditEntry {
  pub id:          i64,
  pub action:      String,
  pub entity:      String,
  pub description: String,
  pub created_at:  String,
}

impl RawAuditEntry {
  pub fn from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      action:      row.get(1)?,
      entity:      row.get(2)?,
      description: row.get(3)?,
      created_at:  row.get(4)?,
    })
  }

  pub fn into_entry(self) -> Result<AuditEntry> {
    let action = self
      .action
      .parse::<AuditAction>()
      .map_err(|_| Error::Decode(format!("unknown audit action: {}", self.action)))?;
    let entity = self
      .entity
      .parse()
      .map_err(|_| Error::Decode(format!("unknown audit entity: {}", self.entity)))?;
    Ok(AuditEntry {
      id: self.id,
      action,
      entity,
      description: self.description,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use vitrine_core::{
    content::{Service, Setting},
    entity::Entity as _,
  };

  use super::*;

  fn row(value: Value) -> Row {
    match value {
      Value::Object(row) => row,
      _ => unreachable!(),
    }
  }

  #[test]
  fn split_row_drops_identity_and_server_fields() {
    let (id, data) = split_row(
      Service::TABLE,
      row(json!({ "id": 3, "title": "Audit", "created_at": "2024-01-01T00:00:00Z" })),
    )
    .unwrap();
    assert_eq!(id, Some(RecordId::Serial(3)));
    assert_eq!(data, r#"{"title":"Audit"}"#);
  }

  #[test]
  fn split_row_rejects_ids_of_the_wrong_shape() {
    let err = split_row(Service::TABLE, row(json!({ "id": "three" }))).unwrap_err();
    assert!(matches!(err, Error::InvalidId { .. }));

    let err = split_row(Setting::TABLE, row(json!({ "key": 4 }))).unwrap_err();
    assert!(matches!(err, Error::InvalidId { .. }));
  }

  #[test]
  fn order_clause_uses_the_id_column_or_json_data() {
    assert_eq!(
      order_clause(Service::TABLE),
      "json_extract(data, '$.sort_order') ASC, rowid ASC"
    );
    assert_eq!(
      order_clause(vitrine_core::content::Announcement::TABLE),
      "id DESC"
    );
    assert_eq!(order_clause(Setting::TABLE), "key ASC");
  }
}
