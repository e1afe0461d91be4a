//! The generic entity contract every content type implements.
//!
//! A content type is described by a static [`Table`]: where it lives in the
//! remote store, how it is identified, how it is ordered and which local
//! cache slot holds its offline copy. The [`Entity`] trait ties a concrete
//! record type to its table and to its hardcoded fallback dataset.

use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{Error, Result};

/// A row as exchanged with the remote store: column name → JSON value.
pub type Row = serde_json::Map<String, Value>;

/// Columns assigned by the remote store that must never be pushed back.
pub const SERVER_FIELDS: &[&str] = &["created_at"];

// ─── Kinds ───────────────────────────────────────────────────────────────────

/// Every content type served by the site. The snake_case form doubles as the
/// URL segment and the audit-log `entity` column.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
  Announcements,
  Services,
  Cases,
  Links,
  HomeProjects,
  Settings,
  Theme,
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// How records of a table are identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
  /// Numeric id assigned by the store (or synthesised as `max + 1` locally).
  Serial,
  /// Caller-chosen string key (settings).
  Key,
}

/// The identity value of a single record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
  Serial(i64),
  Key(String),
}

impl RecordId {
  /// Parse a path segment according to the table's identity scheme.
  pub fn parse(identity: Identity, raw: &str) -> Option<Self> {
    match identity {
      Identity::Serial => raw.parse().ok().map(Self::Serial),
      Identity::Key if !raw.is_empty() => Some(Self::Key(raw.to_owned())),
      Identity::Key => None,
    }
  }

  pub fn as_serial(&self) -> Option<i64> {
    match self {
      Self::Serial(n) => Some(*n),
      Self::Key(_) => None,
    }
  }

  pub fn to_json(&self) -> Value {
    match self {
      Self::Serial(n) => Value::from(*n),
      Self::Key(k) => Value::from(k.as_str()),
    }
  }

  /// Read the identity column out of a row, if present and well-typed.
  pub fn from_json(value: &Value) -> Option<Self> {
    match value {
      Value::Number(n) => n.as_i64().map(Self::Serial),
      Value::String(s) => Some(Self::Key(s.clone())),
      _ => None,
    }
  }
}

impl fmt::Display for RecordId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Serial(n) => write!(f, "{n}"),
      Self::Key(k) => f.write_str(k),
    }
  }
}

// ─── Ordering ────────────────────────────────────────────────────────────────

/// Display order requested from the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
  Ascending(&'static str),
  Descending(&'static str),
}

impl Order {
  pub fn field(self) -> &'static str {
    match self {
      Self::Ascending(f) | Self::Descending(f) => f,
    }
  }

  pub fn is_descending(self) -> bool { matches!(self, Self::Descending(_)) }

  /// Stable in-memory sort used for local-backed snapshots, so offline lists
  /// come out in the same order the remote store would return them.
  pub fn sort<E: Entity>(self, records: &mut [E]) {
    let field = self.field();
    let mut keyed: Vec<(Value, E)> = records
      .iter()
      .map(|r| {
        let key = to_row(r)
          .ok()
          .and_then(|mut row| row.remove(field))
          .unwrap_or(Value::Null);
        (key, r.clone())
      })
      .collect();

    keyed.sort_by(|(a, _), (b, _)| {
      let ord = compare_json(a, b);
      if self.is_descending() { ord.reverse() } else { ord }
    });

    for (slot, (_, record)) in records.iter_mut().zip(keyed) {
      *slot = record;
    }
  }
}

/// Nulls first, then numbers, then strings; anything else compares equal.
pub(crate) fn compare_json(a: &Value, b: &Value) -> Ordering {
  match (a, b) {
    (Value::Null, Value::Null) => Ordering::Equal,
    (Value::Null, _) => Ordering::Less,
    (_, Value::Null) => Ordering::Greater,
    (Value::Number(x), Value::Number(y)) => {
      let x = x.as_f64().unwrap_or_default();
      let y = y.as_f64().unwrap_or_default();
      x.partial_cmp(&y).unwrap_or(Ordering::Equal)
    }
    (Value::Number(_), _) => Ordering::Less,
    (_, Value::Number(_)) => Ordering::Greater,
    (Value::String(x), Value::String(y)) => x.cmp(y),
    _ => Ordering::Equal,
  }
}

// ─── Table ───────────────────────────────────────────────────────────────────

/// Static description of where and how a content type is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table {
  pub kind:      EntityKind,
  /// Remote table name.
  pub name:      &'static str,
  /// Identity column name (`id` or `key`).
  pub id_field:  &'static str,
  pub identity:  Identity,
  pub order:     Order,
  /// Slot in the local cache holding the serialized offline array.
  pub cache_key: &'static str,
}

// ─── Entity ──────────────────────────────────────────────────────────────────

/// A record type managed by the reconciliation policy.
pub trait Entity:
  Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
  const TABLE: Table;

  fn id(&self) -> RecordId;

  /// Overwrite the identity field. Ids of the wrong shape for the table are
  /// ignored.
  fn set_id(&mut self, id: &RecordId);

  /// Display title; also the legacy secondary key when merging with defaults.
  fn title(&self) -> Option<&str> { None }

  /// Stable join key against the fallback defaults, preferred over the title.
  fn slug(&self) -> Option<&str> { None }

  /// Whether the public site shows this record. The admin view shows all.
  fn is_published(&self) -> bool { true }

  /// Fill fields that are missing or blank on `self` from a default record.
  fn fill_from(&mut self, _template: &Self) {}

  /// The hardcoded dataset shown when neither the remote store nor the cache
  /// has anything.
  fn defaults() -> Vec<Self>;

  /// Short human label used in audit descriptions.
  fn label(&self) -> String {
    match self.title() {
      Some(t) if !t.trim().is_empty() => format!("\"{t}\" ({})", self.id()),
      _ => format!("#{}", self.id()),
    }
  }
}

/// Serialise a record into a store row.
pub fn to_row<E: Entity>(record: &E) -> Result<Row> {
  match serde_json::to_value(record)? {
    Value::Object(row) => Ok(row),
    _ => Err(Error::NotARow(E::TABLE.kind)),
  }
}

pub fn from_row<E: Entity>(row: Row) -> Result<E> {
  Ok(serde_json::from_value(Value::Object(row))?)
}

/// Remove columns the remote store owns.
pub fn strip_server_fields(row: &mut Row) {
  for field in SERVER_FIELDS {
    row.remove(*field);
  }
}

// ─── Serde helpers ───────────────────────────────────────────────────────────

/// Treat an explicit `null` the same as a missing field. Remote rows are
/// allowed to be partially populated.
pub(crate) fn null_as_default<'de, D, T>(
  deserializer: D,
) -> std::result::Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn null_as_true<'de, D>(
  deserializer: D,
) -> std::result::Result<bool, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

pub(crate) fn yes() -> bool { true }
