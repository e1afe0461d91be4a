//! Error type for `vitrine-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// The table is not part of the schema.
  #[error("unknown table: {0}")]
  UnknownTable(String),

  #[error("row for {0} has no identity value")]
  MissingId(&'static str),

  #[error("invalid identity for {table}: {value}")]
  InvalidId { table: &'static str, value: String },

  #[error("decode error: {0}")]
  Decode(String),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
