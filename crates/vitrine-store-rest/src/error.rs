//! Error type for `vitrine-store-rest`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{method} {table} → {status}: {body}")]
  Status {
    method: &'static str,
    table:  &'static str,
    status: reqwest::StatusCode,
    body:   String,
  },

  #[error("row for {0} has no identity value")]
  MissingId(&'static str),

  #[error("unexpected response from {0}: no row returned")]
  EmptyResponse(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
