//! PostgREST-style HTTP backend for the Vitrine remote store.
//!
//! Talks to a hosted row store exposing `/rest/v1/{table}` endpoints, with
//! an API key sent both as `apikey` and as a bearer token.

mod client;

pub mod error;

pub use client::{RestConfig, RestStore};
pub use error::{Error, Result};
