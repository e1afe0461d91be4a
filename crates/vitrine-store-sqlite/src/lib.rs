//! SQLite backend for the Vitrine remote store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Suitable for self-hosting a site
//! without an external database, and as the store behind the HTTP tests.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
