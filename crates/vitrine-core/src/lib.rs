//! Core types and the reconciliation policy for the Vitrine content backend.
//!
//! This crate has no HTTP or database dependencies. Storage
//! backends implement [`store::RemoteStore`]; the local fallback implements
//! [`cache::LocalCache`]. Everything that decides *which* of the two a reader
//! sees lives in [`reconcile`].

pub mod cache;
pub mod content;
pub mod defaults;
pub mod entity;
pub mod error;
pub mod merge;
pub mod reconcile;
pub mod site;
pub mod store;

pub use error::{BoxError, Error, Result};

#[cfg(test)]
mod tests;
