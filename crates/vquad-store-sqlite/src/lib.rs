//! SQLite backend for the vquad versioned quad store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. That thread owns the only connection,
//! which serialises commits; each commit runs inside one transaction.

mod commit_log;
mod dictionary;
mod encode;
mod graphs;
mod quads;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
