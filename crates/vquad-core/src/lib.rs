//! Core types and trait definitions for the vquad versioned quad store.
//!
//! Every stored quad carries a validity bit-vector with one bit per committed
//! version. This crate holds the data model, the [`store::VersionedStore`]
//! abstraction, an in-memory reference backend, and the import and query
//! layers built on top of the trait. It is deliberately free of HTTP and
//! database dependencies.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod commit;
pub mod error;
pub mod gateway;
pub mod import;
pub mod memory;
pub mod pattern;
pub mod quad;
pub mod store;
pub mod term;
pub mod validity;

pub use error::{Error, Result};
