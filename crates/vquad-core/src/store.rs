//! The `VersionedStore` trait.
//!
//! The trait is implemented by storage backends (the in-memory
//! [`crate::memory::MemoryStore`] and `vquad-store-sqlite`). The import
//! pipeline, the query gateway and the HTTP layer depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use crate::{
  commit::{Commit, CommitBatch},
  quad::View,
  term::{GraphId, GraphName, Term, TermId},
  validity::Validity,
};

/// Abstraction over a versioned quad store backend.
///
/// Implementations must uphold:
///
/// - every row's validity length equals [`VersionedStore::width`] whenever no
///   commit is in flight;
/// - commits are serialised and atomic; a failed commit leaves every row and
///   the width untouched;
/// - reads observe either the pre-commit or the post-commit state.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait VersionedStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Dictionary ────────────────────────────────────────────────────────

  /// Get-or-create the id of `term`. Concurrent calls for the same term
  /// return the same id.
  fn intern_term(
    &self,
    term: Term,
  ) -> impl Future<Output = Result<TermId, Self::Error>> + Send + '_;

  /// Get-or-create the id of `graph`. The default graph is always present.
  fn intern_graph(
    &self,
    graph: GraphName,
  ) -> impl Future<Output = Result<GraphId, Self::Error>> + Send + '_;

  /// Reverse lookup of a term id. Returns `None` if unknown.
  fn resolve_term(
    &self,
    id: TermId,
  ) -> impl Future<Output = Result<Option<Term>, Self::Error>> + Send + '_;

  /// Reverse lookup of a graph id. Returns `None` if unknown.
  fn resolve_graph(
    &self,
    id: GraphId,
  ) -> impl Future<Output = Result<Option<GraphName>, Self::Error>> + Send + '_;

  // ── Commit log ────────────────────────────────────────────────────────

  /// Number of committed versions, i.e. the required validity length.
  fn width(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// All commits in version order.
  fn commits(
    &self,
  ) -> impl Future<Output = Result<Vec<Commit>, Self::Error>> + Send + '_;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Apply `batch` as one new version and return its commit record.
  ///
  /// Removes are applied before adds. A remove of a quad never seen before
  /// is a no-op. Every row not touched by the batch carries its newest bit
  /// forward. An empty batch still allocates a version.
  fn commit(
    &self,
    batch: CommitBatch,
  ) -> impl Future<Output = Result<Commit, Self::Error>> + Send + '_;

  /// Delete every quad, term, graph and commit. The width returns to 0 and
  /// the default graph is re-registered.
  fn reset(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Rows whose validity equals `pattern` bit-for-bit.
  fn quads_with_validity(
    &self,
    pattern: Validity,
  ) -> impl Future<Output = Result<View, Self::Error>> + Send + '_;

  /// Rows valid at `version`. Empty when `version` is beyond the width.
  fn quads_valid_at(
    &self,
    version: u64,
  ) -> impl Future<Output = Result<View, Self::Error>> + Send + '_;

  /// Rows valid at the newest version; empty when nothing is committed.
  fn current_view(
    &self,
  ) -> impl Future<Output = Result<View, Self::Error>> + Send + '_;
}
