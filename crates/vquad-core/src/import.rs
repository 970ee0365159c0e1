//! The import pipeline: parsed uploads in, one commit out.
//!
//! Parsing happens upstream (see `vquad-rdf`); by the time sources reach the
//! pipeline every one of them carries an explicit [`Operation`]. The pipeline
//! never infers intent from file names.

use std::{collections::BTreeMap, sync::Arc};

use tracing::{debug, info};

use crate::{
  Error, Result,
  commit::{Commit, CommitBatch, CommitKind},
  quad::{Operation, QuadOp, Triple},
  store::VersionedStore,
  term::GraphName,
};

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// The output of the upstream parser for one upload.
#[derive(Debug, Clone, Default)]
pub struct ParsedDataset {
  /// Statements of the unnamed graph.
  pub default_graph: Vec<Triple>,
  /// Statements per named graph URI.
  pub named_graphs:  BTreeMap<String, Vec<Triple>>,
}

impl ParsedDataset {
  pub fn len(&self) -> usize {
    self.default_graph.len()
      + self.named_graphs.values().map(Vec::len).sum::<usize>()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  /// Flatten into (s, p, o, g) quads, default graph first.
  pub fn into_quads(self) -> impl Iterator<Item = crate::quad::Quad> {
    let default = self
      .default_graph
      .into_iter()
      .map(|t| t.in_graph(GraphName::Default));
    let named = self.named_graphs.into_iter().flat_map(|(uri, triples)| {
      debug!(graph = %uri, statements = triples.len(), "named graph");
      let graph = GraphName::Named(uri);
      triples.into_iter().map(move |t| t.in_graph(graph.clone()))
    });
    default.chain(named)
  }
}

/// One parsed upload tagged with what to do with its statements.
#[derive(Debug, Clone)]
pub struct ImportSource {
  /// Original file name; used for logging and the commit summary.
  pub name:      String,
  pub operation: Operation,
  pub dataset:   ParsedDataset,
}

/// The kind of import request; determines the commit kind, the summary label
/// and which source operations are acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportAction {
  Add,
  Remove,
  RemoveAdd,
}

impl ImportAction {
  pub fn label(self) -> &'static str {
    match self {
      Self::Add => "add",
      Self::Remove => "remove",
      Self::RemoveAdd => "remove-add",
    }
  }

  pub fn commit_kind(self) -> CommitKind {
    match self {
      Self::Add => CommitKind::Add,
      Self::Remove => CommitKind::Remove,
      Self::RemoveAdd => CommitKind::Mixed,
    }
  }

  fn accepts(self, op: Operation) -> bool {
    match self {
      Self::Add => op == Operation::Add,
      Self::Remove => op == Operation::Remove,
      Self::RemoveAdd => true,
    }
  }
}

/// `"<action>: [(a.nq),(b.trig)]"`
pub fn summarize(action: ImportAction, sources: &[ImportSource]) -> String {
  let names: Vec<String> =
    sources.iter().map(|s| format!("({})", s.name)).collect();
  format!("{}: [{}]", action.label(), names.join(","))
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

/// Turns tagged, parsed uploads into a single commit on a [`VersionedStore`].
pub struct ImportPipeline<S> {
  store: Arc<S>,
}

impl<S> Clone for ImportPipeline<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: VersionedStore> ImportPipeline<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// Commit all `sources` as one new version.
  ///
  /// Sources whose operation does not fit `action` are rejected with
  /// [`Error::AmbiguousOperation`] before the store is touched. Remove
  /// sources are ordered before add sources.
  pub async fn import(
    &self,
    action: ImportAction,
    mut sources: Vec<ImportSource>,
  ) -> Result<Commit> {
    if let Some(bad) = sources.iter().find(|s| !action.accepts(s.operation)) {
      return Err(Error::AmbiguousOperation(bad.name.clone()));
    }

    // Stable sort: removes keep their relative order, then adds.
    sources.sort_by_key(|s| s.operation == Operation::Add);

    let summary = summarize(action, &sources);
    let mut ops = Vec::new();
    for source in sources {
      info!(file = %source.name, op = source.operation.as_str(), "importing");
      let op = source.operation;
      ops.extend(
        source
          .dataset
          .into_quads()
          .map(|quad| QuadOp { op, quad }),
      );
    }

    let batch = CommitBatch::new(action.commit_kind(), summary).with_ops(ops);
    let commit = self
      .store
      .commit(batch)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;

    info!(version = commit.version, summary = %commit.summary, "import committed");
    Ok(commit)
  }
}
