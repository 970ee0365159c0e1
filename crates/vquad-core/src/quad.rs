//! Quads, tagged operations and versioned rows.

use std::str::FromStr;

use serde::Serialize;

use crate::{
  Error, Result,
  term::{GraphId, GraphName, Term, TermId},
  validity::Validity,
};

// ─── Term-level quads ────────────────────────────────────────────────────────

/// A (subject, predicate, object) statement as produced by a parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
  pub subject:   Term,
  pub predicate: Term,
  pub object:    Term,
}

impl Triple {
  pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
    Self { subject, predicate, object }
  }

  pub fn in_graph(self, graph: GraphName) -> Quad {
    Quad {
      subject: self.subject,
      predicate: self.predicate,
      object: self.object,
      graph,
    }
  }
}

/// A fact before interning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quad {
  pub subject:   Term,
  pub predicate: Term,
  pub object:    Term,
  pub graph:     GraphName,
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// Whether a fact is asserted or withdrawn at the new version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
  Add,
  Remove,
}

impl Operation {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Add => "add",
      Self::Remove => "remove",
    }
  }
}

impl FromStr for Operation {
  type Err = Error;

  /// Parse an explicit operation tag. Anything other than `add` or `remove`
  /// is ambiguous.
  fn from_str(s: &str) -> Result<Self> {
    match s {
      "add" => Ok(Self::Add),
      "remove" => Ok(Self::Remove),
      other => Err(Error::AmbiguousOperation(other.to_owned())),
    }
  }
}

/// A quad tagged with the operation to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuadOp {
  pub op:   Operation,
  pub quad: Quad,
}

impl QuadOp {
  pub fn add(quad: Quad) -> Self { Self { op: Operation::Add, quad } }

  pub fn remove(quad: Quad) -> Self { Self { op: Operation::Remove, quad } }
}

// ─── Interned rows ───────────────────────────────────────────────────────────

/// The identity of a versioned row: interned (s, p, o, g).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuadKey {
  pub subject:   TermId,
  pub predicate: TermId,
  pub object:    TermId,
  pub graph:     GraphId,
}

/// A stored row. `validity` is the only field that ever changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedQuad {
  pub key:      QuadKey,
  pub validity: Validity,
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// A row rendered back into terms, annotated with its full history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedQuad {
  pub subject:   Term,
  pub predicate: Term,
  pub object:    Term,
  pub graph:     GraphName,
  pub validity:  Validity,
}

/// The result of a read, paired with the width of the snapshot it was taken
/// from so callers can validate against the same state they read.
#[derive(Debug, Clone, Default)]
pub struct View {
  pub width: u64,
  pub quads: Vec<AnnotatedQuad>,
}
