//! Commit records and the batch handed to a store for one commit.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  quad::{Operation, QuadOp},
};

/// Aggregate kind of a commit's batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitKind {
  Add,
  Remove,
  Mixed,
}

impl CommitKind {
  /// The discriminant string stored in the `kind` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Add => "add",
      Self::Remove => "remove",
      Self::Mixed => "mixed",
    }
  }
}

impl FromStr for CommitKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "add" => Ok(Self::Add),
      "remove" => Ok(Self::Remove),
      "mixed" => Ok(Self::Mixed),
      other => Err(Error::UnknownCommitKind(other.to_owned())),
    }
  }
}

/// One entry of the append-only commit log. `version` equals the log
/// position, starting at 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
  pub version:    u64,
  pub kind:       CommitKind,
  pub summary:    String,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::VersionedStore::commit`].
#[derive(Debug, Clone)]
pub struct CommitBatch {
  pub kind:    CommitKind,
  pub summary: String,
  pub ops:     Vec<QuadOp>,
}

impl CommitBatch {
  pub fn new(kind: CommitKind, summary: impl Into<String>) -> Self {
    Self { kind, summary: summary.into(), ops: Vec::new() }
  }

  pub fn with_ops(mut self, ops: impl IntoIterator<Item = QuadOp>) -> Self {
    self.ops.extend(ops);
    self
  }

  /// Removes first, then adds, so a quad both removed and added in one batch
  /// ends the commit valid. Stores apply operations in this order regardless
  /// of how the batch was assembled.
  pub fn in_apply_order(&self) -> impl Iterator<Item = &QuadOp> {
    let removes = self.ops.iter().filter(|o| o.op == Operation::Remove);
    let adds = self.ops.iter().filter(|o| o.op == Operation::Add);
    removes.chain(adds)
  }
}
