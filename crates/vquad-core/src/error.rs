//! Error types for `vquad-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A validity pattern with the wrong length or non-binary characters.
  #[error("invalid validity pattern: {0}")]
  InvalidPattern(String),

  #[error("invalid version {version}: store has {width} committed versions")]
  InvalidVersion { version: i64, width: u64 },

  #[error("invalid query: {0}")]
  InvalidQuery(String),

  /// The request was well-formed but matched nothing.
  #[error("no quads matched")]
  NotFound,

  /// An import source whose add/remove intent cannot be determined.
  #[error("cannot classify import source {0:?} as add or remove")]
  AmbiguousOperation(String),

  #[error("unknown term kind discriminant: {0:?}")]
  UnknownTermKind(String),

  #[error("unknown commit kind discriminant: {0:?}")]
  UnknownCommitKind(String),

  /// A row's validity length disagrees with the commit width.
  #[error("validity width mismatch: expected {expected} bits, found {found}")]
  WidthMismatch { expected: u64, found: u64 },

  #[error("store state lock poisoned")]
  LockPoisoned,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Whether the error stems from caller input rather than infrastructure.
  pub fn is_client_error(&self) -> bool {
    matches!(
      self,
      Self::InvalidPattern(_)
        | Self::InvalidVersion { .. }
        | Self::InvalidQuery(_)
        | Self::AmbiguousOperation(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
