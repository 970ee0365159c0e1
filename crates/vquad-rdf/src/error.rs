//! Error types for the vquad-rdf parser.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unsupported RDF format: {0:?}")]
  UnknownFormat(String),

  #[error("RDF syntax error: {0}")]
  Syntax(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
