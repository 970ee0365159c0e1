//! RDF upload parser for vquad.
//!
//! Turns the raw bytes of an N-Quads, TriG, N-Triples, Turtle or RDF/XML
//! document into a [`ParsedDataset`] ready for the import pipeline. Pure
//! synchronous; no HTTP or database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! let doc = b"<http://ex/a> <http://ex/p> <http://ex/b> <http://ex/g> .\n";
//! let dataset = vquad_rdf::parse(doc, "changes.nq").unwrap();
//! assert_eq!(dataset.named_graphs.len(), 1);
//! ```

pub mod error;
mod parse;

pub use error::{Error, Result};
pub use parse::format_from_hint;
use vquad_core::import::ParsedDataset;

/// Parse a whole document.
///
/// `format_hint` is a file name or bare extension (`nq`, `trig`, `nt`,
/// `ttl`, `rdf`, `xml`). The first syntax error aborts the parse; nothing is
/// returned for a partially valid document.
pub fn parse(bytes: &[u8], format_hint: &str) -> Result<ParsedDataset> {
  let format = format_from_hint(format_hint)?;
  parse::parse_dataset(bytes, format)
}
