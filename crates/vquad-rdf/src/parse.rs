//! oxigraph-backed parsing and term conversion.

use oxigraph::{
  io::{RdfFormat, RdfParser},
  model::{self, NamedOrBlankNode},
};
use tracing::debug;
use vquad_core::{
  import::ParsedDataset,
  quad::Triple,
  term::Term,
};

use crate::error::{Error, Result};

// ─── Format detection ────────────────────────────────────────────────────────

/// Map a file name or extension to an RDF syntax.
pub fn format_from_hint(hint: &str) -> Result<RdfFormat> {
  let ext = hint.rsplit('.').next().unwrap_or(hint).to_ascii_lowercase();
  match ext.as_str() {
    "nq" | "nquads" => Ok(RdfFormat::NQuads),
    "trig" => Ok(RdfFormat::TriG),
    "nt" | "ntriples" => Ok(RdfFormat::NTriples),
    "ttl" | "turtle" => Ok(RdfFormat::Turtle),
    "rdf" | "xml" | "owl" => Ok(RdfFormat::RdfXml),
    _ => Err(Error::UnknownFormat(hint.to_owned())),
  }
}

// ─── Term conversion ─────────────────────────────────────────────────────────

fn subject_term(s: NamedOrBlankNode) -> Term {
  match s {
    NamedOrBlankNode::NamedNode(nn) => Term::iri(nn.into_string()),
    NamedOrBlankNode::BlankNode(bn) => Term::blank(bn.into_string()),
  }
}

fn object_term(o: model::Term) -> Result<Term> {
  match o {
    model::Term::NamedNode(nn) => Ok(Term::iri(nn.into_string())),
    model::Term::BlankNode(bn) => Ok(Term::blank(bn.into_string())),
    model::Term::Literal(lit) => {
      let value = lit.value().to_owned();
      Ok(match lit.language() {
        Some(lang) => Term::lang_literal(value, lang),
        None => Term::typed_literal(value, lit.datatype().as_str()),
      })
    }
    #[allow(unreachable_patterns)]
    other => Err(Error::Syntax(format!("unsupported object term: {other}"))),
  }
}

/// `None` for the default graph.
fn graph_uri(g: model::GraphName) -> Option<String> {
  match g {
    model::GraphName::NamedNode(nn) => Some(nn.into_string()),
    model::GraphName::BlankNode(bn) => Some(format!("_:{}", bn.as_str())),
    model::GraphName::DefaultGraph => None,
  }
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

pub(crate) fn parse_dataset(
  bytes: &[u8],
  format: RdfFormat,
) -> Result<ParsedDataset> {
  let mut dataset = ParsedDataset::default();

  for quad in RdfParser::from_format(format).for_reader(bytes) {
    let quad = quad.map_err(|e| Error::Syntax(e.to_string()))?;
    let triple = Triple::new(
      subject_term(quad.subject),
      Term::iri(quad.predicate.into_string()),
      object_term(quad.object)?,
    );
    match graph_uri(quad.graph_name) {
      Some(uri) => dataset.named_graphs.entry(uri).or_default().push(triple),
      None => dataset.default_graph.push(triple),
    }
  }

  debug!(
    format = format.name(),
    statements = dataset.len(),
    named_graphs = dataset.named_graphs.len(),
    "parsed RDF document"
  );
  Ok(dataset)
}
