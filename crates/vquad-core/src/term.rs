//! RDF terms and named graphs: the values interned by the term dictionary
//! and the graph registry.
//!
//! Terms are immutable once interned. A term is identified by its kind, its
//! lexical form and its annotation (datatype IRI or `@`-prefixed language
//! tag), which is exactly the uniqueness key of the persisted `terms` table.

use std::{fmt, str::FromStr};

use serde::{Serialize, Serializer};

use crate::{Error, Result};

/// Stable identifier assigned by the term dictionary.
pub type TermId = i64;

/// Stable identifier assigned by the graph registry.
pub type GraphId = i64;

pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const RDF_LANG_STRING: &str =
  "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// Reserved URI under which the unnamed graph is registered.
pub const DEFAULT_GRAPH_URI: &str = "default";

// ─── TermKind ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermKind {
  Iri,
  Literal,
  BlankNode,
}

impl TermKind {
  /// The discriminant string stored in the `kind` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Iri => "iri",
      Self::Literal => "literal",
      Self::BlankNode => "blank_node",
    }
  }
}

impl FromStr for TermKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "iri" => Ok(Self::Iri),
      "literal" => Ok(Self::Literal),
      "blank_node" => Ok(Self::BlankNode),
      other => Err(Error::UnknownTermKind(other.to_owned())),
    }
  }
}

// ─── Term ────────────────────────────────────────────────────────────────────

/// An RDF term. Serialises as its N-Triples rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
  Iri(String),
  Literal {
    value:    String,
    /// Always set; `rdf:langString` when `language` is present.
    datatype: String,
    language: Option<String>,
  },
  BlankNode(String),
}

impl Term {
  pub fn iri(value: impl Into<String>) -> Self { Self::Iri(value.into()) }

  pub fn blank(id: impl Into<String>) -> Self { Self::BlankNode(id.into()) }

  /// A plain `xsd:string` literal.
  pub fn literal(value: impl Into<String>) -> Self {
    Self::typed_literal(value, XSD_STRING)
  }

  pub fn typed_literal(
    value: impl Into<String>,
    datatype: impl Into<String>,
  ) -> Self {
    Self::Literal {
      value:    value.into(),
      datatype: datatype.into(),
      language: None,
    }
  }

  pub fn lang_literal(
    value: impl Into<String>,
    language: impl Into<String>,
  ) -> Self {
    Self::Literal {
      value:    value.into(),
      datatype: RDF_LANG_STRING.to_owned(),
      language: Some(language.into()),
    }
  }

  pub fn kind(&self) -> TermKind {
    match self {
      Self::Iri(_) => TermKind::Iri,
      Self::Literal { .. } => TermKind::Literal,
      Self::BlankNode(_) => TermKind::BlankNode,
    }
  }

  /// The lexical form: IRI string, literal value or blank node label.
  pub fn lexical(&self) -> &str {
    match self {
      Self::Iri(v) | Self::BlankNode(v) => v,
      Self::Literal { value, .. } => value,
    }
  }

  /// The `datatype_or_lang` column value: `@tag` for language-tagged
  /// literals, the datatype IRI for other literals, `None` otherwise.
  pub fn annotation(&self) -> Option<String> {
    match self {
      Self::Literal { language: Some(lang), .. } => Some(format!("@{lang}")),
      Self::Literal { datatype, .. } => Some(datatype.clone()),
      _ => None,
    }
  }

  /// Rebuild a term from its persisted columns.
  pub fn from_parts(
    kind: TermKind,
    lexical: String,
    annotation: Option<String>,
  ) -> Self {
    match kind {
      TermKind::Iri => Self::Iri(lexical),
      TermKind::BlankNode => Self::BlankNode(lexical),
      TermKind::Literal => match annotation {
        Some(a) => match a.strip_prefix('@') {
          Some(lang) => Self::lang_literal(lexical, lang),
          None => Self::typed_literal(lexical, a),
        },
        None => Self::literal(lexical),
      },
    }
  }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
  for c in value.chars() {
    match c {
      '"' => f.write_str("\\\"")?,
      '\\' => f.write_str("\\\\")?,
      '\n' => f.write_str("\\n")?,
      '\r' => f.write_str("\\r")?,
      '\t' => f.write_str("\\t")?,
      c => write!(f, "{c}")?,
    }
  }
  Ok(())
}

impl fmt::Display for Term {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Iri(v) => write!(f, "<{v}>"),
      Self::BlankNode(v) => write!(f, "_:{v}"),
      Self::Literal { value, datatype, language } => {
        f.write_str("\"")?;
        write_escaped(f, value)?;
        f.write_str("\"")?;
        match language {
          Some(lang) => write!(f, "@{lang}"),
          None if datatype == XSD_STRING => Ok(()),
          None => write!(f, "^^<{datatype}>"),
        }
      }
    }
  }
}

impl Serialize for Term {
  fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(self)
  }
}

// ─── GraphName ───────────────────────────────────────────────────────────────

/// A graph identifier; the unnamed graph is always present in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum GraphName {
  #[default]
  Default,
  Named(String),
}

impl GraphName {
  pub fn named(uri: impl Into<String>) -> Self { Self::Named(uri.into()) }

  /// The URI stored in the registry; `"default"` for the unnamed graph.
  pub fn uri(&self) -> &str {
    match self {
      Self::Default => DEFAULT_GRAPH_URI,
      Self::Named(uri) => uri,
    }
  }

  pub fn from_uri(uri: String) -> Self {
    if uri == DEFAULT_GRAPH_URI {
      Self::Default
    } else {
      Self::Named(uri)
    }
  }
}

impl fmt::Display for GraphName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.uri())
  }
}

impl Serialize for GraphName {
  fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(self.uri())
  }
}
