//! Encoding and decoding helpers between vquad domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings. Term annotations use `''` for "none" so
//! the `UNIQUE (lexical, kind, annotation)` constraint sees equal keys.
//! Validity vectors are `'0'`/`'1'` strings, version 0 first.

use chrono::{DateTime, Utc};
use vquad_core::{
  commit::{Commit, CommitKind},
  quad::AnnotatedQuad,
  term::{GraphName, Term, TermKind},
  validity::Validity,
};

use crate::{Error, Result};

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Term columns
// ─────────────────────────────────────────────────────────────

pub fn encode_annotation(term: &Term) -> String {
  term.annotation().unwrap_or_default()
}

pub fn decode_annotation(s: String) -> Option<String> {
  (!s.is_empty()).then_some(s)
}

// ─── Validity ────────────────────────────────────────────────────────────────

/// The validity string of a row first created at `version`.
pub fn new_row_validity(version: usize, bit: bool) -> String {
  let mut s = "0".repeat(version);
  s.push(if bit { '1' } else { '0' });
  s
}

pub fn decode_unsigned(v: i64) -> Result<u64> {
  u64::try_from(v).map_err(|_| Error::Negative(v))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `terms` row.
pub struct RawTerm {
  pub lexical:    String,
  pub kind:       String,
  pub annotation: String,
}

impl RawTerm {
  pub fn into_term(self) -> Result<Term> {
    let kind: TermKind = self.kind.parse()?;
    Ok(Term::from_parts(
      kind,
      self.lexical,
      decode_annotation(self.annotation),
    ))
  }
}

/// A `versioned_quads` row joined with its terms and graph.
pub struct RawAnnotatedQuad {
  pub subject:   RawTerm,
  pub predicate: RawTerm,
  pub object:    RawTerm,
  pub graph_uri: String,
  pub validity:  String,
}

impl RawAnnotatedQuad {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    let term = |offset: usize| -> rusqlite::Result<RawTerm> {
      Ok(RawTerm {
        lexical:    row.get(offset)?,
        kind:       row.get(offset + 1)?,
        annotation: row.get(offset + 2)?,
      })
    };
    Ok(Self {
      subject:   term(0)?,
      predicate: term(3)?,
      object:    term(6)?,
      graph_uri: row.get(9)?,
      validity:  row.get(10)?,
    })
  }

  pub fn into_annotated(self) -> Result<AnnotatedQuad> {
    let validity: Validity = self.validity.parse()?;
    Ok(AnnotatedQuad {
      subject: self.subject.into_term()?,
      predicate: self.predicate.into_term()?,
      object: self.object.into_term()?,
      graph: GraphName::from_uri(self.graph_uri),
      validity,
    })
  }
}

/// Raw values read directly from a `commits` row.
pub struct RawCommit {
  pub version:    i64,
  pub kind:       String,
  pub summary:    String,
  pub created_at: String,
}

impl RawCommit {
  pub fn into_commit(self) -> Result<Commit> {
    let kind: CommitKind = self.kind.parse()?;
    Ok(Commit {
      version: decode_unsigned(self.version)?,
      kind,
      summary: self.summary,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
