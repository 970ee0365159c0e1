//! The term dictionary: get-or-create interning of RDF terms.
//!
//! All functions take a plain connection so they compose inside the commit
//! transaction. Uniqueness is enforced by the `terms` UNIQUE constraint; an
//! insert that loses a race simply does nothing and the follow-up select
//! returns the existing id.

use rusqlite::{Connection, OptionalExtension as _, params};
use vquad_core::term::{Term, TermId};

use crate::encode::{RawTerm, encode_annotation};

pub fn intern_term(conn: &Connection, term: &Term) -> rusqlite::Result<TermId> {
  let kind = term.kind().as_str();
  let annotation = encode_annotation(term);

  conn
    .prepare_cached(
      "INSERT INTO terms (lexical, kind, annotation) VALUES (?1, ?2, ?3)
       ON CONFLICT (lexical, kind, annotation) DO NOTHING",
    )?
    .execute(params![term.lexical(), kind, annotation])?;

  conn
    .prepare_cached(
      "SELECT term_id FROM terms
       WHERE lexical = ?1 AND kind = ?2 AND annotation = ?3",
    )?
    .query_row(params![term.lexical(), kind, annotation], |r| r.get(0))
}

/// Look up a term without creating it.
pub fn lookup_term(
  conn: &Connection,
  term: &Term,
) -> rusqlite::Result<Option<TermId>> {
  conn
    .prepare_cached(
      "SELECT term_id FROM terms
       WHERE lexical = ?1 AND kind = ?2 AND annotation = ?3",
    )?
    .query_row(
      params![term.lexical(), term.kind().as_str(), encode_annotation(term)],
      |r| r.get(0),
    )
    .optional()
}

pub fn resolve_term(
  conn: &Connection,
  id: TermId,
) -> rusqlite::Result<Option<RawTerm>> {
  conn
    .prepare_cached(
      "SELECT lexical, kind, annotation FROM terms WHERE term_id = ?1",
    )?
    .query_row(params![id], |row| {
      Ok(RawTerm {
        lexical:    row.get(0)?,
        kind:       row.get(1)?,
        annotation: row.get(2)?,
      })
    })
    .optional()
}
