//! The versioned quad table: the commit protocol and positional reads.
//!
//! A commit runs in one transaction:
//!
//! 1. read the width `W0` from the commit log; the new version is `W0`;
//! 2. apply removes, then adds, explicitly setting bit `W0` on touched rows;
//! 3. carry the newest bit forward on every row still `W0` long;
//! 4. check every row is now `W0 + 1` long;
//! 5. append the commit record.
//!
//! Any error drops the transaction, which rolls every row back to `W0`.

use rusqlite::{Connection, ToSql, params};
use tracing::{info, warn};
use vquad_core::{
  commit::CommitBatch,
  quad::{Operation, Quad, QuadKey},
};

use crate::{
  commit_log, dictionary,
  encode::{RawAnnotatedQuad, new_row_validity},
  graphs,
};

// ─── Keys ────────────────────────────────────────────────────────────────────

fn intern_key(conn: &Connection, quad: &Quad) -> rusqlite::Result<QuadKey> {
  Ok(QuadKey {
    subject:   dictionary::intern_term(conn, &quad.subject)?,
    predicate: dictionary::intern_term(conn, &quad.predicate)?,
    object:    dictionary::intern_term(conn, &quad.object)?,
    graph:     graphs::intern_graph(conn, &quad.graph)?,
  })
}

/// `None` if any component has never been interned.
fn lookup_key(
  conn: &Connection,
  quad: &Quad,
) -> rusqlite::Result<Option<QuadKey>> {
  let (Some(subject), Some(predicate), Some(object), Some(graph)) = (
    dictionary::lookup_term(conn, &quad.subject)?,
    dictionary::lookup_term(conn, &quad.predicate)?,
    dictionary::lookup_term(conn, &quad.object)?,
    graphs::lookup_graph(conn, &quad.graph)?,
  ) else {
    return Ok(None);
  };
  Ok(Some(QuadKey { subject, predicate, object, graph }))
}

// ─── Row updates ─────────────────────────────────────────────────────────────

/// Create the row if needed and set bit `version` to 1.
fn mark_added(
  conn: &Connection,
  key: QuadKey,
  version: usize,
) -> rusqlite::Result<()> {
  conn
    .prepare_cached(
      "INSERT INTO versioned_quads
         (subject_id, predicate_id, object_id, graph_id, validity)
       VALUES (?1, ?2, ?3, ?4, ?5)
       ON CONFLICT (subject_id, predicate_id, object_id, graph_id)
       DO UPDATE SET validity = substr(validity, 1, ?6) || '1'",
    )?
    .execute(params![
      key.subject,
      key.predicate,
      key.object,
      key.graph,
      new_row_validity(version, true),
      version as i64,
    ])?;
  Ok(())
}

/// Set bit `version` to 0. Returns `false` if the row does not exist.
fn mark_removed(
  conn: &Connection,
  key: QuadKey,
  version: usize,
) -> rusqlite::Result<bool> {
  let changed = conn
    .prepare_cached(
      "UPDATE versioned_quads SET validity = substr(validity, 1, ?5) || '0'
       WHERE subject_id = ?1 AND predicate_id = ?2
         AND object_id = ?3 AND graph_id = ?4",
    )?
    .execute(params![
      key.subject,
      key.predicate,
      key.object,
      key.graph,
      version as i64,
    ])?;
  Ok(changed > 0)
}

/// Extend every row not touched by this commit with a copy of its newest
/// bit. Returns the number of rows carried forward.
fn carry_forward(conn: &Connection, width: usize) -> rusqlite::Result<usize> {
  conn
    .prepare_cached(
      "UPDATE versioned_quads SET validity = validity || substr(validity, -1, 1)
       WHERE length(validity) = ?1",
    )?
    .execute(params![width as i64])
}

/// Length of some row whose validity is not `expected` long, if any.
fn find_misaligned(
  conn: &Connection,
  expected: usize,
) -> rusqlite::Result<Option<i64>> {
  use rusqlite::OptionalExtension as _;
  conn
    .prepare_cached(
      "SELECT length(validity) FROM versioned_quads
       WHERE length(validity) != ?1 LIMIT 1",
    )?
    .query_row(params![expected as i64], |r| r.get(0))
    .optional()
}

// ─── Commit ──────────────────────────────────────────────────────────────────

/// Apply `batch` as one new version. Returns the allocated version.
pub fn commit(
  conn: &mut Connection,
  batch: &CommitBatch,
  created_at: &str,
) -> tokio_rusqlite::Result<i64> {
  let tx = conn.transaction()?;
  let width = commit_log::width(&tx)? as usize;

  for op in batch.in_apply_order() {
    match op.op {
      Operation::Remove => {
        let removed = match lookup_key(&tx, &op.quad)? {
          Some(key) => mark_removed(&tx, key, width)?,
          None => false,
        };
        if !removed {
          warn!(quad = ?op.quad, "remove of unknown quad ignored");
        }
      }
      Operation::Add => {
        let key = intern_key(&tx, &op.quad)?;
        mark_added(&tx, key, width)?;
      }
    }
  }

  let carried = carry_forward(&tx, width)?;

  if let Some(found) = find_misaligned(&tx, width + 1)? {
    return Err(tokio_rusqlite::Error::Other(Box::new(
      vquad_core::Error::WidthMismatch {
        expected: width as u64 + 1,
        found:    found as u64,
      },
    )));
  }

  let version =
    commit_log::append(&tx, batch.kind.as_str(), &batch.summary, created_at)?;
  tx.commit()?;

  info!(
    version,
    kind = batch.kind.as_str(),
    ops = batch.ops.len(),
    carried,
    "committed"
  );
  Ok(version)
}

// ─── Reads ───────────────────────────────────────────────────────────────────

const SELECT_ANNOTATED: &str = "
SELECT s.lexical, s.kind, s.annotation,
       p.lexical, p.kind, p.annotation,
       o.lexical, o.kind, o.annotation,
       g.uri, q.validity
FROM versioned_quads q
JOIN terms        s ON s.term_id  = q.subject_id
JOIN terms        p ON p.term_id  = q.predicate_id
JOIN terms        o ON o.term_id  = q.object_id
JOIN named_graphs g ON g.graph_id = q.graph_id";

const ORDER: &str =
  "ORDER BY q.subject_id, q.predicate_id, q.object_id, q.graph_id";

fn select_where(
  conn: &Connection,
  condition: &str,
  param: &dyn ToSql,
) -> rusqlite::Result<Vec<RawAnnotatedQuad>> {
  let sql = format!("{SELECT_ANNOTATED} WHERE {condition} {ORDER}");
  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt
    .query_map([param], RawAnnotatedQuad::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// Rows whose validity string equals `pattern`.
pub fn with_validity(
  conn: &Connection,
  pattern: &str,
) -> rusqlite::Result<Vec<RawAnnotatedQuad>> {
  select_where(conn, "q.validity = ?1", &pattern)
}

/// Rows with a `1` at position `version`; empty past the width.
pub fn valid_at(
  conn: &Connection,
  version: i64,
) -> rusqlite::Result<Vec<RawAnnotatedQuad>> {
  // substr is 1-based.
  select_where(conn, "substr(q.validity, ?1, 1) = '1'", &(version + 1))
}
