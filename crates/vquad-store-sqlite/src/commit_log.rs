//! The append-only commit log. Its length is the store width.

use rusqlite::{Connection, params};

use crate::encode::RawCommit;

/// Number of commits so far, i.e. the required validity length.
pub fn width(conn: &Connection) -> rusqlite::Result<i64> {
  conn
    .prepare_cached("SELECT COUNT(*) FROM commits")?
    .query_row([], |r| r.get(0))
}

/// Record a commit under the next sequential version and return it.
pub fn append(
  conn: &Connection,
  kind: &str,
  summary: &str,
  created_at: &str,
) -> rusqlite::Result<i64> {
  let version = width(conn)?;
  conn
    .prepare_cached(
      "INSERT INTO commits (version, kind, summary, created_at)
       VALUES (?1, ?2, ?3, ?4)",
    )?
    .execute(params![version, kind, summary, created_at])?;
  Ok(version)
}

pub fn list(conn: &Connection) -> rusqlite::Result<Vec<RawCommit>> {
  let mut stmt = conn.prepare_cached(
    "SELECT version, kind, summary, created_at FROM commits ORDER BY version",
  )?;
  let rows = stmt
    .query_map([], |row| {
      Ok(RawCommit {
        version:    row.get(0)?,
        kind:       row.get(1)?,
        summary:    row.get(2)?,
        created_at: row.get(3)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}
