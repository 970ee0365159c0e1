//! The graph registry: get-or-create interning of graph URIs. The default
//! graph is seeded by the schema under the reserved URI `default`.

use rusqlite::{Connection, OptionalExtension as _, params};
use vquad_core::term::{GraphId, GraphName};

pub fn intern_graph(
  conn: &Connection,
  graph: &GraphName,
) -> rusqlite::Result<GraphId> {
  conn
    .prepare_cached(
      "INSERT INTO named_graphs (uri) VALUES (?1) ON CONFLICT (uri) DO NOTHING",
    )?
    .execute(params![graph.uri()])?;

  conn
    .prepare_cached("SELECT graph_id FROM named_graphs WHERE uri = ?1")?
    .query_row(params![graph.uri()], |r| r.get(0))
}

pub fn lookup_graph(
  conn: &Connection,
  graph: &GraphName,
) -> rusqlite::Result<Option<GraphId>> {
  conn
    .prepare_cached("SELECT graph_id FROM named_graphs WHERE uri = ?1")?
    .query_row(params![graph.uri()], |r| r.get(0))
    .optional()
}

pub fn resolve_graph(
  conn: &Connection,
  id: GraphId,
) -> rusqlite::Result<Option<String>> {
  conn
    .prepare_cached("SELECT uri FROM named_graphs WHERE graph_id = ?1")?
    .query_row(params![id], |r| r.get(0))
    .optional()
}
