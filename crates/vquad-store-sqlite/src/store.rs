//! [`SqliteStore`], the SQLite implementation of [`VersionedStore`].

use std::path::Path;

use chrono::Utc;
use tracing::info;

use vquad_core::{
  commit::{Commit, CommitBatch},
  quad::View,
  store::VersionedStore,
  term::{GraphId, GraphName, Term, TermId},
  validity::Validity,
};

use crate::{
  Error, Result, commit_log, dictionary,
  encode::{RawAnnotatedQuad, decode_unsigned, encode_dt},
  graphs, quads,
  schema::{RESET, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A versioned quad store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `select` and read the width in one transaction so both come from
  /// the same snapshot.
  async fn read_view<F>(&self, select: F) -> Result<View>
  where
    F: FnOnce(&rusqlite::Connection) -> rusqlite::Result<Vec<RawAnnotatedQuad>>
      + Send
      + 'static,
  {
    let (width, rows) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let width = commit_log::width(&tx)?;
        let rows = select(&*tx)?;
        tx.finish()?;
        Ok((width, rows))
      })
      .await?;

    let quads = rows
      .into_iter()
      .map(RawAnnotatedQuad::into_annotated)
      .collect::<Result<Vec<_>>>()?;
    Ok(View { width: decode_unsigned(width)?, quads })
  }
}

// ─── VersionedStore impl ─────────────────────────────────────────────────────

impl VersionedStore for SqliteStore {
  type Error = Error;

  async fn intern_term(&self, term: Term) -> Result<TermId> {
    let id = self
      .conn
      .call(move |conn| Ok(dictionary::intern_term(conn, &term)?))
      .await?;
    Ok(id)
  }

  async fn intern_graph(&self, graph: GraphName) -> Result<GraphId> {
    let id = self
      .conn
      .call(move |conn| Ok(graphs::intern_graph(conn, &graph)?))
      .await?;
    Ok(id)
  }

  async fn resolve_term(&self, id: TermId) -> Result<Option<Term>> {
    let raw = self
      .conn
      .call(move |conn| Ok(dictionary::resolve_term(conn, id)?))
      .await?;
    raw.map(|r| r.into_term()).transpose()
  }

  async fn resolve_graph(&self, id: GraphId) -> Result<Option<GraphName>> {
    let uri = self
      .conn
      .call(move |conn| Ok(graphs::resolve_graph(conn, id)?))
      .await?;
    Ok(uri.map(GraphName::from_uri))
  }

  async fn width(&self) -> Result<u64> {
    let width = self
      .conn
      .call(|conn| Ok(commit_log::width(conn)?))
      .await?;
    decode_unsigned(width)
  }

  async fn commits(&self) -> Result<Vec<Commit>> {
    let raws = self.conn.call(|conn| Ok(commit_log::list(conn)?)).await?;
    raws.into_iter().map(|r| r.into_commit()).collect()
  }

  async fn commit(&self, batch: CommitBatch) -> Result<Commit> {
    let created_at = Utc::now();
    let created_at_str = encode_dt(created_at);
    let kind = batch.kind;
    let summary = batch.summary.clone();

    let version = self
      .conn
      .call(move |conn| quads::commit(conn, &batch, &created_at_str))
      .await
      .map_err(Error::from_call)?;

    Ok(Commit {
      version: decode_unsigned(version)?,
      kind,
      summary,
      created_at,
    })
  }

  async fn reset(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        tx.execute_batch(RESET)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    info!("store reset");
    Ok(())
  }

  async fn quads_with_validity(&self, pattern: Validity) -> Result<View> {
    let pattern = pattern.to_string();
    self
      .read_view(move |conn| quads::with_validity(conn, &pattern))
      .await
  }

  async fn quads_valid_at(&self, version: u64) -> Result<View> {
    let version = i64::try_from(version).unwrap_or(i64::MAX - 1);
    self.read_view(move |conn| quads::valid_at(conn, version)).await
  }

  async fn current_view(&self) -> Result<View> {
    self
      .read_view(|conn| {
        let width = commit_log::width(conn)?;
        if width == 0 {
          return Ok(Vec::new());
        }
        quads::valid_at(conn, width - 1)
      })
      .await
  }
}
