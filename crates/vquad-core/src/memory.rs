//! [`MemoryStore`], an in-process [`VersionedStore`].
//!
//! Rows live in an arena of [`Validity`] vectors indexed by [`QuadKey`]; the
//! width is the length of the commit log. A single `RwLock` serialises commits
//! and gives readers a consistent snapshot.

use std::{
  collections::HashMap,
  sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use chrono::Utc;
use tracing::{info, warn};

use crate::{
  Error, Result,
  commit::{Commit, CommitBatch},
  quad::{AnnotatedQuad, Operation, Quad, QuadKey, VersionedQuad, View},
  store::VersionedStore,
  term::{GraphId, GraphName, Term, TermId},
  validity::Validity,
};

// ─── State ───────────────────────────────────────────────────────────────────

struct State {
  terms:      Vec<Term>,
  term_ids:   HashMap<Term, TermId>,
  graphs:     Vec<GraphName>,
  graph_ids:  HashMap<GraphName, GraphId>,
  quads:      Vec<VersionedQuad>,
  quad_index: HashMap<QuadKey, usize>,
  commits:    Vec<Commit>,
}

impl State {
  fn new() -> Self {
    let mut state = Self {
      terms:      Vec::new(),
      term_ids:   HashMap::new(),
      graphs:     Vec::new(),
      graph_ids:  HashMap::new(),
      quads:      Vec::new(),
      quad_index: HashMap::new(),
      commits:    Vec::new(),
    };
    state.intern_graph(GraphName::Default);
    state
  }

  fn width(&self) -> u64 { self.commits.len() as u64 }

  fn intern_term(&mut self, term: &Term) -> TermId {
    if let Some(&id) = self.term_ids.get(term) {
      return id;
    }
    let id = self.terms.len() as TermId;
    self.terms.push(term.clone());
    self.term_ids.insert(term.clone(), id);
    id
  }

  fn intern_graph(&mut self, graph: GraphName) -> GraphId {
    if let Some(&id) = self.graph_ids.get(&graph) {
      return id;
    }
    let id = self.graphs.len() as GraphId;
    self.graphs.push(graph.clone());
    self.graph_ids.insert(graph, id);
    id
  }

  fn intern_key(&mut self, quad: &Quad) -> QuadKey {
    QuadKey {
      subject:   self.intern_term(&quad.subject),
      predicate: self.intern_term(&quad.predicate),
      object:    self.intern_term(&quad.object),
      graph:     self.intern_graph(quad.graph.clone()),
    }
  }

  /// Look up a key without interning; `None` if any component is unknown.
  fn lookup_key(&self, quad: &Quad) -> Option<QuadKey> {
    Some(QuadKey {
      subject:   *self.term_ids.get(&quad.subject)?,
      predicate: *self.term_ids.get(&quad.predicate)?,
      object:    *self.term_ids.get(&quad.object)?,
      graph:     *self.graph_ids.get(&quad.graph)?,
    })
  }

  fn annotate(&self, row: &VersionedQuad) -> AnnotatedQuad {
    let term = |id: TermId| self.terms[id as usize].clone();
    AnnotatedQuad {
      subject:   term(row.key.subject),
      predicate: term(row.key.predicate),
      object:    term(row.key.object),
      graph:     self.graphs[row.key.graph as usize].clone(),
      validity:  row.validity.clone(),
    }
  }

  fn view(&self, keep: impl Fn(&Validity) -> bool) -> View {
    View {
      width: self.width(),
      quads: self
        .quads
        .iter()
        .filter(|row| keep(&row.validity))
        .map(|row| self.annotate(row))
        .collect(),
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A versioned quad store held entirely in memory, for tests and as a
/// reference backend.
///
/// Each commit rebuilds the row arena and index before swapping them in, so
/// peak memory during a commit is about twice the store size.
///
/// Cloning is cheap: clones share the same state.
#[derive(Clone)]
pub struct MemoryStore {
  state: Arc<RwLock<State>>,
}

impl Default for MemoryStore {
  fn default() -> Self { Self::new() }
}

impl MemoryStore {
  pub fn new() -> Self { Self { state: Arc::new(RwLock::new(State::new())) } }

  fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
    self.state.read().map_err(|_| Error::LockPoisoned)
  }

  fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
    self.state.write().map_err(|_| Error::LockPoisoned)
  }
}

impl VersionedStore for MemoryStore {
  type Error = Error;

  async fn intern_term(&self, term: Term) -> Result<TermId> {
    Ok(self.write()?.intern_term(&term))
  }

  async fn intern_graph(&self, graph: GraphName) -> Result<GraphId> {
    Ok(self.write()?.intern_graph(graph))
  }

  async fn resolve_term(&self, id: TermId) -> Result<Option<Term>> {
    let state = self.read()?;
    Ok(usize::try_from(id).ok().and_then(|i| state.terms.get(i)).cloned())
  }

  async fn resolve_graph(&self, id: GraphId) -> Result<Option<GraphName>> {
    let state = self.read()?;
    Ok(usize::try_from(id).ok().and_then(|i| state.graphs.get(i)).cloned())
  }

  async fn width(&self) -> Result<u64> { Ok(self.read()?.width()) }

  async fn commits(&self) -> Result<Vec<Commit>> {
    Ok(self.read()?.commits.clone())
  }

  async fn commit(&self, batch: CommitBatch) -> Result<Commit> {
    let mut guard = self.write()?;
    let state = &mut *guard;
    let new_idx = state.commits.len();

    // Work on a copy of the arena so a failed check leaves the store as it
    // was. Interned terms may outlive a failed commit; they are immutable.
    let mut quads = state.quads.clone();
    let mut quad_index = state.quad_index.clone();

    for op in batch.in_apply_order() {
      match op.op {
        Operation::Remove => {
          let row = state
            .lookup_key(&op.quad)
            .and_then(|key| quad_index.get(&key).copied());
          match row {
            Some(row) => quads[row].validity.record(new_idx, false),
            None => warn!(quad = ?op.quad, "remove of unknown quad ignored"),
          }
        }
        Operation::Add => {
          let key = state.intern_key(&op.quad);
          let row = *quad_index.entry(key).or_insert_with(|| {
            quads.push(VersionedQuad { key, validity: Validity::zeros(new_idx) });
            quads.len() - 1
          });
          quads[row].validity.record(new_idx, true);
        }
      }
    }

    for row in quads.iter_mut().filter(|r| r.validity.len() == new_idx) {
      row.validity.carry_forward();
    }

    let expected = new_idx + 1;
    if let Some(bad) = quads.iter().find(|r| r.validity.len() != expected) {
      return Err(Error::WidthMismatch {
        expected: expected as u64,
        found:    bad.validity.len() as u64,
      });
    }

    let commit = Commit {
      version:    new_idx as u64,
      kind:       batch.kind,
      summary:    batch.summary,
      created_at: Utc::now(),
    };
    state.quads = quads;
    state.quad_index = quad_index;
    state.commits.push(commit.clone());

    info!(
      version = commit.version,
      kind = commit.kind.as_str(),
      ops = batch.ops.len(),
      "committed"
    );
    Ok(commit)
  }

  async fn reset(&self) -> Result<()> {
    *self.write()? = State::new();
    Ok(())
  }

  async fn quads_with_validity(&self, pattern: Validity) -> Result<View> {
    Ok(self.read()?.view(|v| *v == pattern))
  }

  async fn quads_valid_at(&self, version: u64) -> Result<View> {
    let index = version as usize;
    Ok(self.read()?.view(|v| v.get(index) == Some(true)))
  }

  async fn current_view(&self) -> Result<View> {
    let state = self.read()?;
    match state.commits.len().checked_sub(1) {
      Some(newest) => Ok(state.view(|v| v.get(newest) == Some(true))),
      None => Ok(View::default()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    commit::CommitKind,
    quad::{QuadOp, Triple},
  };

  fn ex(local: &str) -> Term { Term::iri(format!("http://example.org/{local}")) }

  fn quad(s: &str, p: &str, o: &str) -> Quad {
    Triple::new(ex(s), ex(p), ex(o)).in_graph(GraphName::Default)
  }

  async fn commit(store: &MemoryStore, ops: Vec<QuadOp>) -> Commit {
    let batch = CommitBatch::new(CommitKind::Mixed, "test").with_ops(ops);
    store.commit(batch).await.unwrap()
  }

  async fn validity_of(store: &MemoryStore, q: &Quad) -> Option<String> {
    let width = store.width().await.unwrap();
    let mut found = None;
    for v in 0..width {
      for row in store.quads_valid_at(v).await.unwrap().quads {
        if row.subject == q.subject && row.object == q.object {
          found = Some(row.validity.to_string());
        }
      }
    }
    found
  }

  #[tokio::test]
  async fn scenarios_add_remove_readd() {
    let store = MemoryStore::new();
    let ab = quad("a", "p", "b");
    let cd = quad("c", "p", "d");

    let c0 = commit(&store, vec![QuadOp::add(ab.clone())]).await;
    assert_eq!(c0.version, 0);
    assert_eq!(store.width().await.unwrap(), 1);

    commit(&store, vec![QuadOp::remove(ab.clone())]).await;
    assert_eq!(store.width().await.unwrap(), 2);
    let view = store.quads_with_validity("10".parse().unwrap()).await.unwrap();
    assert_eq!(view.quads.len(), 1);

    commit(&store, vec![QuadOp::add(ab.clone()), QuadOp::add(cd.clone())])
      .await;
    assert_eq!(store.width().await.unwrap(), 3);
    assert_eq!(validity_of(&store, &ab).await.as_deref(), Some("101"));
    assert_eq!(validity_of(&store, &cd).await.as_deref(), Some("001"));
  }

  #[tokio::test]
  async fn remove_and_add_in_one_batch_ends_valid() {
    let store = MemoryStore::new();
    let ab = quad("a", "p", "b");
    commit(&store, vec![QuadOp::add(ab.clone())]).await;

    // Add listed before remove: removes still apply first.
    commit(&store, vec![QuadOp::add(ab.clone()), QuadOp::remove(ab.clone())])
      .await;
    let view = store.quads_with_validity("11".parse().unwrap()).await.unwrap();
    assert_eq!(view.quads.len(), 1);
  }

  #[tokio::test]
  async fn untouched_rows_carry_forward() {
    let store = MemoryStore::new();
    commit(&store, vec![QuadOp::add(quad("a", "p", "b"))]).await;
    commit(&store, vec![QuadOp::add(quad("c", "p", "d"))]).await;
    commit(&store, vec![QuadOp::remove(quad("c", "p", "d"))]).await;
    commit(&store, vec![]).await;

    let width = store.width().await.unwrap();
    assert_eq!(width, 4);
    let all = store.quads_valid_at(1).await.unwrap().quads;
    assert_eq!(all.len(), 2);
    for row in &all {
      assert_eq!(row.validity.len() as u64, width);
    }
    assert_eq!(validity_of(&store, &quad("a", "p", "b")).await.as_deref(), Some("1111"));
    assert_eq!(validity_of(&store, &quad("c", "p", "d")).await.as_deref(), Some("0100"));
  }

  #[tokio::test]
  async fn remove_of_unknown_quad_is_noop() {
    let store = MemoryStore::new();
    commit(&store, vec![QuadOp::remove(quad("x", "p", "y"))]).await;
    assert_eq!(store.width().await.unwrap(), 1);
    assert!(store.quads_valid_at(0).await.unwrap().quads.is_empty());
    assert!(store.quads_with_validity("0".parse().unwrap()).await.unwrap().quads.is_empty());
  }

  #[tokio::test]
  async fn interning_is_idempotent() {
    let store = MemoryStore::new();
    let a = store.intern_term(ex("a")).await.unwrap();
    let b = store.intern_term(ex("b")).await.unwrap();
    assert_ne!(a, b);
    assert_eq!(store.intern_term(ex("a")).await.unwrap(), a);

    let g = store.intern_graph(GraphName::named("http://ex/g")).await.unwrap();
    assert_eq!(store.intern_graph(GraphName::named("http://ex/g")).await.unwrap(), g);
    assert_eq!(store.resolve_term(a).await.unwrap(), Some(ex("a")));
    assert_eq!(store.resolve_graph(g).await.unwrap(), Some(GraphName::named("http://ex/g")));
  }

  #[tokio::test]
  async fn default_graph_is_always_registered() {
    let store = MemoryStore::new();
    let id = store.intern_graph(GraphName::Default).await.unwrap();
    assert_eq!(store.resolve_graph(id).await.unwrap(), Some(GraphName::Default));

    store.reset().await.unwrap();
    assert_eq!(store.resolve_graph(id).await.unwrap(), Some(GraphName::Default));
  }

  #[tokio::test]
  async fn reset_clears_history() {
    let store = MemoryStore::new();
    commit(&store, vec![QuadOp::add(quad("a", "p", "b"))]).await;
    store.reset().await.unwrap();
    assert_eq!(store.width().await.unwrap(), 0);
    assert!(store.commits().await.unwrap().is_empty());
    assert!(store.current_view().await.unwrap().quads.is_empty());
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn concurrent_commits_serialize_and_share_terms() {
    const TASKS: usize = 16;
    let store = MemoryStore::new();

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..TASKS {
      let store = store.clone();
      tasks.spawn(async move {
        let id = store.intern_term(ex("shared")).await.unwrap();
        commit(&store, vec![
          QuadOp::add(quad("shared", "p", "x")),
          QuadOp::add(quad(&format!("n{i}"), "p", "x")),
        ])
        .await;
        let view = store.current_view().await.unwrap();
        for row in &view.quads {
          assert_eq!(row.validity.len() as u64, view.width);
        }
        id
      });
    }

    let mut ids = Vec::new();
    while let Some(id) = tasks.join_next().await {
      ids.push(id.unwrap());
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 1);

    let view = store.current_view().await.unwrap();
    assert_eq!(view.width, TASKS as u64);
    assert_eq!(view.quads.len(), TASKS + 1);
    assert!(view.quads.iter().all(|row| row.validity.len() == TASKS));

    let versions: Vec<u64> =
      store.commits().await.unwrap().iter().map(|c| c.version).collect();
    assert_eq!(versions, (0..TASKS as u64).collect::<Vec<_>>());
  }
}
