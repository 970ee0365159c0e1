//! JSON HTTP API for vquad.
//!
//! Exposes an axum [`Router`] backed by any
//! [`vquad_core::store::VersionedStore`]. TLS, body limits and tracing layers
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let state = vquad_api::AppState::new(store, Arc::new(QuadPatternTranslator));
//! let app = vquad_api::api_router(state).layer(TraceLayer::new_for_http());
//! ```

pub mod commits;
pub mod error;
pub mod import;
pub mod query;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use vquad_core::{
  gateway::QueryGateway, import::ImportPipeline, pattern::QueryTranslator,
  store::VersionedStore,
};

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers. Both halves wrap the same
/// store.
pub struct AppState<S> {
  pub pipeline: ImportPipeline<S>,
  pub gateway:  QueryGateway<S>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { pipeline: self.pipeline.clone(), gateway: self.gateway.clone() }
  }
}

impl<S: VersionedStore> AppState<S> {
  pub fn new(store: Arc<S>, translator: Arc<dyn QueryTranslator>) -> Self {
    Self {
      pipeline: ImportPipeline::new(store.clone()),
      gateway:  QueryGateway::new(store, translator),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: VersionedStore + 'static,
{
  Router::new()
    // Imports
    .route("/import/add", post(import::add::<S>))
    .route("/import/remove", post(import::remove::<S>))
    .route("/import/remove-add", post(import::remove_add::<S>))
    // Queries
    .route("/query/validity/{pattern}", get(query::by_validity::<S>))
    .route("/query/version/{id}", get(query::by_version::<S>))
    .route("/query/sparql", post(query::structured::<S>))
    // Commit log
    .route("/commits", get(commits::list::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::Value;
  use tower::ServiceExt as _;
  use vquad_core::pattern::QuadPatternTranslator;
  use vquad_store_sqlite::SqliteStore;

  use super::*;

  const BOUNDARY: &str = "vquad-test-boundary";

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState::new(Arc::new(store), Arc::new(QuadPatternTranslator))
  }

  /// `(field name, file name, contents)`
  fn multipart_body(parts: &[(&str, &str, &str)]) -> String {
    let mut body = String::new();
    for (field, file, contents) in parts {
      body.push_str(&format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
         filename=\"{file}\"\r\nContent-Type: application/octet-stream\r\n\r\n\
         {contents}\r\n"
      ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
  }

  async fn upload(
    state: AppState<SqliteStore>,
    path: &str,
    parts: &[(&str, &str, &str)],
  ) -> (StatusCode, Value) {
    let req = Request::builder()
      .method("POST")
      .uri(path)
      .header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
      )
      .body(Body::from(multipart_body(parts)))
      .unwrap();
    send(state, req).await
  }

  async fn get_json(state: AppState<SqliteStore>, path: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(path).body(Body::empty()).unwrap();
    send(state, req).await
  }

  async fn send(
    state: AppState<SqliteStore>,
    req: Request<Body>,
  ) -> (StatusCode, Value) {
    let resp = api_router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let json = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
  }

  const AB: &str = "<http://ex/a> <http://ex/p> <http://ex/b> .\n";
  const CD: &str = "<http://ex/c> <http://ex/p> <http://ex/d> .\n";

  /// add ab; remove ab; add ab + cd
  async fn scenario(state: &AppState<SqliteStore>) {
    let (s, _) = upload(state.clone(), "/import/add", &[("file", "v0.nt", AB)]).await;
    assert_eq!(s, StatusCode::OK);
    let (s, _) =
      upload(state.clone(), "/import/remove", &[("file", "v1.nt", AB)]).await;
    assert_eq!(s, StatusCode::OK);
    let (s, body) = upload(state.clone(), "/import/add", &[
      ("file", "ab.nt", AB),
      ("file", "cd.nt", CD),
    ])
    .await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(body["version"], 2);
    assert_eq!(body["summary"], "add: [(ab.nt),(cd.nt)]");
  }

  // ── Imports ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn import_add_returns_commit() {
    let state = make_state().await;
    let (status, body) =
      upload(state, "/import/add", &[("file", "data.nq", AB)]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 0);
    assert_eq!(body["kind"], "add");
  }

  #[tokio::test]
  async fn empty_uploads_are_skipped() {
    let state = make_state().await;
    let (status, body) = upload(state, "/import/add", &[
      ("file", "empty.nq", ""),
      ("file", "data.nq", AB),
    ])
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "add: [(data.nq)]");
  }

  #[tokio::test]
  async fn syntax_error_allocates_no_version() {
    let state = make_state().await;
    let (status, body) = upload(state.clone(), "/import/add", &[
      ("file", "good.nt", AB),
      ("file", "bad.nt", "<http://ex/a> <http://ex/p> .\n"),
    ])
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());

    let (_, commits) = get_json(state, "/commits").await;
    assert_eq!(commits.as_array().map(Vec::len), Some(0));
  }

  #[tokio::test]
  async fn remove_add_uses_field_names_as_tags() {
    let state = make_state().await;
    upload(state.clone(), "/import/add", &[("file", "base.nt", AB)]).await;

    let (status, body) = upload(state.clone(), "/import/remove-add", &[
      ("add", "new.nt", CD),
      ("remove", "old.nt", AB),
    ])
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "mixed");
    assert_eq!(body["summary"], "remove-add: [(old.nt),(new.nt)]");

    let (status, rows) = get_json(state, "/query/validity/01").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows[0]["subject"], "<http://ex/c>");
  }

  #[tokio::test]
  async fn remove_add_rejects_untagged_upload() {
    let state = make_state().await;
    let (status, _) = upload(state.clone(), "/import/remove-add", &[(
      "changes",
      "changes.nt",
      AB,
    )])
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, commits) = get_json(state, "/commits").await;
    assert_eq!(commits.as_array().map(Vec::len), Some(0));
  }

  #[tokio::test]
  async fn upload_without_file_name_is_rejected() {
    let state = make_state().await;
    let body = format!(
      "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"add\"\r\n\r\n\
       {AB}\r\n--{BOUNDARY}--\r\n"
    );
    let req = Request::builder()
      .method("POST")
      .uri("/import/add")
      .header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
      )
      .body(Body::from(body))
      .unwrap();
    let (status, body) = send(state.clone(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("no file name"), "{message}");

    let (_, commits) = get_json(state, "/commits").await;
    assert_eq!(commits.as_array().map(Vec::len), Some(0));
  }

  // ── Queries ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn validity_pattern_query() {
    let state = make_state().await;
    scenario(&state).await;

    let (status, rows) = get_json(state.clone(), "/query/validity/101").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows.as_array().map(Vec::len), Some(1));
    assert_eq!(rows[0]["subject"], "<http://ex/a>");
    assert_eq!(rows[0]["graph"], "default");
    assert_eq!(rows[0]["validity"], "101");

    let (status, _) = get_json(state.clone(), "/query/validity/111").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get_json(state.clone(), "/query/validity/10").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = get_json(state, "/query/validity/1x1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn version_query() {
    let state = make_state().await;
    scenario(&state).await;

    let (status, rows) = get_json(state.clone(), "/query/version/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows.as_array().map(Vec::len), Some(2));

    let (status, _) = get_json(state.clone(), "/query/version/1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get_json(state.clone(), "/query/version/3").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = get_json(state, "/query/version/-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn structured_query_over_current_view() {
    let state = make_state().await;
    scenario(&state).await;

    let query = |text: &'static str| {
      Request::builder()
        .method("POST")
        .uri("/query/sparql")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(text))
        .unwrap()
    };

    let (status, rows) = send(
      state.clone(),
      query("SELECT * WHERE { ?s <http://ex/p> <http://ex/d> }"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows[0]["subject"], "<http://ex/c>");
    assert_eq!(rows[0]["validity"], "001");

    let (status, _) =
      send(state.clone(), query("?s <http://ex/nope> ?o")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(state, query("{ ?s ?p }")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  // ── Commit log ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn commits_listed_in_order() {
    let state = make_state().await;
    scenario(&state).await;

    let (status, commits) = get_json(state, "/commits").await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<&str> = commits
      .as_array()
      .unwrap()
      .iter()
      .map(|c| c["kind"].as_str().unwrap())
      .collect();
    assert_eq!(kinds, ["add", "remove", "add"]);
    assert_eq!(commits[1]["summary"], "remove: [(v1.nt)]");
  }
}
