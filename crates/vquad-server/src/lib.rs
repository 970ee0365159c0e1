//! vquad server assembly: configuration, store opening and the HTTP app.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Router, extract::DefaultBodyLimit};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use vquad_api::AppState;
use vquad_core::{pattern::QuadPatternTranslator, store::VersionedStore};
use vquad_store_sqlite::SqliteStore;

/// Store path that selects an in-memory database.
pub const IN_MEMORY: &str = ":memory:";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `VQUAD_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  pub store_path:       PathBuf,
  pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             "127.0.0.1".to_string(),
      port:             8080,
      store_path:       PathBuf::from("vquad.sqlite3"),
      max_upload_bytes: 64 * 1024 * 1024,
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Store ────────────────────────────────────────────────────────────────────

/// Open the configured store, wiping it first when `reset` is set.
pub async fn open_store(
  path: &Path,
  reset: bool,
) -> vquad_store_sqlite::Result<SqliteStore> {
  let store = if path == Path::new(IN_MEMORY) {
    SqliteStore::open_in_memory().await?
  } else {
    SqliteStore::open(expand_tilde(path)).await?
  };
  if reset {
    store.reset().await?;
  }
  Ok(store)
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// The API router with request tracing and the upload size limit applied.
pub fn app<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: VersionedStore + 'static,
{
  let state = AppState::new(store, Arc::new(QuadPatternTranslator));
  vquad_api::api_router(state)
    .layer(DefaultBodyLimit::max(config.max_upload_bytes))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use tower::ServiceExt as _;

  use super::*;

  #[test]
  fn defaults_fill_missing_keys() {
    let cfg: ServerConfig = config::Config::builder()
      .set_override("port", 9000)
      .unwrap()
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.store_path, PathBuf::from("vquad.sqlite3"));
    assert_eq!(cfg.max_upload_bytes, 64 * 1024 * 1024);
    assert_eq!(cfg.address(), "127.0.0.1:9000");
  }

  #[test]
  fn tilde_is_expanded() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/db.sqlite3")),
      PathBuf::from(home).join("db.sqlite3")
    );
    assert_eq!(
      expand_tilde(Path::new("/tmp/db.sqlite3")),
      PathBuf::from("/tmp/db.sqlite3")
    );
  }

  #[tokio::test]
  async fn app_serves_commit_log() {
    let store = open_store(Path::new(IN_MEMORY), true).await.unwrap();
    let app = app(Arc::new(store), &ServerConfig::default());

    let req = Request::builder().uri("/commits").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn oversized_upload_is_rejected() {
    let store = open_store(Path::new(IN_MEMORY), false).await.unwrap();
    let config = ServerConfig { max_upload_bytes: 16, ..Default::default() };
    let app = app(Arc::new(store), &config);

    let body = format!(
      "--b\r\nContent-Disposition: form-data; name=\"file\"; \
       filename=\"a.nt\"\r\n\r\n{}\r\n--b--\r\n",
      "<http://ex/a> <http://ex/p> <http://ex/b> ."
    );
    let req = Request::builder()
      .method("POST")
      .uri("/import/add")
      .header("content-type", "multipart/form-data; boundary=b")
      .body(Body::from(body))
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert!(resp.status().is_client_error());
  }
}
