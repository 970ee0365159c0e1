//! Handlers for `/import/*` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/import/add` | Multipart; every upload is added |
//! | `POST` | `/import/remove` | Multipart; every upload is removed |
//! | `POST` | `/import/remove-add` | Multipart; field name `add` or `remove` tags each upload |
//!
//! Every upload must carry a file name; its extension selects the RDF syntax.
//! Each request produces exactly one commit and responds with its record.
//! Uploads are parsed in full before the store is touched, so a syntax error
//! anywhere in the batch allocates no version.

use axum::{
  Json,
  extract::{Multipart, State},
};
use tracing::debug;
use vquad_core::{
  commit::Commit,
  import::{ImportAction, ImportSource},
  quad::Operation,
  store::VersionedStore,
};

use crate::{AppState, error::ApiError};

/// Drain `multipart` into parsed, tagged sources. Empty uploads are skipped.
async fn read_sources(
  action: ImportAction,
  mut multipart: Multipart,
) -> Result<Vec<ImportSource>, ApiError> {
  let mut sources = Vec::new();

  while let Some(field) = multipart.next_field().await? {
    let field_name = field.name().unwrap_or_default().to_owned();
    let file_name = field.file_name().map(str::to_owned);
    let bytes = field.bytes().await?;

    if bytes.is_empty() {
      debug!(field = %field_name, "skipping empty upload");
      continue;
    }
    // The extension selects the RDF syntax.
    let Some(name) = file_name else {
      return Err(ApiError::BadRequest(format!(
        "upload in field {field_name:?} has no file name"
      )));
    };

    let operation = match action {
      ImportAction::Add => Operation::Add,
      ImportAction::Remove => Operation::Remove,
      ImportAction::RemoveAdd => field_name.parse()?,
    };
    let dataset = vquad_rdf::parse(&bytes, &name)?;
    sources.push(ImportSource { name, operation, dataset });
  }

  Ok(sources)
}

async fn run<S: VersionedStore>(
  state: AppState<S>,
  action: ImportAction,
  multipart: Multipart,
) -> Result<Json<Commit>, ApiError> {
  let sources = read_sources(action, multipart).await?;
  let commit = state.pipeline.import(action, sources).await?;
  Ok(Json(commit))
}

/// `POST /import/add`
pub async fn add<S: VersionedStore>(
  State(state): State<AppState<S>>,
  multipart: Multipart,
) -> Result<Json<Commit>, ApiError> {
  run(state, ImportAction::Add, multipart).await
}

/// `POST /import/remove`
pub async fn remove<S: VersionedStore>(
  State(state): State<AppState<S>>,
  multipart: Multipart,
) -> Result<Json<Commit>, ApiError> {
  run(state, ImportAction::Remove, multipart).await
}

/// `POST /import/remove-add`
pub async fn remove_add<S: VersionedStore>(
  State(state): State<AppState<S>>,
  multipart: Multipart,
) -> Result<Json<Commit>, ApiError> {
  run(state, ImportAction::RemoveAdd, multipart).await
}
