//! `GET /commits`: the commit log in version order.

use axum::{Json, extract::State};
use vquad_core::{commit::Commit, store::VersionedStore};

use crate::{AppState, error::ApiError};

pub async fn list<S: VersionedStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Commit>>, ApiError> {
  let commits = state
    .pipeline
    .store()
    .commits()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(commits))
}
