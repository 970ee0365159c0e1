//! Handlers for `/query/*` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/query/validity/{pattern}` | Exact validity match; 400 on bad pattern |
//! | `GET`  | `/query/version/{id}` | Rows valid at `id`; 400 if out of range |
//! | `POST` | `/query/sparql` | Body: quad-pattern query text |
//!
//! All respond with a JSON array of annotated quads, or 404 when nothing
//! matches.

use axum::{
  Json,
  extract::{Path, State},
};
use vquad_core::{quad::AnnotatedQuad, store::VersionedStore};

use crate::{AppState, error::ApiError};

/// `GET /query/validity/{pattern}`
pub async fn by_validity<S: VersionedStore>(
  State(state): State<AppState<S>>,
  Path(pattern): Path<String>,
) -> Result<Json<Vec<AnnotatedQuad>>, ApiError> {
  let quads = state.gateway.query_by_validity_pattern(&pattern).await?;
  Ok(Json(quads))
}

/// `GET /query/version/{id}`
pub async fn by_version<S: VersionedStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Vec<AnnotatedQuad>>, ApiError> {
  let quads = state.gateway.query_by_version(id).await?;
  Ok(Json(quads))
}

/// `POST /query/sparql`
pub async fn structured<S: VersionedStore>(
  State(state): State<AppState<S>>,
  body: String,
) -> Result<Json<Vec<AnnotatedQuad>>, ApiError> {
  let quads = state.gateway.query_structured(&body).await?;
  Ok(Json(quads))
}
