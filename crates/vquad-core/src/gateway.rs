//! Read-only query contracts over a [`VersionedStore`].
//!
//! Validation failures ([`Error::InvalidPattern`], [`Error::InvalidVersion`],
//! [`Error::InvalidQuery`]) are distinct from an empty result, which is
//! reported as [`Error::NotFound`].

use std::sync::Arc;

use crate::{
  Error, Result,
  pattern::QueryTranslator,
  quad::AnnotatedQuad,
  store::VersionedStore,
  validity::Validity,
};

pub struct QueryGateway<S> {
  store:      Arc<S>,
  translator: Arc<dyn QueryTranslator>,
}

impl<S> Clone for QueryGateway<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), translator: self.translator.clone() }
  }
}

fn store_err<E>(e: E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  Error::Store(Box::new(e))
}

fn non_empty(quads: Vec<AnnotatedQuad>) -> Result<Vec<AnnotatedQuad>> {
  if quads.is_empty() { Err(Error::NotFound) } else { Ok(quads) }
}

impl<S: VersionedStore> QueryGateway<S> {
  pub fn new(store: Arc<S>, translator: Arc<dyn QueryTranslator>) -> Self {
    Self { store, translator }
  }

  /// Rows whose full history equals `pattern` exactly.
  ///
  /// The pattern must be made of `0`/`1` only and be exactly as long as the
  /// store width at the time of the read.
  pub async fn query_by_validity_pattern(
    &self,
    pattern: &str,
  ) -> Result<Vec<AnnotatedQuad>> {
    let validity: Validity = pattern.parse()?;
    let len = validity.len() as u64;
    let view = self
      .store
      .quads_with_validity(validity)
      .await
      .map_err(store_err)?;

    if len != view.width {
      return Err(Error::InvalidPattern(format!(
        "pattern has {len} bits, store has {} versions",
        view.width
      )));
    }
    non_empty(view.quads)
  }

  /// Rows valid at `version`, which must lie in `0..width`.
  pub async fn query_by_version(
    &self,
    version: i64,
  ) -> Result<Vec<AnnotatedQuad>> {
    let Ok(index) = u64::try_from(version) else {
      let width = self.store.width().await.map_err(store_err)?;
      return Err(Error::InvalidVersion { version, width });
    };
    let view = self.store.quads_valid_at(index).await.map_err(store_err)?;

    if index >= view.width {
      return Err(Error::InvalidVersion { version, width: view.width });
    }
    non_empty(view.quads)
  }

  /// Evaluate `query` with the configured translator against the current
  /// view (the rows valid at version `width - 1`).
  pub async fn query_structured(
    &self,
    query: &str,
  ) -> Result<Vec<AnnotatedQuad>> {
    let view = self.store.current_view().await.map_err(store_err)?;
    let matched = self.translator.evaluate(query, &view.quads)?;
    non_empty(matched)
  }
}
