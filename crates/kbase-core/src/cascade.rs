//! Subtree removal.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::{
  Entity, Error, Result,
  store::{CatalogStore, Purged, StoreResultExt as _},
};

/// Deletes a category or subcategory together with everything it owns.
///
/// Children go before parents so a concurrent reader never sees an article
/// whose subcategory is already gone. Whether the cascade is atomic depends
/// on the backend's [`CatalogStore::purge_category`]; see its docs.
pub struct CascadeDeleter<S> {
  store: Arc<S>,
}

impl<S> Clone for CascadeDeleter<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: CatalogStore> CascadeDeleter<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub async fn delete_category(&self, id: Uuid) -> Result<Purged> {
    self
      .store
      .get_category(id)
      .await
      .lift()?
      .ok_or_else(|| Error::not_found(Entity::Category, id))?;

    let purged = self.store.purge_category(id).await.lift()?;
    info!(
      category = %id,
      subcategories = purged.subcategories,
      articles = purged.articles,
      "deleted category subtree"
    );
    Ok(purged)
  }

  pub async fn delete_subcategory(&self, id: Uuid) -> Result<Purged> {
    self
      .store
      .get_subcategory(id)
      .await
      .lift()?
      .ok_or_else(|| Error::not_found(Entity::Subcategory, id))?;

    let purged = self.store.purge_subcategory(id).await.lift()?;
    info!(subcategory = %id, articles = purged.articles, "deleted subcategory subtree");
    Ok(purged)
  }
}
