use std::sync::Arc;

use crate::{
  counts::CountAggregator,
  hierarchy::HierarchyStore,
  public::PublicationFilter,
  store::CatalogStore,
};

/// All catalog components, wired to one shared store.
pub struct Catalog<S> {
  pub hierarchy: HierarchyStore<S>,
  pub counts:    CountAggregator<S>,
  pub public:    PublicationFilter<S>,
}

impl<S> Clone for Catalog<S> {
  fn clone(&self) -> Self {
    Self {
      hierarchy: self.hierarchy.clone(),
      counts:    self.counts.clone(),
      public:    self.public.clone(),
    }
  }
}

impl<S: CatalogStore> Catalog<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self {
      hierarchy: HierarchyStore::new(store.clone()),
      counts:    CountAggregator::new(store.clone()),
      public:    PublicationFilter::new(store),
    }
  }
}
