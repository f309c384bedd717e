//! Derived counters, computed from the live child sets on every read.

use std::{collections::HashMap, sync::Arc};

use serde::Serialize;
use uuid::Uuid;

use crate::{
  Result,
  article::ArticleStatus,
  category::MainCategory,
  store::{ArticleQuery, CatalogStore, StoreResultExt as _},
  subcategory::SubCategory,
};

#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithCounts {
  #[serde(flatten)]
  pub category:          MainCategory,
  pub subcategory_count: u64,
  pub article_count:     u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubCategoryWithCounts {
  #[serde(flatten)]
  pub subcategory:   SubCategory,
  pub article_count: u64,
}

/// Site-wide totals for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KbStats {
  pub total_categories:    u64,
  pub total_subcategories: u64,
  pub total_articles:      u64,
  pub published_articles:  u64,
  pub draft_articles:      u64,
  pub total_views:         u64,
}

pub struct CountAggregator<S> {
  store: Arc<S>,
}

impl<S> Clone for CountAggregator<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: CatalogStore> CountAggregator<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Counts for one category. The article count is only queried when the
  /// category has subcategories.
  pub async fn category(&self, category: MainCategory) -> Result<CategoryWithCounts> {
    let subcategory_ids: Vec<Uuid> = self
      .store
      .list_subcategories(Some(category.id))
      .await
      .lift()?
      .into_iter()
      .map(|s| s.id)
      .collect();

    let subcategory_count = subcategory_ids.len() as u64;
    let article_count = if subcategory_ids.is_empty() {
      0
    } else {
      let query = ArticleQuery {
        subcategory_ids: Some(subcategory_ids),
        ..Default::default()
      };
      self.store.count_articles(&query).await.lift()?
    };

    Ok(CategoryWithCounts { category, subcategory_count, article_count })
  }

  /// Counts for a list of categories using two grouped reads instead of one
  /// query per child.
  pub async fn categories(
    &self,
    categories: Vec<MainCategory>,
  ) -> Result<Vec<CategoryWithCounts>> {
    if categories.is_empty() {
      return Ok(Vec::new());
    }
    let subcategories = self.store.list_subcategories(None).await.lift()?;
    let per_subcategory = self.store.article_counts_by_subcategory(None).await.lift()?;

    let mut per_category: HashMap<Uuid, (u64, u64)> = HashMap::new();
    for s in &subcategories {
      let entry = per_category.entry(s.main_category_id).or_default();
      entry.0 += 1;
      entry.1 += per_subcategory.get(&s.id).copied().unwrap_or(0);
    }

    Ok(
      categories
        .into_iter()
        .map(|category| {
          let (subcategory_count, article_count) =
            per_category.get(&category.id).copied().unwrap_or_default();
          CategoryWithCounts { category, subcategory_count, article_count }
        })
        .collect(),
    )
  }

  pub async fn subcategory(&self, subcategory: SubCategory) -> Result<SubCategoryWithCounts> {
    let query = ArticleQuery {
      subcategory_ids: Some(vec![subcategory.id]),
      ..Default::default()
    };
    let article_count = self.store.count_articles(&query).await.lift()?;
    Ok(SubCategoryWithCounts { subcategory, article_count })
  }

  pub async fn subcategories(
    &self,
    subcategories: Vec<SubCategory>,
  ) -> Result<Vec<SubCategoryWithCounts>> {
    if subcategories.is_empty() {
      return Ok(Vec::new());
    }
    let per_subcategory = self.store.article_counts_by_subcategory(None).await.lift()?;
    Ok(
      subcategories
        .into_iter()
        .map(|subcategory| SubCategoryWithCounts {
          article_count: per_subcategory.get(&subcategory.id).copied().unwrap_or(0),
          subcategory,
        })
        .collect(),
    )
  }

  /// Published article count per subcategory, for the public surface.
  pub async fn published_per_subcategory(&self) -> Result<HashMap<Uuid, u64>> {
    self
      .store
      .article_counts_by_subcategory(Some(ArticleStatus::Published))
      .await
      .lift()
  }

  pub async fn stats(&self) -> Result<KbStats> {
    let total_categories = self.store.count_categories().await.lift()?;
    let total_subcategories = self.store.count_subcategories(None).await.lift()?;
    let totals = self.store.article_totals().await.lift()?;
    Ok(KbStats {
      total_categories,
      total_subcategories,
      // Derived from the same read so published + draft always adds up.
      total_articles: totals.published + totals.draft,
      published_articles: totals.published,
      draft_articles: totals.draft,
      total_views: totals.views,
    })
  }
}
