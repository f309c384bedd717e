//! [`HierarchyStore`]: create/read/update/delete for the three entity kinds
//! with parent and slug checks.
//!
//! Every check runs before the write it guards. Nothing here is wrapped in
//! a transaction: a parent deleted between the existence check and the
//! insert can still leave an orphan, which the cascade model accepts.

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
  Entity, Error, Result,
  article::{Article, ArticlePatch, ArticleStatus, ArticleWithParents, NewArticle},
  cascade::CascadeDeleter,
  category::{CategoryPatch, MainCategory, NewCategory},
  search,
  slug::{SlugRegistry, SlugScope},
  store::{ArticleOrder, ArticleQuery, CatalogStore, Purged, StoreResultExt as _},
  subcategory::{NewSubCategory, SubCategory, SubCategoryPatch},
};

/// Filters for the admin article listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleFilter {
  pub subcategory_id: Option<Uuid>,
  pub status:         Option<ArticleStatus>,
  /// Substring over title and content; drafts included, no result cap.
  pub search:         Option<String>,
}

pub struct HierarchyStore<S> {
  store:   Arc<S>,
  slugs:   SlugRegistry<S>,
  cascade: CascadeDeleter<S>,
}

impl<S> Clone for HierarchyStore<S> {
  fn clone(&self) -> Self {
    Self {
      store:   self.store.clone(),
      slugs:   self.slugs.clone(),
      cascade: self.cascade.clone(),
    }
  }
}

impl<S: CatalogStore> HierarchyStore<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self {
      slugs: SlugRegistry::new(store.clone()),
      cascade: CascadeDeleter::new(store.clone()),
      store,
    }
  }

  // ── Categories ────────────────────────────────────────────────────────────

  pub async fn create_category(&self, input: NewCategory) -> Result<MainCategory> {
    input.validate()?;
    self.slugs.reserve(SlugScope::Categories, &input.slug, None).await?;

    let category = input.into_category(Utc::now());
    self.store.insert_category(category.clone()).await.lift()?;
    info!(id = %category.id, slug = %category.slug, "created category");
    Ok(category)
  }

  pub async fn category(&self, id: Uuid) -> Result<MainCategory> {
    self
      .store
      .get_category(id)
      .await
      .lift()?
      .ok_or_else(|| Error::not_found(Entity::Category, id))
  }

  pub async fn categories(&self) -> Result<Vec<MainCategory>> {
    self.store.list_categories().await.lift()
  }

  pub async fn update_category(
    &self,
    id: Uuid,
    patch: CategoryPatch,
  ) -> Result<MainCategory> {
    let current = self.category(id).await?;
    if patch.is_empty() {
      return Ok(current);
    }

    let mut next = current.clone();
    next.apply(patch, Utc::now())?;
    if next.slug != current.slug {
      self.slugs.reserve(SlugScope::Categories, &next.slug, Some(id)).await?;
    }

    if !self.store.update_category(next.clone()).await.lift()? {
      return Err(Error::not_found(Entity::Category, id));
    }
    info!(%id, slug = %next.slug, "updated category");
    Ok(next)
  }

  /// Delete a category and its whole subtree.
  pub async fn delete_category(&self, id: Uuid) -> Result<Purged> {
    self.cascade.delete_category(id).await
  }

  // ── Subcategories ─────────────────────────────────────────────────────────

  pub async fn create_subcategory(&self, input: NewSubCategory) -> Result<SubCategory> {
    input.validate()?;
    self.require_category(input.main_category_id).await?;
    self
      .slugs
      .reserve(SlugScope::Subcategories(input.main_category_id), &input.slug, None)
      .await?;

    let subcategory = input.into_subcategory(Utc::now());
    self.store.insert_subcategory(subcategory.clone()).await.lift()?;
    info!(
      id = %subcategory.id,
      category = %subcategory.main_category_id,
      slug = %subcategory.slug,
      "created subcategory"
    );
    Ok(subcategory)
  }

  pub async fn subcategory(&self, id: Uuid) -> Result<SubCategory> {
    self
      .store
      .get_subcategory(id)
      .await
      .lift()?
      .ok_or_else(|| Error::not_found(Entity::Subcategory, id))
  }

  pub async fn subcategories(
    &self,
    main_category_id: Option<Uuid>,
  ) -> Result<Vec<SubCategory>> {
    self.store.list_subcategories(main_category_id).await.lift()
  }

  pub async fn update_subcategory(
    &self,
    id: Uuid,
    patch: SubCategoryPatch,
  ) -> Result<SubCategory> {
    let current = self.subcategory(id).await?;
    if patch.is_empty() {
      return Ok(current);
    }

    let mut next = current.clone();
    next.apply(patch, Utc::now())?;
    let reparented = next.main_category_id != current.main_category_id;
    if reparented {
      self.require_category(next.main_category_id).await?;
    }
    if reparented || next.slug != current.slug {
      self
        .slugs
        .reserve(SlugScope::Subcategories(next.main_category_id), &next.slug, Some(id))
        .await?;
    }

    if !self.store.update_subcategory(next.clone()).await.lift()? {
      return Err(Error::not_found(Entity::Subcategory, id));
    }
    info!(%id, category = %next.main_category_id, slug = %next.slug, "updated subcategory");
    Ok(next)
  }

  /// Delete a subcategory and its articles.
  pub async fn delete_subcategory(&self, id: Uuid) -> Result<Purged> {
    self.cascade.delete_subcategory(id).await
  }

  // ── Articles ──────────────────────────────────────────────────────────────

  pub async fn create_article(&self, input: NewArticle) -> Result<Article> {
    input.validate()?;
    self.require_subcategory(input.subcategory_id).await?;
    self
      .slugs
      .reserve(SlugScope::Articles(input.subcategory_id), &input.slug, None)
      .await?;

    let article = input.into_article(Utc::now());
    self.store.insert_article(article.clone()).await.lift()?;
    info!(
      id = %article.id,
      subcategory = %article.subcategory_id,
      slug = %article.slug,
      status = %article.status,
      "created article"
    );
    Ok(article)
  }

  pub async fn article(&self, id: Uuid) -> Result<Article> {
    self
      .store
      .get_article(id)
      .await
      .lift()?
      .ok_or_else(|| Error::not_found(Entity::Article, id))
  }

  /// A single article with its parents' names resolved.
  pub async fn article_with_parents(&self, id: Uuid) -> Result<ArticleWithParents> {
    let article = self.article(id).await?;
    let subcategory = self.store.get_subcategory(article.subcategory_id).await.lift()?;
    let category = match &subcategory {
      Some(s) => self.store.get_category(s.main_category_id).await.lift()?,
      None => None,
    };
    Ok(ArticleWithParents {
      article,
      subcategory_name: subcategory.map(|s| s.name),
      main_category_id: category.as_ref().map(|c| c.id),
      main_category_name: category.map(|c| c.name),
    })
  }

  /// The admin article listing: every status, `order` ascending then newest
  /// first, parents resolved from one read of each parent table.
  pub async fn articles(&self, filter: ArticleFilter) -> Result<Vec<ArticleWithParents>> {
    let query = ArticleQuery {
      subcategory_ids: filter.subcategory_id.map(|id| vec![id]),
      status: filter.status,
      text: filter.search.as_deref().and_then(search::admin_text_filter),
      order: ArticleOrder::Display,
      ..Default::default()
    };
    let articles = self.store.list_articles(&query).await.lift()?;
    if articles.is_empty() {
      return Ok(Vec::new());
    }

    let subcategories: HashMap<Uuid, SubCategory> = self
      .store
      .list_subcategories(None)
      .await
      .lift()?
      .into_iter()
      .map(|s| (s.id, s))
      .collect();
    let categories: HashMap<Uuid, MainCategory> = self
      .store
      .list_categories()
      .await
      .lift()?
      .into_iter()
      .map(|c| (c.id, c))
      .collect();

    Ok(
      articles
        .into_iter()
        .map(|article| {
          let subcategory = subcategories.get(&article.subcategory_id);
          let category =
            subcategory.and_then(|s| categories.get(&s.main_category_id));
          ArticleWithParents {
            subcategory_name: subcategory.map(|s| s.name.clone()),
            main_category_id: category.map(|c| c.id),
            main_category_name: category.map(|c| c.name.clone()),
            article,
          }
        })
        .collect(),
    )
  }

  pub async fn update_article(&self, id: Uuid, patch: ArticlePatch) -> Result<Article> {
    let current = self.article(id).await?;
    if patch.is_empty() {
      return Ok(current);
    }

    let mut next = current.clone();
    next.apply(patch, Utc::now())?;
    let moved = next.subcategory_id != current.subcategory_id;
    if moved {
      self.require_subcategory(next.subcategory_id).await?;
    }
    if moved || next.slug != current.slug {
      self
        .slugs
        .reserve(SlugScope::Articles(next.subcategory_id), &next.slug, Some(id))
        .await?;
    }

    if !self.store.update_article(next.clone()).await.lift()? {
      return Err(Error::not_found(Entity::Article, id));
    }
    info!(%id, slug = %next.slug, status = %next.status, "updated article");
    Ok(next)
  }

  pub async fn delete_article(&self, id: Uuid) -> Result<()> {
    if !self.store.delete_article(id).await.lift()? {
      return Err(Error::not_found(Entity::Article, id));
    }
    info!(%id, "deleted article");
    Ok(())
  }

  // ── Parent checks ─────────────────────────────────────────────────────────

  async fn require_category(&self, id: Uuid) -> Result<()> {
    match self.store.get_category(id).await.lift()? {
      Some(_) => Ok(()),
      None => Err(Error::InvalidParent { entity: Entity::Category, id }),
    }
  }

  async fn require_subcategory(&self, id: Uuid) -> Result<()> {
    match self.store.get_subcategory(id).await.lift()? {
      Some(_) => Ok(()),
      None => Err(Error::InvalidParent { entity: Entity::Subcategory, id }),
    }
  }
}
