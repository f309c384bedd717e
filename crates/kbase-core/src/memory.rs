//! An in-process [`CatalogStore`] backed by plain vectors behind a mutex.
//!
//! Rows keep insertion order, which stands in for the storage order a
//! database would return. Slug scopes are enforced on insert and update the
//! same way the SQLite unique indexes enforce them.

use std::{
  cmp::Reverse,
  collections::HashMap,
  sync::{Mutex, MutexGuard, PoisonError},
};

use uuid::Uuid;

use crate::{
  Error,
  admin::{AdminPrincipal, AdminStore},
  article::{Article, ArticleStatus},
  category::MainCategory,
  slug::SlugScope,
  store::{ArticleOrder, ArticleQuery, ArticleTotals, CatalogStore},
  subcategory::SubCategory,
};

#[derive(Debug, Default)]
struct Tables {
  categories:    Vec<MainCategory>,
  subcategories: Vec<SubCategory>,
  articles:      Vec<Article>,
  admins:        Vec<AdminPrincipal>,
}

impl Tables {
  fn slug_taken(&self, scope: SlugScope, slug: &str, except: Option<Uuid>) -> bool {
    let other = |id: Uuid| except != Some(id);
    match scope {
      SlugScope::Categories => self
        .categories
        .iter()
        .any(|c| c.slug == slug && other(c.id)),
      SlugScope::Subcategories(parent) => self
        .subcategories
        .iter()
        .any(|s| s.main_category_id == parent && s.slug == slug && other(s.id)),
      SlugScope::Articles(parent) => self
        .articles
        .iter()
        .any(|a| a.subcategory_id == parent && a.slug == slug && other(a.id)),
    }
  }

  fn claim(&self, scope: SlugScope, slug: &str, except: Option<Uuid>) -> Result<(), Error> {
    if self.slug_taken(scope, slug, except) {
      return Err(Error::SlugConflict { scope, slug: slug.to_owned() });
    }
    Ok(())
  }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
  tables: Mutex<Tables>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn tables(&self) -> MutexGuard<'_, Tables> {
    self.tables.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

fn sorted_by_position<T: Clone>(
  rows: &[T],
  key: impl Fn(&T) -> (i64, chrono::DateTime<chrono::Utc>),
) -> Vec<T> {
  let mut out = rows.to_vec();
  out.sort_by_key(|row| key(row));
  out
}

impl CatalogStore for MemoryStore {
  type Error = Error;

  // ── Categories ────────────────────────────────────────────────────────────

  async fn insert_category(&self, category: MainCategory) -> Result<(), Error> {
    let mut t = self.tables();
    t.claim(SlugScope::Categories, &category.slug, None)?;
    t.categories.push(category);
    Ok(())
  }

  async fn get_category(&self, id: Uuid) -> Result<Option<MainCategory>, Error> {
    Ok(self.tables().categories.iter().find(|c| c.id == id).cloned())
  }

  async fn find_category_by_slug(&self, slug: &str) -> Result<Option<MainCategory>, Error> {
    Ok(self.tables().categories.iter().find(|c| c.slug == slug).cloned())
  }

  async fn list_categories(&self) -> Result<Vec<MainCategory>, Error> {
    Ok(sorted_by_position(&self.tables().categories, |c| (c.order, c.created_at)))
  }

  async fn update_category(&self, category: MainCategory) -> Result<bool, Error> {
    let mut t = self.tables();
    t.claim(SlugScope::Categories, &category.slug, Some(category.id))?;
    match t.categories.iter_mut().find(|c| c.id == category.id) {
      Some(slot) => {
        *slot = category;
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn delete_category(&self, id: Uuid) -> Result<bool, Error> {
    let mut t = self.tables();
    let before = t.categories.len();
    t.categories.retain(|c| c.id != id);
    Ok(t.categories.len() != before)
  }

  async fn count_categories(&self) -> Result<u64, Error> {
    Ok(self.tables().categories.len() as u64)
  }

  // ── Subcategories ─────────────────────────────────────────────────────────

  async fn insert_subcategory(&self, subcategory: SubCategory) -> Result<(), Error> {
    let mut t = self.tables();
    t.claim(
      SlugScope::Subcategories(subcategory.main_category_id),
      &subcategory.slug,
      None,
    )?;
    t.subcategories.push(subcategory);
    Ok(())
  }

  async fn get_subcategory(&self, id: Uuid) -> Result<Option<SubCategory>, Error> {
    Ok(self.tables().subcategories.iter().find(|s| s.id == id).cloned())
  }

  async fn find_subcategories_by_slug(&self, slug: &str) -> Result<Vec<SubCategory>, Error> {
    let mut found: Vec<SubCategory> = self
      .tables()
      .subcategories
      .iter()
      .filter(|s| s.slug == slug)
      .cloned()
      .collect();
    found.sort_by_key(|s| s.created_at);
    Ok(found)
  }

  async fn list_subcategories(
    &self,
    main_category_id: Option<Uuid>,
  ) -> Result<Vec<SubCategory>, Error> {
    let t = self.tables();
    let rows: Vec<SubCategory> = t
      .subcategories
      .iter()
      .filter(|s| main_category_id.is_none_or(|id| s.main_category_id == id))
      .cloned()
      .collect();
    Ok(sorted_by_position(&rows, |s| (s.order, s.created_at)))
  }

  async fn update_subcategory(&self, subcategory: SubCategory) -> Result<bool, Error> {
    let mut t = self.tables();
    t.claim(
      SlugScope::Subcategories(subcategory.main_category_id),
      &subcategory.slug,
      Some(subcategory.id),
    )?;
    match t.subcategories.iter_mut().find(|s| s.id == subcategory.id) {
      Some(slot) => {
        *slot = subcategory;
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn delete_subcategory(&self, id: Uuid) -> Result<bool, Error> {
    let mut t = self.tables();
    let before = t.subcategories.len();
    t.subcategories.retain(|s| s.id != id);
    Ok(t.subcategories.len() != before)
  }

  async fn delete_subcategories_of(&self, main_category_id: Uuid) -> Result<u64, Error> {
    let mut t = self.tables();
    let before = t.subcategories.len();
    t.subcategories.retain(|s| s.main_category_id != main_category_id);
    Ok((before - t.subcategories.len()) as u64)
  }

  async fn count_subcategories(&self, main_category_id: Option<Uuid>) -> Result<u64, Error> {
    Ok(
      self
        .tables()
        .subcategories
        .iter()
        .filter(|s| main_category_id.is_none_or(|id| s.main_category_id == id))
        .count() as u64,
    )
  }

  // ── Articles ──────────────────────────────────────────────────────────────

  async fn insert_article(&self, article: Article) -> Result<(), Error> {
    let mut t = self.tables();
    t.claim(SlugScope::Articles(article.subcategory_id), &article.slug, None)?;
    t.articles.push(article);
    Ok(())
  }

  async fn get_article(&self, id: Uuid) -> Result<Option<Article>, Error> {
    Ok(self.tables().articles.iter().find(|a| a.id == id).cloned())
  }

  async fn list_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>, Error> {
    let t = self.tables();
    let mut rows: Vec<Article> = t.articles.iter().filter(|a| query.matches(a)).cloned().collect();
    drop(t);

    match query.order {
      ArticleOrder::Storage => {}
      ArticleOrder::Oldest => rows.sort_by_key(|a| a.created_at),
      ArticleOrder::Display => {
        // Reversing first makes the stable sort break full ties newest
        // inserted first.
        rows.reverse();
        rows.sort_by_key(|a| (a.order, Reverse(a.created_at)));
      }
    }
    if let Some(limit) = query.limit {
      rows.truncate(limit);
    }
    Ok(rows)
  }

  async fn count_articles(&self, query: &ArticleQuery) -> Result<u64, Error> {
    Ok(self.tables().articles.iter().filter(|a| query.matches(a)).count() as u64)
  }

  async fn article_counts_by_subcategory(
    &self,
    status: Option<ArticleStatus>,
  ) -> Result<HashMap<Uuid, u64>, Error> {
    let mut counts = HashMap::new();
    for article in self.tables().articles.iter() {
      if status.is_none_or(|s| s == article.status) {
        *counts.entry(article.subcategory_id).or_insert(0) += 1;
      }
    }
    Ok(counts)
  }

  async fn article_totals(&self) -> Result<ArticleTotals, Error> {
    let mut totals = ArticleTotals::default();
    for article in self.tables().articles.iter() {
      match article.status {
        ArticleStatus::Published => totals.published += 1,
        ArticleStatus::Draft => totals.draft += 1,
      }
      totals.views += article.views;
    }
    Ok(totals)
  }

  async fn update_article(&self, article: Article) -> Result<bool, Error> {
    let mut t = self.tables();
    t.claim(
      SlugScope::Articles(article.subcategory_id),
      &article.slug,
      Some(article.id),
    )?;
    match t.articles.iter_mut().find(|a| a.id == article.id) {
      Some(slot) => {
        let Article { views, created_at, .. } = *slot;
        *slot = Article { views, created_at, ..article };
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn increment_views(&self, id: Uuid) -> Result<bool, Error> {
    match self.tables().articles.iter_mut().find(|a| a.id == id) {
      Some(article) => {
        article.views += 1;
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn delete_article(&self, id: Uuid) -> Result<bool, Error> {
    let mut t = self.tables();
    let before = t.articles.len();
    t.articles.retain(|a| a.id != id);
    Ok(t.articles.len() != before)
  }

  async fn delete_articles_in(&self, subcategory_ids: &[Uuid]) -> Result<u64, Error> {
    let mut t = self.tables();
    let before = t.articles.len();
    t.articles.retain(|a| !subcategory_ids.contains(&a.subcategory_id));
    Ok((before - t.articles.len()) as u64)
  }

  // ── Slugs ─────────────────────────────────────────────────────────────────

  async fn slug_in_use(
    &self,
    scope: SlugScope,
    slug: &str,
    except: Option<Uuid>,
  ) -> Result<bool, Error> {
    Ok(self.tables().slug_taken(scope, slug, except))
  }
}

impl AdminStore for MemoryStore {
  type Error = Error;

  async fn insert_admin(&self, admin: AdminPrincipal) -> Result<bool, Error> {
    let mut t = self.tables();
    if t.admins.iter().any(|a| a.username == admin.username) {
      return Ok(false);
    }
    t.admins.push(admin);
    Ok(true)
  }

  async fn insert_first_admin(&self, admin: AdminPrincipal) -> Result<bool, Error> {
    let mut t = self.tables();
    if !t.admins.is_empty() {
      return Ok(false);
    }
    t.admins.push(admin);
    Ok(true)
  }

  async fn find_admin(&self, username: &str) -> Result<Option<AdminPrincipal>, Error> {
    Ok(self.tables().admins.iter().find(|a| a.username == username).cloned())
  }

  async fn get_admin(&self, id: Uuid) -> Result<Option<AdminPrincipal>, Error> {
    Ok(self.tables().admins.iter().find(|a| a.id == id).cloned())
  }

  async fn count_admins(&self) -> Result<u64, Error> {
    Ok(self.tables().admins.len() as u64)
  }

  async fn set_admin_password(&self, id: Uuid, password_hash: String) -> Result<bool, Error> {
    match self.tables().admins.iter_mut().find(|a| a.id == id) {
      Some(admin) => {
        admin.password_hash = password_hash;
        Ok(true)
      }
      None => Ok(false),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::*;
  use crate::{
    Catalog, Entity,
    article::NewArticle,
    category::NewCategory,
    hierarchy::ArticleFilter,
    subcategory::NewSubCategory,
  };

  #[tokio::test]
  async fn storage_rejects_duplicate_slugs_in_scope() {
    let store = MemoryStore::new();
    let now = chrono::Utc::now();
    let a = NewCategory::new("A", "same").into_category(now);
    let b = NewCategory::new("B", "same").into_category(now);
    store.insert_category(a).await.unwrap();
    assert!(matches!(
      store.insert_category(b).await,
      Err(Error::SlugConflict { scope: SlugScope::Categories, .. })
    ));
  }

  #[tokio::test]
  async fn first_admin_only_into_an_empty_table() {
    let store = MemoryStore::new();
    assert!(store.insert_first_admin(AdminPrincipal::new("root", "h")).await.unwrap());
    assert!(!store.insert_first_admin(AdminPrincipal::new("other", "h")).await.unwrap());
    assert_eq!(store.count_admins().await.unwrap(), 1);
    assert!(store.find_admin("other").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn update_keeps_views_and_created_at() {
    let store = Arc::new(MemoryStore::new());
    let catalog = Catalog::new(store.clone());
    let guides = catalog
      .hierarchy
      .create_category(NewCategory::new("Guides", "guides"))
      .await
      .unwrap();
    let setup = catalog
      .hierarchy
      .create_subcategory(NewSubCategory::new(guides.id, "Setup", "setup"))
      .await
      .unwrap();
    let article = catalog
      .hierarchy
      .create_article(NewArticle::new(setup.id, "Install", "install"))
      .await
      .unwrap();
    store.increment_views(article.id).await.unwrap();

    let mut stale = article.clone();
    stale.title = "Installing".into();
    stale.views = 0;
    stale.created_at = chrono::Utc::now();
    assert!(store.update_article(stale).await.unwrap());

    let stored = store.get_article(article.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Installing");
    assert_eq!(stored.views, 1);
    assert_eq!(stored.created_at, article.created_at);
  }

  /// Create a category, a subcategory, a draft and a published article,
  /// then walk the public and admin surfaces and the cascade.
  #[tokio::test]
  async fn catalog_walkthrough() {
    let catalog = Catalog::new(Arc::new(MemoryStore::new()));
    let h = &catalog.hierarchy;

    let guides = h.create_category(NewCategory::new("Guides", "guides")).await.unwrap();
    let setup = h
      .create_subcategory(NewSubCategory::new(guides.id, "Setup", "setup"))
      .await
      .unwrap();
    let mut install = NewArticle::new(setup.id, "Install", "install").published();
    install.content = "Run the installer.".into();
    h.create_article(install).await.unwrap();
    h.create_article(NewArticle::new(setup.id, "Upgrade", "upgrade")).await.unwrap();

    let public = catalog.public.categories().await.unwrap();
    assert_eq!(public.len(), 1);
    assert_eq!(public[0].article_count, 1);
    assert_eq!(public[0].subcategories[0].article_count, 1);

    let admin = catalog.counts.categories(h.categories().await.unwrap()).await.unwrap();
    assert_eq!(admin[0].subcategory_count, 1);
    assert_eq!(admin[0].article_count, 2);

    let read = catalog.public.article("install", None).await.unwrap();
    assert_eq!(read.views, 1);
    assert!(matches!(
      catalog.public.article("upgrade", None).await,
      Err(Error::NotFound { entity: Entity::Article, .. })
    ));

    let hits = catalog.public.search("installer").await.unwrap();
    assert_eq!(hits.len(), 1);

    let stats = catalog.counts.stats().await.unwrap();
    assert_eq!(
      (stats.total_articles, stats.published_articles, stats.draft_articles, stats.total_views),
      (2, 1, 1, 1)
    );

    let purged = h.delete_category(guides.id).await.unwrap();
    assert_eq!((purged.subcategories, purged.articles), (1, 2));
    assert!(h.articles(ArticleFilter::default()).await.unwrap().is_empty());
    assert!(h.subcategories(None).await.unwrap().is_empty());
    assert_eq!(catalog.counts.stats().await.unwrap().total_articles, 0);
  }
}
