//! The read-only public surface.
//!
//! Only published articles are ever visible here, and only through the view
//! types below, which carry the public-safe subset of each entity. A draft
//! is indistinguishable from an absent article.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
  Entity, Error, Result,
  article::{Article, ArticleStatus},
  category::MainCategory,
  counts::CountAggregator,
  search::{MAX_RESULTS, SearchEngine},
  store::{ArticleOrder, ArticleQuery, CatalogStore, StoreResultExt as _},
  subcategory::SubCategory,
};

// ─── View types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicSubCategory {
  pub id:            Uuid,
  pub name:          String,
  pub slug:          String,
  pub description:   String,
  /// Published articles only.
  pub article_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicCategory {
  pub id:            Uuid,
  pub name:          String,
  pub slug:          String,
  pub description:   String,
  pub icon:          String,
  pub subcategories: Vec<PublicSubCategory>,
  /// Sum of the subcategories' published counts.
  pub article_count: u64,
}

/// Compact reference to a parent, embedded in article views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentRef {
  pub id:   Uuid,
  pub name: String,
  pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicArticleSummary {
  pub id:         Uuid,
  pub title:      String,
  pub slug:       String,
  pub excerpt:    String,
  pub updated_at: DateTime<Utc>,
  pub views:      u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicSubCategoryDetail {
  pub id:          Uuid,
  pub name:        String,
  pub slug:        String,
  pub description: String,
}

/// A subcategory page: the subcategory, its category and its published
/// articles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubCategoryPage {
  pub subcategory:   PublicSubCategoryDetail,
  pub main_category: Option<ParentRef>,
  pub articles:      Vec<PublicArticleSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicArticle {
  pub id:            Uuid,
  pub title:         String,
  pub slug:          String,
  pub excerpt:       String,
  pub content:       String,
  pub tags:          Vec<String>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
  /// Includes the view that produced this response.
  pub views:         u64,
  pub subcategory:   Option<ParentRef>,
  pub main_category: Option<ParentRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
  pub id:                 Uuid,
  pub title:              String,
  pub slug:               String,
  pub excerpt:            String,
  pub subcategory_name:   String,
  pub main_category_name: String,
}

impl From<&MainCategory> for ParentRef {
  fn from(c: &MainCategory) -> Self {
    Self { id: c.id, name: c.name.clone(), slug: c.slug.clone() }
  }
}

impl From<&SubCategory> for ParentRef {
  fn from(s: &SubCategory) -> Self {
    Self { id: s.id, name: s.name.clone(), slug: s.slug.clone() }
  }
}

impl From<Article> for PublicArticleSummary {
  fn from(a: Article) -> Self {
    Self {
      id:         a.id,
      title:      a.title,
      slug:       a.slug,
      excerpt:    a.excerpt,
      updated_at: a.updated_at,
      views:      a.views,
    }
  }
}

// ─── ViewCounter ─────────────────────────────────────────────────────────────

/// Counts public single-article reads.
pub struct ViewCounter<S> {
  store: Arc<S>,
}

impl<S> Clone for ViewCounter<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: CatalogStore> ViewCounter<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Record one view of `article` and return the count including it.
  ///
  /// The increment itself is atomic in the store; the returned value is
  /// `article.views + 1` rather than a second read.
  pub async fn record(&self, article: &Article) -> Result<u64> {
    if !self.store.increment_views(article.id).await.lift()? {
      return Err(Error::not_found(Entity::Article, &article.slug));
    }
    Ok(article.views + 1)
  }
}

// ─── PublicationFilter ───────────────────────────────────────────────────────

pub struct PublicationFilter<S> {
  store:  Arc<S>,
  counts: CountAggregator<S>,
  views:  ViewCounter<S>,
  search: SearchEngine<S>,
}

impl<S> Clone for PublicationFilter<S> {
  fn clone(&self) -> Self {
    Self {
      store:  self.store.clone(),
      counts: self.counts.clone(),
      views:  self.views.clone(),
      search: self.search.clone(),
    }
  }
}

impl<S: CatalogStore> PublicationFilter<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self {
      counts: CountAggregator::new(store.clone()),
      views: ViewCounter::new(store.clone()),
      search: SearchEngine::new(store.clone()),
      store,
    }
  }

  /// Every category with its subcategories and published counts.
  pub async fn categories(&self) -> Result<Vec<PublicCategory>> {
    let categories = self.store.list_categories().await.lift()?;
    let subcategories = self.store.list_subcategories(None).await.lift()?;
    let published = self.counts.published_per_subcategory().await?;

    Ok(
      categories
        .into_iter()
        .map(|category| {
          let subs = subcategories
            .iter()
            .filter(|s| s.main_category_id == category.id)
            .map(|s| public_subcategory(s, published.get(&s.id).copied().unwrap_or(0)))
            .collect();
          public_category(category, subs)
        })
        .collect(),
    )
  }

  pub async fn category(&self, slug: &str) -> Result<PublicCategory> {
    let category = self
      .store
      .find_category_by_slug(slug)
      .await
      .lift()?
      .ok_or_else(|| Error::not_found(Entity::Category, slug))?;
    let subcategories = self.store.list_subcategories(Some(category.id)).await.lift()?;
    let published = self.counts.published_per_subcategory().await?;

    let subs = subcategories
      .iter()
      .map(|s| public_subcategory(s, published.get(&s.id).copied().unwrap_or(0)))
      .collect();
    Ok(public_category(category, subs))
  }

  /// The published articles of the subcategory named by `slug`.
  ///
  /// Subcategory slugs are only unique within a category, so
  /// `main_category_id` narrows the lookup. Without it the oldest matching
  /// subcategory wins.
  pub async fn subcategory_articles(
    &self,
    slug: &str,
    main_category_id: Option<Uuid>,
  ) -> Result<SubCategoryPage> {
    let mut candidates = self.store.find_subcategories_by_slug(slug).await.lift()?;
    if let Some(parent) = main_category_id {
      candidates.retain(|s| s.main_category_id == parent);
    }
    if candidates.len() > 1 {
      warn!(slug, matches = candidates.len(), "ambiguous subcategory slug, using the oldest");
    }
    let subcategory = candidates
      .into_iter()
      .next()
      .ok_or_else(|| Error::not_found(Entity::Subcategory, slug))?;

    let category = self.store.get_category(subcategory.main_category_id).await.lift()?;
    let query = ArticleQuery {
      subcategory_ids: Some(vec![subcategory.id]),
      status: Some(ArticleStatus::Published),
      order: ArticleOrder::Display,
      ..Default::default()
    };
    let articles = self.store.list_articles(&query).await.lift()?;

    Ok(SubCategoryPage {
      main_category: category.as_ref().map(ParentRef::from),
      subcategory: PublicSubCategoryDetail {
        id:          subcategory.id,
        name:        subcategory.name,
        slug:        subcategory.slug,
        description: subcategory.description,
      },
      articles: articles.into_iter().map(PublicArticleSummary::from).collect(),
    })
  }

  /// Fetch one published article by slug and count the view.
  ///
  /// Article slugs are only unique within a subcategory, so
  /// `subcategory_id` narrows the lookup. Without it the oldest published
  /// match wins.
  pub async fn article(&self, slug: &str, subcategory_id: Option<Uuid>) -> Result<PublicArticle> {
    let query = ArticleQuery {
      subcategory_ids: subcategory_id.map(|id| vec![id]),
      status: Some(ArticleStatus::Published),
      slug: Some(slug.to_owned()),
      order: ArticleOrder::Oldest,
      ..Default::default()
    };
    let mut matches = self.store.list_articles(&query).await.lift()?;
    if matches.len() > 1 {
      warn!(slug, matches = matches.len(), "ambiguous article slug, using the oldest");
    }
    if matches.is_empty() {
      return Err(Error::not_found(Entity::Article, slug));
    }
    let article = matches.swap_remove(0);

    let views = self.views.record(&article).await?;
    let (subcategory, category) = self.parents(&article).await?;

    Ok(PublicArticle {
      id: article.id,
      title: article.title,
      slug: article.slug,
      excerpt: article.excerpt,
      content: article.content,
      tags: article.tags,
      created_at: article.created_at,
      updated_at: article.updated_at,
      views,
      subcategory: subcategory.as_ref().map(ParentRef::from),
      main_category: category.as_ref().map(ParentRef::from),
    })
  }

  /// Public search: published only, capped at [`MAX_RESULTS`].
  pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
    let articles = self.search.search(query, MAX_RESULTS).await?;
    let mut hits = Vec::with_capacity(articles.len());
    for article in articles {
      let (subcategory, category) = self.parents(&article).await?;
      hits.push(SearchHit {
        id:                 article.id,
        title:              article.title,
        slug:               article.slug,
        excerpt:            article.excerpt,
        subcategory_name:   subcategory.map(|s| s.name).unwrap_or_default(),
        main_category_name: category.map(|c| c.name).unwrap_or_default(),
      });
    }
    Ok(hits)
  }

  async fn parents(
    &self,
    article: &Article,
  ) -> Result<(Option<SubCategory>, Option<MainCategory>)> {
    let subcategory = self.store.get_subcategory(article.subcategory_id).await.lift()?;
    let category = match &subcategory {
      Some(s) => self.store.get_category(s.main_category_id).await.lift()?,
      None => None,
    };
    Ok((subcategory, category))
  }
}

fn public_subcategory(s: &SubCategory, article_count: u64) -> PublicSubCategory {
  PublicSubCategory {
    id: s.id,
    name: s.name.clone(),
    slug: s.slug.clone(),
    description: s.description.clone(),
    article_count,
  }
}

fn public_category(c: MainCategory, subcategories: Vec<PublicSubCategory>) -> PublicCategory {
  PublicCategory {
    article_count: subcategories.iter().map(|s| s.article_count).sum(),
    id: c.id,
    name: c.name,
    slug: c.slug,
    description: c.description,
    icon: c.icon,
    subcategories,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    MemoryStore,
    article::{ArticlePatch, NewArticle},
    category::NewCategory,
    hierarchy::HierarchyStore,
    patch::Patch,
    subcategory::NewSubCategory,
  };

  struct Fixture {
    hierarchy: HierarchyStore<MemoryStore>,
    public:    PublicationFilter<MemoryStore>,
    category:  MainCategory,
    sub:       SubCategory,
  }

  async fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::default());
    let hierarchy = HierarchyStore::new(store.clone());
    let category = hierarchy
      .create_category(NewCategory::new("Guides", "guides"))
      .await
      .unwrap();
    let sub = hierarchy
      .create_subcategory(NewSubCategory::new(category.id, "Setup", "setup"))
      .await
      .unwrap();
    Fixture { hierarchy, public: PublicationFilter::new(store), category, sub }
  }

  #[tokio::test]
  async fn drafts_are_invisible_everywhere() {
    let f = fixture().await;
    let mut draft = NewArticle::new(f.sub.id, "Secret install", "install");
    draft.content = "secret install steps".into();
    f.hierarchy.create_article(draft).await.unwrap();

    assert!(matches!(
      f.public.article("install", None).await,
      Err(Error::NotFound { entity: Entity::Article, .. })
    ));
    assert!(f.public.search("install").await.unwrap().is_empty());
    let page = f.public.subcategory_articles("setup", None).await.unwrap();
    assert!(page.articles.is_empty());
    let categories = f.public.categories().await.unwrap();
    assert_eq!(categories[0].article_count, 0);
    assert_eq!(categories[0].subcategories[0].article_count, 0);
  }

  #[tokio::test]
  async fn each_fetch_counts_exactly_one_view() {
    let f = fixture().await;
    f.hierarchy
      .create_article(NewArticle::new(f.sub.id, "Install", "install").published())
      .await
      .unwrap();

    let first = f.public.article("install", None).await.unwrap();
    let second = f.public.article("install", None).await.unwrap();
    assert_eq!(first.views, 1);
    assert_eq!(second.views, 2);
    assert_eq!(second.subcategory.unwrap().slug, "setup");
    assert_eq!(second.main_category.unwrap().id, f.category.id);
  }

  #[tokio::test]
  async fn concurrent_fetches_lose_no_increments() {
    let f = fixture().await;
    let article = f
      .hierarchy
      .create_article(NewArticle::new(f.sub.id, "Install", "install").published())
      .await
      .unwrap();

    let tasks: Vec<_> = (0..32)
      .map(|_| {
        let public = f.public.clone();
        tokio::spawn(async move { public.article("install", None).await.map(|_| ()) })
      })
      .collect();
    for task in tasks {
      task.await.unwrap().unwrap();
    }
    assert_eq!(f.hierarchy.article(article.id).await.unwrap().views, 32);
  }

  #[tokio::test]
  async fn admin_updates_do_not_reset_views() {
    let f = fixture().await;
    let article = f
      .hierarchy
      .create_article(NewArticle::new(f.sub.id, "Install", "install").published())
      .await
      .unwrap();
    f.public.article("install", None).await.unwrap();

    let updated = f
      .hierarchy
      .update_article(article.id, ArticlePatch {
        title: Patch::Set("Installing".into()),
        ..Default::default()
      })
      .await
      .unwrap();
    assert_eq!(updated.title, "Installing");
    assert_eq!(f.hierarchy.article(article.id).await.unwrap().views, 1);
  }

  #[tokio::test]
  async fn duplicate_article_slugs_are_disambiguated_by_subcategory() {
    let f = fixture().await;
    let other = f
      .hierarchy
      .create_subcategory(NewSubCategory::new(f.category.id, "Other", "other"))
      .await
      .unwrap();
    let first = f
      .hierarchy
      .create_article(NewArticle::new(f.sub.id, "Install A", "install").published())
      .await
      .unwrap();
    let second = f
      .hierarchy
      .create_article(NewArticle::new(other.id, "Install B", "install").published())
      .await
      .unwrap();

    assert_eq!(f.public.article("install", None).await.unwrap().id, first.id);
    assert_eq!(f.public.article("install", Some(other.id)).await.unwrap().id, second.id);
  }

  #[tokio::test]
  async fn categories_carry_published_counts() {
    let f = fixture().await;
    f.hierarchy
      .create_article(NewArticle::new(f.sub.id, "A", "a").published())
      .await
      .unwrap();
    f.hierarchy
      .create_article(NewArticle::new(f.sub.id, "B", "b").published())
      .await
      .unwrap();
    f.hierarchy.create_article(NewArticle::new(f.sub.id, "C", "c")).await.unwrap();

    let category = f.public.category("guides").await.unwrap();
    assert_eq!(category.article_count, 2);
    assert_eq!(category.subcategories[0].article_count, 2);

    let page = f.public.subcategory_articles("setup", Some(f.category.id)).await.unwrap();
    assert_eq!(page.articles.len(), 2);
    assert_eq!(page.main_category.unwrap().slug, "guides");

    assert!(matches!(
      f.public.subcategory_articles("setup", Some(Uuid::new_v4())).await,
      Err(Error::NotFound { .. })
    ));
    assert!(matches!(f.public.category("nope").await, Err(Error::NotFound { .. })));
  }

  #[tokio::test]
  async fn search_hits_name_their_parents() {
    let f = fixture().await;
    f.hierarchy
      .create_article(NewArticle::new(f.sub.id, "Install", "install").published())
      .await
      .unwrap();
    let hits = f.public.search("inst").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].subcategory_name, "Setup");
    assert_eq!(hits[0].main_category_name, "Guides");
  }
}
