//! The `CatalogStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `kbase-store-sqlite`
//! and the in-process [`MemoryStore`](crate::MemoryStore)). It exposes plain
//! record operations; parent checks, slug scopes and cascades are enforced
//! by the components in this crate, not by the backend.

use std::{collections::HashMap, future::Future};

use uuid::Uuid;

use crate::{
  article::{Article, ArticleStatus},
  category::MainCategory,
  slug::SlugScope,
  subcategory::SubCategory,
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// An article field covered by a text filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
  Title,
  Content,
  Excerpt,
}

/// Case-insensitive substring match, OR-ed across `fields`.
#[derive(Debug, Clone)]
pub struct TextFilter {
  pub needle: String,
  pub fields: Vec<TextField>,
}

impl TextFilter {
  pub fn matches(&self, article: &Article) -> bool {
    let needle = self.needle.to_lowercase();
    self.fields.iter().any(|field| {
      let haystack = match field {
        TextField::Title => &article.title,
        TextField::Content => &article.content,
        TextField::Excerpt => &article.excerpt,
      };
      haystack.to_lowercase().contains(&needle)
    })
  }
}

/// Result ordering for [`CatalogStore::list_articles`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArticleOrder {
  /// `order` ascending, then newest first.
  #[default]
  Display,
  /// Creation order, oldest first.
  Oldest,
  /// Whatever order the backend stores rows in.
  Storage,
}

/// Parameters for [`CatalogStore::list_articles`] and
/// [`CatalogStore::count_articles`].
#[derive(Debug, Clone, Default)]
pub struct ArticleQuery {
  /// Restrict to these parents. `Some(vec![])` matches nothing.
  pub subcategory_ids: Option<Vec<Uuid>>,
  pub status:          Option<ArticleStatus>,
  pub slug:            Option<String>,
  pub text:            Option<TextFilter>,
  pub order:           ArticleOrder,
  pub limit:           Option<usize>,
}

impl ArticleQuery {
  pub fn matches(&self, article: &Article) -> bool {
    self
      .subcategory_ids
      .as_ref()
      .is_none_or(|ids| ids.contains(&article.subcategory_id))
      && self.status.is_none_or(|s| s == article.status)
      && self.slug.as_ref().is_none_or(|s| *s == article.slug)
      && self.text.as_ref().is_none_or(|t| t.matches(article))
  }
}

/// Totals over every article, read in one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArticleTotals {
  pub published: u64,
  pub draft:     u64,
  pub views:     u64,
}

/// What a cascade removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Purged {
  pub articles:      u64,
  pub subcategories: u64,
  /// Whether the root record itself was still present and got removed.
  pub root:          bool,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a kbase catalog backend.
///
/// Parent references are plain ids; the backend does not enforce them.
/// Slug uniqueness may additionally be enforced by the backend, in which
/// case a racing insert surfaces as [`Error::SlugConflict`](crate::Error).
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CatalogStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;

  // ── Categories ────────────────────────────────────────────────────────

  fn insert_category(
    &self,
    category: MainCategory,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_category(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<MainCategory>, Self::Error>> + Send + '_;

  fn find_category_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<MainCategory>, Self::Error>> + Send + 'a;

  /// All categories, `order` ascending, oldest first on ties.
  fn list_categories(
    &self,
  ) -> impl Future<Output = Result<Vec<MainCategory>, Self::Error>> + Send + '_;

  /// Replace a stored category. Returns `false` if it no longer exists.
  fn update_category(
    &self,
    category: MainCategory,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn delete_category(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn count_categories(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Subcategories ─────────────────────────────────────────────────────

  fn insert_subcategory(
    &self,
    subcategory: SubCategory,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_subcategory(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<SubCategory>, Self::Error>> + Send + '_;

  /// Every subcategory using `slug` in any category, oldest first.
  fn find_subcategories_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Vec<SubCategory>, Self::Error>> + Send + 'a;

  /// Subcategories, optionally of one category, `order` ascending, oldest
  /// first on ties.
  fn list_subcategories(
    &self,
    main_category_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<SubCategory>, Self::Error>> + Send + '_;

  fn update_subcategory(
    &self,
    subcategory: SubCategory,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn delete_subcategory(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete every subcategory of `main_category_id`; returns how many.
  fn delete_subcategories_of(
    &self,
    main_category_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn count_subcategories(
    &self,
    main_category_id: Option<Uuid>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Articles ──────────────────────────────────────────────────────────

  fn insert_article(
    &self,
    article: Article,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_article(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Article>, Self::Error>> + Send + '_;

  fn list_articles<'a>(
    &'a self,
    query: &'a ArticleQuery,
  ) -> impl Future<Output = Result<Vec<Article>, Self::Error>> + Send + 'a;

  /// Count articles matching `query`; `order` and `limit` are ignored.
  fn count_articles<'a>(
    &'a self,
    query: &'a ArticleQuery,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Article count per subcategory id in a single grouped read.
  /// Subcategories without matching articles are absent from the map.
  fn article_counts_by_subcategory(
    &self,
    status: Option<ArticleStatus>,
  ) -> impl Future<Output = Result<HashMap<Uuid, u64>, Self::Error>> + Send + '_;

  fn article_totals(
    &self,
  ) -> impl Future<Output = Result<ArticleTotals, Self::Error>> + Send + '_;

  /// Replace a stored article's editable fields. `views` and `created_at`
  /// are never written here, so concurrent view increments survive.
  fn update_article(
    &self,
    article: Article,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Atomically add one to the view counter. Returns `false` if the article
  /// no longer exists.
  fn increment_views(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn delete_article(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete every article whose parent is in `subcategory_ids`.
  fn delete_articles_in<'a>(
    &'a self,
    subcategory_ids: &'a [Uuid],
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  // ── Slugs ─────────────────────────────────────────────────────────────

  /// Whether any entity other than `except` uses `slug` within `scope`.
  fn slug_in_use<'a>(
    &'a self,
    scope: SlugScope,
    slug: &'a str,
    except: Option<Uuid>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Cascades ──────────────────────────────────────────────────────────

  /// Remove a category with all of its subcategories and their articles,
  /// leaves first.
  ///
  /// The default runs three independent deletes. A subcategory or article
  /// created under the category while this runs may or may not survive,
  /// and a failure partway leaves whatever was not yet deleted in place.
  /// Backends with transactions should override this.
  fn purge_category(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Purged, Self::Error>> + Send + '_ {
    async move {
      let subcategory_ids: Vec<Uuid> = self
        .list_subcategories(Some(id))
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();
      let articles = if subcategory_ids.is_empty() {
        0
      } else {
        self.delete_articles_in(&subcategory_ids).await?
      };
      let subcategories = self.delete_subcategories_of(id).await?;
      let root = self.delete_category(id).await?;
      Ok(Purged { articles, subcategories, root })
    }
  }

  /// Remove a subcategory and its articles, leaves first. Same consistency
  /// caveats as [`purge_category`](Self::purge_category).
  fn purge_subcategory(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Purged, Self::Error>> + Send + '_ {
    async move {
      let articles = self.delete_articles_in(&[id]).await?;
      let root = self.delete_subcategory(id).await?;
      Ok(Purged { articles, subcategories: u64::from(root), root })
    }
  }
}

/// Lift a backend result into the core error type.
pub(crate) trait StoreResultExt<T> {
  fn lift(self) -> crate::Result<T>;
}

impl<T, E: Into<crate::Error>> StoreResultExt<T> for Result<T, E> {
  fn lift(self) -> crate::Result<T> { self.map_err(Into::into) }
}
