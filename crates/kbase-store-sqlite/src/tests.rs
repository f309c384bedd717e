//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use chrono::Utc;
use kbase_core::{
  Catalog, HierarchyStore,
  admin::{AdminPrincipal, AdminStore},
  article::{ArticlePatch, ArticleStatus, NewArticle},
  category::{MainCategory, NewCategory},
  hierarchy::ArticleFilter,
  patch::Patch,
  slug::SlugScope,
  store::{ArticleOrder, ArticleQuery, CatalogStore, TextField, TextFilter},
  subcategory::{NewSubCategory, SubCategory},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> Arc<SqliteStore> {
  Arc::new(SqliteStore::open_in_memory().await.expect("in-memory store"))
}

async fn seeded(
  s: &Arc<SqliteStore>,
) -> (HierarchyStore<SqliteStore>, MainCategory, SubCategory) {
  let h = HierarchyStore::new(s.clone());
  let category = h.create_category(NewCategory::new("Guides", "guides")).await.unwrap();
  let sub = h
    .create_subcategory(NewSubCategory::new(category.id, "Setup", "setup"))
    .await
    .unwrap();
  (h, category, sub)
}

// ─── Categories ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn category_roundtrip() {
  let s = store().await;
  let h = HierarchyStore::new(s.clone());

  let mut input = NewCategory::new("Guides", "guides");
  input.description = "How-tos".into();
  input.order = 3;
  let created = h.create_category(input).await.unwrap();

  let fetched = s.get_category(created.id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
  let by_slug = s.find_category_by_slug("guides").await.unwrap().unwrap();
  assert_eq!(by_slug.id, created.id);
  assert!(s.get_category(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn categories_list_by_order_then_age() {
  let s = store().await;
  let h = HierarchyStore::new(s.clone());
  let mut late = NewCategory::new("Late", "late");
  late.order = 2;
  h.create_category(late).await.unwrap();
  h.create_category(NewCategory::new("First", "first")).await.unwrap();
  h.create_category(NewCategory::new("Second", "second")).await.unwrap();

  let slugs: Vec<_> = s
    .list_categories()
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.slug)
    .collect();
  assert_eq!(slugs, ["first", "second", "late"]);
}

#[tokio::test]
async fn unique_index_surfaces_as_slug_conflict() {
  let s = store().await;
  let now = Utc::now();
  let category = |slug: &str| MainCategory {
    id:          Uuid::new_v4(),
    name:        "Guides".into(),
    slug:        slug.into(),
    description: String::new(),
    icon:        "Folder".into(),
    order:       0,
    created_at:  now,
    updated_at:  now,
  };

  s.insert_category(category("guides")).await.unwrap();
  let err = s.insert_category(category("guides")).await.unwrap_err();
  assert!(matches!(
    err,
    crate::Error::SlugConflict { scope: SlugScope::Categories, ref slug } if slug == "guides"
  ));
  assert!(matches!(
    kbase_core::Error::from(err),
    kbase_core::Error::SlugConflict { .. }
  ));
}

// ─── Subcategories ───────────────────────────────────────────────────────────

#[tokio::test]
async fn subcategory_slugs_are_scoped_to_their_category() {
  let s = store().await;
  let (h, guides, _) = seeded(&s).await;
  let other = h.create_category(NewCategory::new("Other", "other")).await.unwrap();

  h.create_subcategory(NewSubCategory::new(other.id, "Setup", "setup"))
    .await
    .unwrap();
  let err = h
    .create_subcategory(NewSubCategory::new(guides.id, "Setup again", "setup"))
    .await
    .unwrap_err();
  assert!(matches!(err, kbase_core::Error::SlugConflict { .. }));

  let found = s.find_subcategories_by_slug("setup").await.unwrap();
  assert_eq!(found.len(), 2);
  assert_eq!(found[0].main_category_id, guides.id);
  assert_eq!(s.count_subcategories(Some(other.id)).await.unwrap(), 1);
  assert_eq!(s.count_subcategories(None).await.unwrap(), 2);
}

// ─── Articles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn article_roundtrip_keeps_tags_and_status() {
  let s = store().await;
  let (h, _, sub) = seeded(&s).await;

  let mut input = NewArticle::new(sub.id, "Install", "install").published();
  input.tags = vec!["setup".into(), "linux".into()];
  input.featured = true;
  let created = h.create_article(input).await.unwrap();

  let fetched = s.get_article(created.id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
  assert_eq!(fetched.status, ArticleStatus::Published);
  assert_eq!(fetched.tags, ["setup", "linux"]);
}

#[tokio::test]
async fn display_order_breaks_ties_newest_first() {
  let s = store().await;
  let (h, _, sub) = seeded(&s).await;
  for slug in ["first", "second", "third"] {
    h.create_article(NewArticle::new(sub.id, slug, slug)).await.unwrap();
  }
  let mut pinned = NewArticle::new(sub.id, "Pinned", "pinned");
  pinned.order = -1;
  h.create_article(pinned).await.unwrap();

  let query = ArticleQuery { order: ArticleOrder::Display, ..Default::default() };
  let slugs: Vec<_> = s
    .list_articles(&query)
    .await
    .unwrap()
    .into_iter()
    .map(|a| a.slug)
    .collect();
  assert_eq!(slugs, ["pinned", "third", "second", "first"]);

  let oldest = ArticleQuery { order: ArticleOrder::Oldest, limit: Some(1), ..Default::default() };
  assert_eq!(s.list_articles(&oldest).await.unwrap()[0].slug, "first");
}

#[tokio::test]
async fn text_filter_folds_unicode_case() {
  let s = store().await;
  let (h, _, sub) = seeded(&s).await;
  let mut input = NewArticle::new(sub.id, "ÜBERSICHT", "uebersicht").published();
  input.content = "Grundlagen".into();
  h.create_article(input).await.unwrap();

  let query = ArticleQuery {
    text: Some(TextFilter { needle: "übersicht".into(), fields: vec![TextField::Title] }),
    ..Default::default()
  };
  assert_eq!(s.list_articles(&query).await.unwrap().len(), 1);
  assert_eq!(s.count_articles(&query).await.unwrap(), 1);

  let excerpt_only = ArticleQuery {
    text: Some(TextFilter { needle: "grund".into(), fields: vec![TextField::Excerpt] }),
    ..Default::default()
  };
  assert!(s.list_articles(&excerpt_only).await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_parent_list_matches_nothing() {
  let s = store().await;
  let (h, _, sub) = seeded(&s).await;
  h.create_article(NewArticle::new(sub.id, "Install", "install")).await.unwrap();

  let query = ArticleQuery { subcategory_ids: Some(vec![]), ..Default::default() };
  assert!(s.list_articles(&query).await.unwrap().is_empty());
  assert_eq!(s.count_articles(&query).await.unwrap(), 0);
}

#[tokio::test]
async fn update_never_touches_views() {
  let s = store().await;
  let (h, _, sub) = seeded(&s).await;
  let article = h
    .create_article(NewArticle::new(sub.id, "Install", "install").published())
    .await
    .unwrap();

  assert!(s.increment_views(article.id).await.unwrap());
  assert!(s.increment_views(article.id).await.unwrap());
  assert!(!s.increment_views(Uuid::new_v4()).await.unwrap());

  let updated = h
    .update_article(article.id, ArticlePatch {
      content: Patch::Set("new body".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(updated.content, "new body");

  let stored = s.get_article(article.id).await.unwrap().unwrap();
  assert_eq!(stored.views, 2);
  assert_eq!(stored.created_at, article.created_at);
}

#[tokio::test]
async fn concurrent_view_increments_are_not_lost() {
  let s = store().await;
  let (h, _, sub) = seeded(&s).await;
  let article = h
    .create_article(NewArticle::new(sub.id, "Install", "install").published())
    .await
    .unwrap();

  let tasks: Vec<_> = (0..25)
    .map(|_| {
      let s = s.clone();
      tokio::spawn(async move { s.increment_views(article.id).await })
    })
    .collect();
  for task in tasks {
    assert!(task.await.unwrap().unwrap());
  }
  assert_eq!(s.get_article(article.id).await.unwrap().unwrap().views, 25);
  assert_eq!(s.article_totals().await.unwrap().views, 25);
}

#[tokio::test]
async fn grouped_counts_and_totals() {
  let s = store().await;
  let (h, category, setup) = seeded(&s).await;
  let usage = h
    .create_subcategory(NewSubCategory::new(category.id, "Usage", "usage"))
    .await
    .unwrap();
  h.create_article(NewArticle::new(setup.id, "A", "a").published()).await.unwrap();
  h.create_article(NewArticle::new(setup.id, "B", "b")).await.unwrap();
  h.create_article(NewArticle::new(usage.id, "C", "c").published()).await.unwrap();

  let all = s.article_counts_by_subcategory(None).await.unwrap();
  assert_eq!(all[&setup.id], 2);
  assert_eq!(all[&usage.id], 1);

  let published = s
    .article_counts_by_subcategory(Some(ArticleStatus::Published))
    .await
    .unwrap();
  assert_eq!(published[&setup.id], 1);

  let totals = s.article_totals().await.unwrap();
  assert_eq!((totals.published, totals.draft, totals.views), (2, 1, 0));
}

// ─── Cascades ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn purge_category_removes_the_subtree_only() {
  let s = store().await;
  let catalog = Catalog::new(s.clone());
  let (h, guides, setup) = seeded(&s).await;
  let keep = h.create_category(NewCategory::new("Keep", "keep")).await.unwrap();
  let kept_sub = h
    .create_subcategory(NewSubCategory::new(keep.id, "Kept", "kept"))
    .await
    .unwrap();
  h.create_article(NewArticle::new(setup.id, "A", "a")).await.unwrap();
  h.create_article(NewArticle::new(setup.id, "B", "b")).await.unwrap();
  let survivor = h.create_article(NewArticle::new(kept_sub.id, "C", "c")).await.unwrap();

  let purged = catalog.hierarchy.delete_category(guides.id).await.unwrap();
  assert_eq!((purged.articles, purged.subcategories, purged.root), (2, 1, true));

  let remaining = h.articles(ArticleFilter::default()).await.unwrap();
  assert_eq!(remaining.len(), 1);
  assert_eq!(remaining[0].article.id, survivor.id);
  assert!(s.get_subcategory(setup.id).await.unwrap().is_none());
  assert_eq!(catalog.counts.stats().await.unwrap().total_articles, 1);
}

#[tokio::test]
async fn purge_subcategory_leaves_parent() {
  let s = store().await;
  let (h, guides, setup) = seeded(&s).await;
  h.create_article(NewArticle::new(setup.id, "A", "a")).await.unwrap();

  let purged = h.delete_subcategory(setup.id).await.unwrap();
  assert_eq!((purged.articles, purged.subcategories), (1, 1));
  assert!(s.get_category(guides.id).await.unwrap().is_some());
  assert_eq!(s.count_articles(&ArticleQuery::default()).await.unwrap(), 0);
}

// ─── Admins ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_usernames_are_unique() {
  let s = store().await;
  let admin = AdminPrincipal::new("root", "hash-1");
  assert!(s.insert_admin(admin.clone()).await.unwrap());
  assert!(!s.insert_admin(AdminPrincipal::new("root", "hash-2")).await.unwrap());
  assert_eq!(s.count_admins().await.unwrap(), 1);

  assert!(s.set_admin_password(admin.id, "hash-3".into()).await.unwrap());
  let stored = s.find_admin("root").await.unwrap().unwrap();
  assert_eq!(stored.password_hash, "hash-3");
  assert_eq!(s.get_admin(admin.id).await.unwrap().unwrap().username, "root");
  assert!(s.find_admin("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn only_one_first_admin_wins_a_race() {
  let s = store().await;
  let tasks: Vec<_> = (0..8)
    .map(|i| {
      let s = s.clone();
      tokio::spawn(async move {
        s.insert_first_admin(AdminPrincipal::new(format!("admin-{i}"), "hash")).await
      })
    })
    .collect();

  let mut created = 0;
  for task in tasks {
    if task.await.unwrap().unwrap() {
      created += 1;
    }
  }
  assert_eq!(created, 1);
  assert_eq!(s.count_admins().await.unwrap(), 1);

  assert!(!s.insert_first_admin(AdminPrincipal::new("late", "hash")).await.unwrap());
  assert!(s.insert_admin(AdminPrincipal::new("late", "hash")).await.unwrap());
}
