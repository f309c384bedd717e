//! Articles, the leaves of the catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, patch::Patch, validate};

/// Visibility of an article. Only published articles reach the public
/// surface.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ArticleStatus {
  #[default]
  Draft,
  Published,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
  pub id:             Uuid,
  pub subcategory_id: Uuid,
  pub title:          String,
  /// Unique within `subcategory_id`.
  pub slug:           String,
  pub excerpt:        String,
  pub content:        String,
  pub status:         ArticleStatus,
  pub order:          i64,
  pub featured:       bool,
  pub tags:           Vec<String>,
  /// Public read counter; only ever incremented.
  pub views:          u64,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

impl Article {
  pub fn is_published(&self) -> bool { self.status == ArticleStatus::Published }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewArticle {
  pub subcategory_id: Uuid,
  pub title:          String,
  pub slug:           String,
  #[serde(default)]
  pub excerpt:        String,
  #[serde(default)]
  pub content:        String,
  #[serde(default)]
  pub status:         ArticleStatus,
  #[serde(default)]
  pub order:          i64,
  #[serde(default)]
  pub featured:       bool,
  #[serde(default)]
  pub tags:           Vec<String>,
}

impl NewArticle {
  pub fn new(
    subcategory_id: Uuid,
    title: impl Into<String>,
    slug: impl Into<String>,
  ) -> Self {
    Self {
      subcategory_id,
      title: title.into(),
      slug: slug.into(),
      excerpt: String::new(),
      content: String::new(),
      status: ArticleStatus::Draft,
      order: 0,
      featured: false,
      tags: Vec::new(),
    }
  }

  pub fn published(mut self) -> Self {
    self.status = ArticleStatus::Published;
    self
  }

  pub fn validate(&self) -> Result<()> {
    validate::non_blank("title", &self.title)?;
    validate::slug(&self.slug)
  }

  pub(crate) fn into_article(self, now: DateTime<Utc>) -> Article {
    Article {
      id:             Uuid::new_v4(),
      subcategory_id: self.subcategory_id,
      title:          self.title,
      slug:           self.slug,
      excerpt:        self.excerpt,
      content:        self.content,
      status:         self.status,
      order:          self.order,
      featured:       self.featured,
      tags:           normalize_tags(self.tags),
      views:          0,
      created_at:     now,
      updated_at:     now,
    }
  }
}

/// Sparse update for an article. Setting `subcategory_id` moves it.
///
/// There is deliberately no `views` field: the counter is owned by the
/// public read path.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ArticlePatch {
  pub subcategory_id: Patch<Uuid>,
  pub title:          Patch<String>,
  pub slug:           Patch<String>,
  pub excerpt:        Patch<String>,
  pub content:        Patch<String>,
  pub status:         Patch<ArticleStatus>,
  pub order:          Patch<i64>,
  pub featured:       Patch<bool>,
  pub tags:           Patch<Vec<String>>,
}

impl ArticlePatch {
  pub fn is_empty(&self) -> bool {
    self.subcategory_id.is_absent()
      && self.title.is_absent()
      && self.slug.is_absent()
      && self.excerpt.is_absent()
      && self.content.is_absent()
      && self.status.is_absent()
      && self.order.is_absent()
      && self.featured.is_absent()
      && self.tags.is_absent()
  }
}

impl Article {
  /// Apply `patch` in place. Validation failures leave `self` untouched.
  pub fn apply(&mut self, patch: ArticlePatch, now: DateTime<Utc>) -> Result<()> {
    let parent = patch.subcategory_id.required("subcategory_id")?;
    let title = patch.title.required("title")?;
    let slug = patch.slug.required("slug")?;
    let status = patch.status.required("status")?;
    let order = patch.order.required("order")?;
    let featured = patch.featured.required("featured")?;
    if let Some(title) = &title {
      validate::non_blank("title", title)?;
    }
    if let Some(slug) = &slug {
      validate::slug(slug)?;
    }

    if let Some(parent) = parent {
      self.subcategory_id = parent;
    }
    if let Some(title) = title {
      self.title = title;
    }
    if let Some(slug) = slug {
      self.slug = slug;
    }
    if let Some(excerpt) = patch.excerpt.or_reset(String::new) {
      self.excerpt = excerpt;
    }
    if let Some(content) = patch.content.or_reset(String::new) {
      self.content = content;
    }
    if let Some(status) = status {
      self.status = status;
    }
    if let Some(order) = order {
      self.order = order;
    }
    if let Some(featured) = featured {
      self.featured = featured;
    }
    if let Some(tags) = patch.tags.or_reset(Vec::new) {
      self.tags = normalize_tags(tags);
    }
    self.updated_at = now;
    Ok(())
  }
}

/// Trim tags, drop empty ones and remove duplicates, keeping first-seen
/// order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
  let mut out: Vec<String> = Vec::with_capacity(tags.len());
  for tag in tags {
    let tag = tag.trim();
    if !tag.is_empty() && !out.iter().any(|t| t == tag) {
      out.push(tag.to_owned());
    }
  }
  out
}

/// An article with its parents' names resolved, as shown on the admin
/// surface. The parent fields are `None` when the parent vanished under a
/// concurrent cascade.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleWithParents {
  #[serde(flatten)]
  pub article:            Article,
  pub subcategory_name:   Option<String>,
  pub main_category_id:   Option<Uuid>,
  pub main_category_name: Option<String>,
}
