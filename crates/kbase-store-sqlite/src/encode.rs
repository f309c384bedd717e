//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 UTC with a fixed nanosecond fraction so that
//! string order is chronological order. Tags are a compact JSON array.
//! UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use kbase_core::{
  admin::AdminPrincipal,
  article::{Article, ArticleStatus},
  category::MainCategory,
  subcategory::SubCategory,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── ArticleStatus ───────────────────────────────────────────────────────────

pub fn encode_status(s: ArticleStatus) -> String { s.to_string() }

pub fn decode_status(s: &str) -> Result<ArticleStatus> {
  s.parse().map_err(|_| Error::Status(s.to_owned()))
}

// ─── Tags ────────────────────────────────────────────────────────────────────

pub fn encode_tags(tags: &[String]) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn decode_tags(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const CATEGORY_COLUMNS: &str =
  "id, name, slug, description, icon, sort_order, created_at, updated_at";

/// Raw values read directly from a `categories` row.
pub struct RawCategory {
  pub id:          String,
  pub name:        String,
  pub slug:        String,
  pub description: String,
  pub icon:        String,
  pub sort_order:  i64,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawCategory {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      name:        row.get(1)?,
      slug:        row.get(2)?,
      description: row.get(3)?,
      icon:        row.get(4)?,
      sort_order:  row.get(5)?,
      created_at:  row.get(6)?,
      updated_at:  row.get(7)?,
    })
  }

  pub fn into_category(self) -> Result<MainCategory> {
    Ok(MainCategory {
      id:          decode_uuid(&self.id)?,
      name:        self.name,
      slug:        self.slug,
      description: self.description,
      icon:        self.icon,
      order:       self.sort_order,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

pub const SUBCATEGORY_COLUMNS: &str =
  "id, main_category_id, name, slug, description, sort_order, created_at, updated_at";

/// Raw values read directly from a `subcategories` row.
pub struct RawSubCategory {
  pub id:               String,
  pub main_category_id: String,
  pub name:             String,
  pub slug:             String,
  pub description:      String,
  pub sort_order:       i64,
  pub created_at:       String,
  pub updated_at:       String,
}

impl RawSubCategory {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:               row.get(0)?,
      main_category_id: row.get(1)?,
      name:             row.get(2)?,
      slug:             row.get(3)?,
      description:      row.get(4)?,
      sort_order:       row.get(5)?,
      created_at:       row.get(6)?,
      updated_at:       row.get(7)?,
    })
  }

  pub fn into_subcategory(self) -> Result<SubCategory> {
    Ok(SubCategory {
      id:               decode_uuid(&self.id)?,
      main_category_id: decode_uuid(&self.main_category_id)?,
      name:             self.name,
      slug:             self.slug,
      description:      self.description,
      order:            self.sort_order,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

pub const ARTICLE_COLUMNS: &str = "id, subcategory_id, title, slug, excerpt, content, status, \
                                   sort_order, featured, tags, views, created_at, updated_at";

/// Raw values read directly from an `articles` row.
pub struct RawArticle {
  pub id:             String,
  pub subcategory_id: String,
  pub title:          String,
  pub slug:           String,
  pub excerpt:        String,
  pub content:        String,
  pub status:         String,
  pub sort_order:     i64,
  pub featured:       bool,
  pub tags:           String,
  pub views:          i64,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawArticle {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      subcategory_id: row.get(1)?,
      title:          row.get(2)?,
      slug:           row.get(3)?,
      excerpt:        row.get(4)?,
      content:        row.get(5)?,
      status:         row.get(6)?,
      sort_order:     row.get(7)?,
      featured:       row.get(8)?,
      tags:           row.get(9)?,
      views:          row.get(10)?,
      created_at:     row.get(11)?,
      updated_at:     row.get(12)?,
    })
  }

  pub fn into_article(self) -> Result<Article> {
    Ok(Article {
      id:             decode_uuid(&self.id)?,
      subcategory_id: decode_uuid(&self.subcategory_id)?,
      title:          self.title,
      slug:           self.slug,
      excerpt:        self.excerpt,
      content:        self.content,
      status:         decode_status(&self.status)?,
      order:          self.sort_order,
      featured:       self.featured,
      tags:           decode_tags(&self.tags)?,
      views:          self.views.max(0) as u64,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

pub const ADMIN_COLUMNS: &str = "id, username, password_hash, created_at";

/// Raw values read directly from an `admins` row.
pub struct RawAdmin {
  pub id:            String,
  pub username:      String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawAdmin {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      username:      row.get(1)?,
      password_hash: row.get(2)?,
      created_at:    row.get(3)?,
    })
  }

  pub fn into_admin(self) -> Result<AdminPrincipal> {
    Ok(AdminPrincipal {
      id:            decode_uuid(&self.id)?,
      username:      self.username,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
