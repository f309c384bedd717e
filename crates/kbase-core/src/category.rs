//! Main categories, the top level of the catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, patch::Patch, validate};

pub const DEFAULT_ICON: &str = "Folder";

fn default_icon() -> String { DEFAULT_ICON.to_owned() }

/// A top-level category. Its slug is unique site-wide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainCategory {
  pub id:          Uuid,
  pub name:        String,
  pub slug:        String,
  pub description: String,
  /// Name of the icon the frontend renders next to the category.
  pub icon:        String,
  pub order:       i64,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Input for creating a category. The id and timestamps are server-assigned.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
  pub name:        String,
  pub slug:        String,
  #[serde(default)]
  pub description: String,
  #[serde(default = "default_icon")]
  pub icon:        String,
  #[serde(default)]
  pub order:       i64,
}

impl NewCategory {
  pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
    Self {
      name:        name.into(),
      slug:        slug.into(),
      description: String::new(),
      icon:        default_icon(),
      order:       0,
    }
  }

  pub fn validate(&self) -> Result<()> {
    validate::non_blank("name", &self.name)?;
    validate::slug(&self.slug)
  }

  pub(crate) fn into_category(self, now: DateTime<Utc>) -> MainCategory {
    MainCategory {
      id:          Uuid::new_v4(),
      name:        self.name,
      slug:        self.slug,
      description: self.description,
      icon:        self.icon,
      order:       self.order,
      created_at:  now,
      updated_at:  now,
    }
  }
}

/// Sparse update for a category.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryPatch {
  pub name:        Patch<String>,
  pub slug:        Patch<String>,
  pub description: Patch<String>,
  pub icon:        Patch<String>,
  pub order:       Patch<i64>,
}

impl CategoryPatch {
  pub fn is_empty(&self) -> bool {
    self.name.is_absent()
      && self.slug.is_absent()
      && self.description.is_absent()
      && self.icon.is_absent()
      && self.order.is_absent()
  }
}

impl MainCategory {
  /// Apply `patch` in place. Validation failures leave `self` untouched.
  pub fn apply(&mut self, patch: CategoryPatch, now: DateTime<Utc>) -> Result<()> {
    let name = patch.name.required("name")?;
    let slug = patch.slug.required("slug")?;
    let order = patch.order.required("order")?;
    if let Some(name) = &name {
      validate::non_blank("name", name)?;
    }
    if let Some(slug) = &slug {
      validate::slug(slug)?;
    }

    if let Some(name) = name {
      self.name = name;
    }
    if let Some(slug) = slug {
      self.slug = slug;
    }
    if let Some(description) = patch.description.or_reset(String::new) {
      self.description = description;
    }
    if let Some(icon) = patch.icon.or_reset(default_icon) {
      self.icon = icon;
    }
    if let Some(order) = order {
      self.order = order;
    }
    self.updated_at = now;
    Ok(())
  }
}
