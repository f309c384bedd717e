//! Subcategories, owned by exactly one main category.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, patch::Patch, validate};

/// A subcategory. Its slug is unique within its main category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategory {
  pub id:               Uuid,
  pub main_category_id: Uuid,
  pub name:             String,
  pub slug:             String,
  pub description:      String,
  pub order:            i64,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSubCategory {
  pub main_category_id: Uuid,
  pub name:             String,
  pub slug:             String,
  #[serde(default)]
  pub description:      String,
  #[serde(default)]
  pub order:            i64,
}

impl NewSubCategory {
  pub fn new(
    main_category_id: Uuid,
    name: impl Into<String>,
    slug: impl Into<String>,
  ) -> Self {
    Self {
      main_category_id,
      name: name.into(),
      slug: slug.into(),
      description: String::new(),
      order: 0,
    }
  }

  pub fn validate(&self) -> Result<()> {
    validate::non_blank("name", &self.name)?;
    validate::slug(&self.slug)
  }

  pub(crate) fn into_subcategory(self, now: DateTime<Utc>) -> SubCategory {
    SubCategory {
      id:               Uuid::new_v4(),
      main_category_id: self.main_category_id,
      name:             self.name,
      slug:             self.slug,
      description:      self.description,
      order:            self.order,
      created_at:       now,
      updated_at:       now,
    }
  }
}

/// Sparse update for a subcategory. Setting `main_category_id` reparents it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubCategoryPatch {
  pub main_category_id: Patch<Uuid>,
  pub name:             Patch<String>,
  pub slug:             Patch<String>,
  pub description:      Patch<String>,
  pub order:            Patch<i64>,
}

impl SubCategoryPatch {
  pub fn is_empty(&self) -> bool {
    self.main_category_id.is_absent()
      && self.name.is_absent()
      && self.slug.is_absent()
      && self.description.is_absent()
      && self.order.is_absent()
  }
}

impl SubCategory {
  /// Apply `patch` in place. Validation failures leave `self` untouched.
  pub fn apply(&mut self, patch: SubCategoryPatch, now: DateTime<Utc>) -> Result<()> {
    let parent = patch.main_category_id.required("main_category_id")?;
    let name = patch.name.required("name")?;
    let slug = patch.slug.required("slug")?;
    let order = patch.order.required("order")?;
    if let Some(name) = &name {
      validate::non_blank("name", name)?;
    }
    if let Some(slug) = &slug {
      validate::slug(slug)?;
    }

    if let Some(parent) = parent {
      self.main_category_id = parent;
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
    if let Some(order) = order {
      self.order = order;
    }
    self.updated_at = now;
    Ok(())
  }
}
