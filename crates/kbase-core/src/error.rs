//! Error types for `kbase-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::slug::SlugScope;

/// The three entity kinds of the catalog, used to label errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Entity {
  Category,
  Subcategory,
  Article,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("{entity} not found: {key}")]
  NotFound { entity: Entity, key: String },

  #[error("slug {slug:?} already exists {scope}")]
  SlugConflict { scope: SlugScope, slug: String },

  /// A create or reparenting update named a parent that does not exist.
  #[error("parent {entity} {id} does not exist")]
  InvalidParent { entity: Entity, id: Uuid },

  #[error("validation error: {0}")]
  Validation(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn not_found(entity: Entity, key: impl ToString) -> Self {
    Self::NotFound { entity, key: key.to_string() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
