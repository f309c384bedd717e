//! Slug scopes and the registry that enforces uniqueness within them.

use std::{fmt, sync::Arc};

use uuid::Uuid;

use crate::{Error, Result, store::{CatalogStore, StoreResultExt as _}};

/// The set of siblings within which a slug must be unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlugScope {
  /// All main categories.
  Categories,
  /// The subcategories of one main category.
  Subcategories(Uuid),
  /// The articles of one subcategory.
  Articles(Uuid),
}

impl fmt::Display for SlugScope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Categories => f.write_str("site-wide"),
      Self::Subcategories(id) => write!(f, "in category {id}"),
      Self::Articles(id) => write!(f, "in subcategory {id}"),
    }
  }
}

/// Answers "may this slug be used in this scope?" before any write happens.
pub struct SlugRegistry<S> {
  store: Arc<S>,
}

impl<S> Clone for SlugRegistry<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: CatalogStore> SlugRegistry<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Fail with [`Error::SlugConflict`] if `slug` is taken in `scope` by any
  /// entity other than `except`.
  pub async fn reserve(
    &self,
    scope: SlugScope,
    slug: &str,
    except: Option<Uuid>,
  ) -> Result<()> {
    let taken = self.store.slug_in_use(scope, slug, except).await.lift()?;
    if taken {
      return Err(Error::SlugConflict { scope, slug: slug.to_owned() });
    }
    Ok(())
  }
}
