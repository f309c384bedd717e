//! JSON REST API for the kbase catalog.
//!
//! Exposes axum [`Router`]s backed by any [`kbase_core::CatalogStore`].
//! Authentication, uploads and transport concerns are the caller's
//! responsibility: the admin router is expected to sit behind an auth
//! layer.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let catalog = Catalog::new(store.clone());
//! Router::new().nest(
//!   "/api/kb",
//!   kbase_api::admin_router(catalog.clone())
//!     .layer(auth)
//!     .merge(kbase_api::public_router(catalog)),
//! )
//! ```

pub mod articles;
pub mod categories;
pub mod error;
pub mod public;
pub mod stats;
pub mod subcategories;

use axum::{Router, routing::get};
use kbase_core::{Catalog, CatalogStore};

pub use error::ApiError;

/// The admin CRUD surface: `/admin/categories`, `/admin/subcategories`,
/// `/admin/articles` and `/admin/stats`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn admin_router<S>(catalog: Catalog<S>) -> Router<()>
where
  S: CatalogStore + 'static,
{
  Router::new()
    // Categories
    .route(
      "/admin/categories",
      get(categories::list::<S>).post(categories::create::<S>),
    )
    .route(
      "/admin/categories/{id}",
      get(categories::get_one::<S>)
        .put(categories::update::<S>)
        .delete(categories::delete::<S>),
    )
    // Subcategories
    .route(
      "/admin/subcategories",
      get(subcategories::list::<S>).post(subcategories::create::<S>),
    )
    .route(
      "/admin/subcategories/{id}",
      get(subcategories::get_one::<S>)
        .put(subcategories::update::<S>)
        .delete(subcategories::delete::<S>),
    )
    // Articles
    .route("/admin/articles", get(articles::list::<S>).post(articles::create::<S>))
    .route(
      "/admin/articles/{id}",
      get(articles::get_one::<S>)
        .put(articles::update::<S>)
        .delete(articles::delete::<S>),
    )
    // Dashboard
    .route("/admin/stats", get(stats::handler::<S>))
    .with_state(catalog)
}

/// The read-only public surface under `/public`.
pub fn public_router<S>(catalog: Catalog<S>) -> Router<()>
where
  S: CatalogStore + 'static,
{
  Router::new()
    .route("/public/categories", get(public::categories::<S>))
    .route("/public/categories/{slug}", get(public::category::<S>))
    .route(
      "/public/subcategories/{slug}/articles",
      get(public::subcategory_articles::<S>),
    )
    .route("/public/articles/{slug}", get(public::article::<S>))
    .route("/public/search", get(public::search::<S>))
    .with_state(catalog)
}
