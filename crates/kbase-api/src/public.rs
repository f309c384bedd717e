//! Handlers for the unauthenticated `/public` endpoints.
//!
//! Only published articles are reachable from here.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/public/categories` | Nested subcategories with published counts |
//! | `GET`  | `/public/categories/{slug}` | |
//! | `GET`  | `/public/subcategories/{slug}/articles` | Optional `?main_category_id=` |
//! | `GET`  | `/public/articles/{slug}` | Optional `?subcategory_id=`; counts a view |
//! | `GET`  | `/public/search?q=<text>` | At least 2 characters, at most 20 hits |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use kbase_core::{
  Catalog,
  public::{PublicArticle, PublicCategory, SearchHit, SubCategoryPage},
  store::CatalogStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /public/categories`
pub async fn categories<S: CatalogStore>(
  State(catalog): State<Catalog<S>>,
) -> Result<Json<Vec<PublicCategory>>, ApiError> {
  Ok(Json(catalog.public.categories().await?))
}

/// `GET /public/categories/{slug}`
pub async fn category<S: CatalogStore>(
  State(catalog): State<Catalog<S>>,
  Path(slug): Path<String>,
) -> Result<Json<PublicCategory>, ApiError> {
  Ok(Json(catalog.public.category(&slug).await?))
}

#[derive(Debug, Deserialize)]
pub struct SubCategoryParams {
  pub main_category_id: Option<Uuid>,
}

/// `GET /public/subcategories/{slug}/articles[?main_category_id=<uuid>]`
pub async fn subcategory_articles<S: CatalogStore>(
  State(catalog): State<Catalog<S>>,
  Path(slug): Path<String>,
  Query(params): Query<SubCategoryParams>,
) -> Result<Json<SubCategoryPage>, ApiError> {
  Ok(Json(
    catalog
      .public
      .subcategory_articles(&slug, params.main_category_id)
      .await?,
  ))
}

#[derive(Debug, Deserialize)]
pub struct ArticleParams {
  pub subcategory_id: Option<Uuid>,
}

/// `GET /public/articles/{slug}[?subcategory_id=<uuid>]`
pub async fn article<S: CatalogStore>(
  State(catalog): State<Catalog<S>>,
  Path(slug): Path<String>,
  Query(params): Query<ArticleParams>,
) -> Result<Json<PublicArticle>, ApiError> {
  Ok(Json(catalog.public.article(&slug, params.subcategory_id).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
  #[serde(default)]
  pub q: String,
}

/// `GET /public/search?q=<text>`
pub async fn search<S: CatalogStore>(
  State(catalog): State<Catalog<S>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchHit>>, ApiError> {
  Ok(Json(catalog.public.search(&params.q).await?))
}
