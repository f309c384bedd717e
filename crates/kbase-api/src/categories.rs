//! Handlers for `/admin/categories` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/admin/categories` | With subcategory and article counts |
//! | `POST`   | `/admin/categories` | Body: [`NewCategory`] |
//! | `GET`    | `/admin/categories/{id}` | 404 if not found |
//! | `PUT`    | `/admin/categories/{id}` | Body: [`CategoryPatch`] |
//! | `DELETE` | `/admin/categories/{id}` | Removes the whole subtree |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use kbase_core::{
  Catalog,
  category::{CategoryPatch, NewCategory},
  counts::CategoryWithCounts,
  store::CatalogStore,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /admin/categories`
pub async fn list<S: CatalogStore>(
  State(catalog): State<Catalog<S>>,
) -> Result<Json<Vec<CategoryWithCounts>>, ApiError> {
  let categories = catalog.hierarchy.categories().await?;
  Ok(Json(catalog.counts.categories(categories).await?))
}

/// `POST /admin/categories`
pub async fn create<S: CatalogStore>(
  State(catalog): State<Catalog<S>>,
  Json(body): Json<NewCategory>,
) -> Result<impl IntoResponse, ApiError> {
  let category = catalog.hierarchy.create_category(body).await?;
  Ok((StatusCode::CREATED, Json(category)))
}

/// `GET /admin/categories/{id}`
pub async fn get_one<S: CatalogStore>(
  State(catalog): State<Catalog<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<CategoryWithCounts>, ApiError> {
  let category = catalog.hierarchy.category(id).await?;
  Ok(Json(catalog.counts.category(category).await?))
}

/// `PUT /admin/categories/{id}`
pub async fn update<S: CatalogStore>(
  State(catalog): State<Catalog<S>>,
  Path(id): Path<Uuid>,
  Json(patch): Json<CategoryPatch>,
) -> Result<Json<CategoryWithCounts>, ApiError> {
  let category = catalog.hierarchy.update_category(id, patch).await?;
  Ok(Json(catalog.counts.category(category).await?))
}

/// `DELETE /admin/categories/{id}`
pub async fn delete<S: CatalogStore>(
  State(catalog): State<Catalog<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
  let purged = catalog.hierarchy.delete_category(id).await?;
  Ok(Json(json!({
    "message": "category deleted",
    "deleted_subcategories": purged.subcategories,
    "deleted_articles": purged.articles,
  })))
}
