//! Handlers for `/admin/subcategories` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/admin/subcategories` | Optional `?main_category_id=<uuid>` |
//! | `POST`   | `/admin/subcategories` | 400 if the category does not exist |
//! | `GET`    | `/admin/subcategories/{id}` | With article count |
//! | `PUT`    | `/admin/subcategories/{id}` | Setting `main_category_id` moves it |
//! | `DELETE` | `/admin/subcategories/{id}` | Removes its articles too |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use kbase_core::{
  Catalog,
  counts::SubCategoryWithCounts,
  store::CatalogStore,
  subcategory::{NewSubCategory, SubCategoryPatch},
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub main_category_id: Option<Uuid>,
}

/// `GET /admin/subcategories[?main_category_id=<uuid>]`
pub async fn list<S: CatalogStore>(
  State(catalog): State<Catalog<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<SubCategoryWithCounts>>, ApiError> {
  let subcategories = catalog.hierarchy.subcategories(params.main_category_id).await?;
  Ok(Json(catalog.counts.subcategories(subcategories).await?))
}

/// `POST /admin/subcategories`
pub async fn create<S: CatalogStore>(
  State(catalog): State<Catalog<S>>,
  Json(body): Json<NewSubCategory>,
) -> Result<impl IntoResponse, ApiError> {
  let subcategory = catalog.hierarchy.create_subcategory(body).await?;
  Ok((StatusCode::CREATED, Json(subcategory)))
}

/// `GET /admin/subcategories/{id}`
pub async fn get_one<S: CatalogStore>(
  State(catalog): State<Catalog<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SubCategoryWithCounts>, ApiError> {
  let subcategory = catalog.hierarchy.subcategory(id).await?;
  Ok(Json(catalog.counts.subcategory(subcategory).await?))
}

/// `PUT /admin/subcategories/{id}`
pub async fn update<S: CatalogStore>(
  State(catalog): State<Catalog<S>>,
  Path(id): Path<Uuid>,
  Json(patch): Json<SubCategoryPatch>,
) -> Result<Json<SubCategoryWithCounts>, ApiError> {
  let subcategory = catalog.hierarchy.update_subcategory(id, patch).await?;
  Ok(Json(catalog.counts.subcategory(subcategory).await?))
}

/// `DELETE /admin/subcategories/{id}`
pub async fn delete<S: CatalogStore>(
  State(catalog): State<Catalog<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
  let purged = catalog.hierarchy.delete_subcategory(id).await?;
  Ok(Json(json!({
    "message": "subcategory deleted",
    "deleted_articles": purged.articles,
  })))
}
