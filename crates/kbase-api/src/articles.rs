//! Handlers for `/admin/articles` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/admin/articles` | `?subcategory_id=&status=&search=`, drafts included |
//! | `POST`   | `/admin/articles` | 400 if the subcategory does not exist |
//! | `GET`    | `/admin/articles/{id}` | Includes parent names |
//! | `PUT`    | `/admin/articles/{id}` | Views are never writable |
//! | `DELETE` | `/admin/articles/{id}` | |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use kbase_core::{
  Catalog,
  article::{Article, ArticlePatch, ArticleWithParents, NewArticle},
  hierarchy::ArticleFilter,
  store::CatalogStore,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /admin/articles[?subcategory_id=<uuid>][&status=draft|published][&search=<text>]`
pub async fn list<S: CatalogStore>(
  State(catalog): State<Catalog<S>>,
  Query(filter): Query<ArticleFilter>,
) -> Result<Json<Vec<ArticleWithParents>>, ApiError> {
  Ok(Json(catalog.hierarchy.articles(filter).await?))
}

/// `POST /admin/articles`
pub async fn create<S: CatalogStore>(
  State(catalog): State<Catalog<S>>,
  Json(body): Json<NewArticle>,
) -> Result<impl IntoResponse, ApiError> {
  let article = catalog.hierarchy.create_article(body).await?;
  Ok((StatusCode::CREATED, Json(article)))
}

/// `GET /admin/articles/{id}`
pub async fn get_one<S: CatalogStore>(
  State(catalog): State<Catalog<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ArticleWithParents>, ApiError> {
  Ok(Json(catalog.hierarchy.article_with_parents(id).await?))
}

/// `PUT /admin/articles/{id}`
pub async fn update<S: CatalogStore>(
  State(catalog): State<Catalog<S>>,
  Path(id): Path<Uuid>,
  Json(patch): Json<ArticlePatch>,
) -> Result<Json<Article>, ApiError> {
  Ok(Json(catalog.hierarchy.update_article(id, patch).await?))
}

/// `DELETE /admin/articles/{id}`
pub async fn delete<S: CatalogStore>(
  State(catalog): State<Catalog<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
  catalog.hierarchy.delete_article(id).await?;
  Ok(Json(json!({ "message": "article deleted" })))
}
