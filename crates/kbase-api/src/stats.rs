//! Handler for `GET /admin/stats`.

use axum::{Json, extract::State};
use kbase_core::{Catalog, counts::KbStats, store::CatalogStore};

use crate::error::ApiError;

/// `GET /admin/stats`
pub async fn handler<S: CatalogStore>(
  State(catalog): State<Catalog<S>>,
) -> Result<Json<KbStats>, ApiError> {
  Ok(Json(catalog.counts.stats().await?))
}
