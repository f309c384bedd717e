//! Image uploads for article content.
//!
//! Files land in the configured upload directory as `<uuid>.<ext>` and are
//! served back from `/api/kb/uploads/`.

use std::path::PathBuf;

use axum::{
  Json,
  extract::{Multipart, State},
};
use bytes::Bytes;
use kbase_api::ApiError;
use kbase_core::{CatalogStore, admin::AdminStore};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::AppState;

/// Public path prefix uploaded files are served under.
pub const UPLOAD_URL_PREFIX: &str = "/api/kb/uploads";

const DEFAULT_EXTENSION: &str = "jpg";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
  pub url:      String,
  pub filename: String,
}

/// Writes uploaded files to a local directory.
pub struct DiskStorage {
  dir: PathBuf,
}

impl DiskStorage {
  pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

  pub fn dir(&self) -> &std::path::Path { &self.dir }

  /// Store `bytes` under a fresh name. `original_name` only contributes its
  /// extension.
  pub async fn store(
    &self,
    bytes: Bytes,
    original_name: Option<&str>,
  ) -> std::io::Result<StoredFile> {
    let filename = format!("{}.{}", Uuid::new_v4(), extension(original_name));
    tokio::fs::create_dir_all(&self.dir).await?;
    tokio::fs::write(self.dir.join(&filename), &bytes).await?;
    Ok(StoredFile { url: format!("{UPLOAD_URL_PREFIX}/{filename}"), filename })
  }
}

/// The lowercased ASCII-alphanumeric extension of `name`, or `jpg`.
fn extension(name: Option<&str>) -> String {
  let ext: String = name
    .and_then(|n| n.rsplit_once('.'))
    .map(|(_, ext)| ext)
    .unwrap_or_default()
    .chars()
    .filter(char::is_ascii_alphanumeric)
    .map(|c| c.to_ascii_lowercase())
    .take(10)
    .collect();
  if ext.is_empty() { DEFAULT_EXTENSION.to_owned() } else { ext }
}

/// `POST /admin/upload`: multipart form with a `file` field.
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  mut multipart: Multipart,
) -> Result<Json<StoredFile>, ApiError>
where
  S: CatalogStore + AdminStore + 'static,
{
  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::BadRequest(e.to_string()))?
  {
    if field.name() != Some("file") {
      continue;
    }
    let original_name = field.file_name().map(str::to_owned);
    let bytes = field
      .bytes()
      .await
      .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let stored = state
      .uploads
      .store(bytes, original_name.as_deref())
      .await
      .map_err(|e| ApiError::Internal(format!("failed to write upload: {e}")))?;
    info!(filename = %stored.filename, "stored upload");
    return Ok(Json(stored));
  }
  Err(ApiError::BadRequest("missing `file` field".into()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extension_is_sanitized() {
    assert_eq!(extension(Some("photo.PNG")), "png");
    assert_eq!(extension(Some("archive.tar.gz")), "gz");
    assert_eq!(extension(Some("../../etc/pass.w/d")), "wd");
    assert_eq!(extension(Some("no-extension")), "jpg");
    assert_eq!(extension(Some("trailing.")), "jpg");
    assert_eq!(extension(None), "jpg");
  }

  #[tokio::test]
  async fn store_writes_under_a_fresh_name() {
    let dir = std::env::temp_dir().join(format!("kbase-upload-{}", Uuid::new_v4()));
    let storage = DiskStorage::new(&dir);

    let stored = storage.store(Bytes::from_static(b"img"), Some("a.webp")).await.unwrap();
    assert!(stored.filename.ends_with(".webp"));
    assert_eq!(stored.url, format!("/api/kb/uploads/{}", stored.filename));
    assert_eq!(tokio::fs::read(dir.join(&stored.filename)).await.unwrap(), b"img");

    tokio::fs::remove_dir_all(&dir).await.unwrap();
  }
}
