//! Error type for `kbase-store-sqlite`.

use kbase_core::slug::SlugScope;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown article status: {0:?}")]
  Status(String),

  /// A unique slug index rejected a write.
  #[error("slug {slug:?} already exists {scope}")]
  SlugConflict { scope: SlugScope, slug: String },
}

impl Error {
  /// Whether this is a SQLite constraint violation.
  pub(crate) fn is_constraint(&self) -> bool {
    matches!(
      self,
      Error::Database(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _)))
        if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
  }
}

impl From<Error> for kbase_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::SlugConflict { scope, slug } => kbase_core::Error::SlugConflict { scope, slug },
      other => kbase_core::Error::Store(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
