//! Admin principals, the only authenticated users of the catalog.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminPrincipal {
  pub id:            Uuid,
  pub username:      String,
  /// PHC string; never serialized.
  #[serde(skip)]
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
}

impl AdminPrincipal {
  pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
    Self {
      id:            Uuid::new_v4(),
      username:      username.into(),
      password_hash: password_hash.into(),
      created_at:    Utc::now(),
    }
  }
}

/// Storage for admin principals. Usernames are unique.
pub trait AdminStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert a principal. Returns `false` if the username is taken.
  fn insert_admin(
    &self,
    admin: AdminPrincipal,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Insert a principal only while no admin exists at all. The emptiness
  /// check and the insert are one atomic step. Returns `false` otherwise.
  fn insert_first_admin(
    &self,
    admin: AdminPrincipal,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn find_admin<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<AdminPrincipal>, Self::Error>> + Send + 'a;

  fn get_admin(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<AdminPrincipal>, Self::Error>> + Send + '_;

  fn count_admins(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn set_admin_password(
    &self,
    id: Uuid,
    password_hash: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
