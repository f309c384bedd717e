//! HTTP server for the kbase knowledge base.
//!
//! Composes the catalog API from `kbase-api` with admin authentication,
//! image uploads and static file serving under `/api/kb`.

pub mod auth;
pub mod upload;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, extract::DefaultBodyLimit, middleware, routing::post};
use chrono::Duration;
use kbase_core::{Catalog, CatalogStore, admin::AdminStore};
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};

use auth::TokenSigner;
use upload::DiskStorage;

// ─── Configuration ───────────────────────────────────────────────────────────

fn default_token_ttl_days() -> i64 { 7 }

fn default_max_upload_bytes() -> usize { 10 * 1024 * 1024 }

/// Runtime server configuration, deserialised from `config.toml` and
/// `KBASE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  pub store_path:       PathBuf,
  pub upload_dir:       PathBuf,
  /// HMAC key for admin bearer tokens.
  pub token_secret:     String,
  #[serde(default = "default_token_ttl_days")]
  pub token_ttl_days:   i64,
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes: usize,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through the server's own handlers.
pub struct AppState<S> {
  pub store:   Arc<S>,
  pub catalog: Catalog<S>,
  pub tokens:  Arc<TokenSigner>,
  pub uploads: Arc<DiskStorage>,
  pub config:  Arc<ServerConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:   self.store.clone(),
      catalog: self.catalog.clone(),
      tokens:  self.tokens.clone(),
      uploads: self.uploads.clone(),
      config:  self.config.clone(),
    }
  }
}

impl<S: CatalogStore> AppState<S> {
  pub fn new(store: Arc<S>, config: ServerConfig) -> Self {
    Self {
      catalog: Catalog::new(store.clone()),
      tokens: Arc::new(TokenSigner::new(
        config.token_secret.clone(),
        Duration::days(config.token_ttl_days),
      )),
      uploads: Arc::new(DiskStorage::new(config.upload_dir.clone())),
      config: Arc::new(config),
      store,
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full application router, everything nested under `/api/kb`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: CatalogStore + AdminStore + 'static,
{
  let admin = kbase_api::admin_router(state.catalog.clone())
    .merge(auth::protected_router(state.clone()))
    .merge(
      Router::new()
        .route("/admin/upload", post(upload::handler::<S>))
        .with_state(state.clone()),
    )
    .route_layer(middleware::from_fn_with_state(
      state.clone(),
      auth::require_admin::<S>,
    ));

  let api = Router::new()
    .merge(admin)
    .merge(auth::open_router(state.clone()))
    .merge(kbase_api::public_router(state.catalog.clone()))
    .nest_service("/uploads", ServeDir::new(state.uploads.dir()));

  Router::new()
    .nest("/api/kb", api)
    .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use kbase_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  fn config() -> ServerConfig {
    ServerConfig {
      host:             "127.0.0.1".to_string(),
      port:             8001,
      store_path:       PathBuf::from(":memory:"),
      upload_dir:       std::env::temp_dir().join(format!("kbase-test-{}", Uuid::new_v4())),
      token_secret:     "test-secret".to_string(),
      token_ttl_days:   7,
      max_upload_bytes: 1024 * 1024,
    }
  }

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState::new(Arc::new(store), config())
  }

  async fn send(
    state: &AppState<SqliteStore>,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
      Some(json) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(json.to_string())
      }
      None => Body::empty(),
    };
    let resp = router(state.clone()).oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
  }

  async fn login(state: &AppState<SqliteStore>) -> String {
    let creds = json!({ "username": "admin", "password": "correct horse" });
    let (status, _) = send(state, "POST", "/api/kb/admin/setup", None, Some(creds.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send(state, "POST", "/api/kb/admin/login", None, Some(creds)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    body["access_token"].as_str().unwrap().to_owned()
  }

  // ── Auth ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn admin_routes_require_a_token() {
    let state = make_state().await;
    let resp = router(state.clone())
      .oneshot(
        Request::builder()
          .uri("/api/kb/admin/categories")
          .body(Body::empty())
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");

    let (status, _) =
      send(&state, "GET", "/api/kb/admin/stats", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn token_for_a_missing_admin_is_forbidden() {
    let state = make_state().await;
    let token = state.tokens.issue(Uuid::new_v4()).unwrap();
    let (status, _) = send(&state, "GET", "/api/kb/admin/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn setup_only_once_and_login_checks_password() {
    let state = make_state().await;
    let token = login(&state).await;

    let again = json!({ "username": "second", "password": "another password" });
    let (status, _) = send(&state, "POST", "/api/kb/admin/setup", None, Some(again)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let wrong = json!({ "username": "admin", "password": "wrong password" });
    let (status, _) = send(&state, "POST", "/api/kb/admin/login", None, Some(wrong)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, me) = send(&state, "GET", "/api/kb/admin/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "admin");
    assert!(me.get("password_hash").is_none());
  }

  #[tokio::test]
  async fn concurrent_setup_creates_one_admin() {
    let state = make_state().await;
    let tasks: Vec<_> = ["first", "second", "third"]
      .into_iter()
      .map(|username| {
        let state = state.clone();
        tokio::spawn(async move {
          let creds = json!({ "username": username, "password": "correct horse" });
          send(&state, "POST", "/api/kb/admin/setup", None, Some(creds)).await.0
        })
      })
      .collect();

    let mut created = 0;
    for task in tasks {
      let status = task.await.unwrap();
      if status == StatusCode::CREATED {
        created += 1;
      } else {
        assert_eq!(status, StatusCode::BAD_REQUEST);
      }
    }
    assert_eq!(created, 1);
    assert_eq!(state.store.count_admins().await.unwrap(), 1);
  }

  #[tokio::test]
  async fn password_change_requires_the_old_password() {
    let state = make_state().await;
    let token = login(&state).await;

    let bad = json!({ "old_password": "nope", "new_password": "brand new pass" });
    let (status, _) =
      send(&state, "PUT", "/api/kb/admin/password", Some(&token), Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let good = json!({ "old_password": "correct horse", "new_password": "brand new pass" });
    let (status, _) =
      send(&state, "PUT", "/api/kb/admin/password", Some(&token), Some(good)).await;
    assert_eq!(status, StatusCode::OK);

    let creds = json!({ "username": "admin", "password": "brand new pass" });
    let (status, _) = send(&state, "POST", "/api/kb/admin/login", None, Some(creds)).await;
    assert_eq!(status, StatusCode::OK);
  }

  // ── Catalog walkthrough ───────────────────────────────────────────────────

  #[tokio::test]
  async fn guides_walkthrough() {
    let state = make_state().await;
    let token = login(&state).await;
    let token = Some(token.as_str());

    let (status, guides) = send(
      &state,
      "POST",
      "/api/kb/admin/categories",
      token,
      Some(json!({ "name": "Guides", "slug": "guides" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let guides_id = guides["id"].as_str().unwrap().to_owned();

    let (status, setup) = send(
      &state,
      "POST",
      "/api/kb/admin/subcategories",
      token,
      Some(json!({ "main_category_id": guides_id, "name": "Setup", "slug": "setup" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let setup_id = setup["id"].as_str().unwrap().to_owned();

    let (status, install) = send(
      &state,
      "POST",
      "/api/kb/admin/articles",
      token,
      Some(json!({
        "subcategory_id": setup_id,
        "title": "Install",
        "slug": "install",
        "status": "draft",
        "content": "Download the installer and run it."
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let install_id = install["id"].as_str().unwrap().to_owned();

    let (status, _) = send(&state, "GET", "/api/kb/public/articles/install", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
      &state,
      "PUT",
      &format!("/api/kb/admin/articles/{install_id}"),
      token,
      Some(json!({ "status": "published" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, first) = send(&state, "GET", "/api/kb/public/articles/install", None, None).await;
    assert_eq!(first["views"], 1);
    assert_eq!(first["main_category"]["name"], "Guides");
    let (_, second) = send(&state, "GET", "/api/kb/public/articles/install", None, None).await;
    assert_eq!(second["views"], 2);

    let (_, public) = send(&state, "GET", "/api/kb/public/categories", None, None).await;
    assert_eq!(public[0]["article_count"], 1);
    assert_eq!(public[0]["subcategories"][0]["article_count"], 1);
    let (_, hits) = send(&state, "GET", "/api/kb/public/search?q=install", None, None).await;
    assert_eq!(hits.as_array().unwrap().len(), 1);

    let (status, _) =
      send(&state, "DELETE", &format!("/api/kb/admin/categories/{guides_id}"), token, None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) =
      send(&state, "GET", &format!("/api/kb/admin/subcategories/{setup_id}"), token, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) =
      send(&state, "GET", &format!("/api/kb/admin/articles/{install_id}"), token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, stats) = send(&state, "GET", "/api/kb/admin/stats", token, None).await;
    assert_eq!(stats["total_categories"], 0);
    assert_eq!(stats["total_articles"], 0);
    assert_eq!(stats["total_views"], 0);
  }

  // ── Uploads ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn upload_then_fetch() {
    let state = make_state().await;
    let token = login(&state).await;

    let boundary = "kbase-boundary";
    let body = format!(
      "--{boundary}\r\n\
       Content-Disposition: form-data; name=\"file\"; filename=\"shot.PNG\"\r\n\
       Content-Type: image/png\r\n\r\n\
       not really a png\r\n\
       --{boundary}--\r\n"
    );
    let resp = router(state.clone())
      .oneshot(
        Request::builder()
          .method("POST")
          .uri("/api/kb/admin/upload")
          .header(header::AUTHORIZATION, format!("Bearer {token}"))
          .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
          .body(Body::from(body))
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let stored: Value = serde_json::from_slice(&bytes).unwrap();
    let url = stored["url"].as_str().unwrap();
    assert!(url.starts_with("/api/kb/uploads/") && url.ends_with(".png"));

    let resp = router(state.clone())
      .oneshot(Request::builder().uri(url).body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"not really a png");

    tokio::fs::remove_dir_all(&state.config.upload_dir).await.unwrap();
  }
}
