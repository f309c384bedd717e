//! Admin authentication: argon2 password hashes, HMAC-signed bearer tokens,
//! the `require_admin` middleware and the `/admin` auth endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/admin/setup` | First admin only; 400 once one exists |
//! | `POST` | `/admin/login` | Returns a bearer token |
//! | `GET`  | `/admin/me` | Requires a token |
//! | `PUT`  | `/admin/password` | Requires a token and the old password |

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  Extension, Json, Router,
  extract::{Request, State},
  http::{StatusCode, header},
  middleware::Next,
  response::{IntoResponse, Response},
  routing::{get, post, put},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use kbase_api::ApiError;
use kbase_core::{
  CatalogStore,
  admin::{AdminPrincipal, AdminStore},
};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sha2::Sha256;
use tracing::{info, warn};
use uuid::Uuid;

use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Shortest password accepted by setup and password changes.
pub const MIN_PASSWORD_CHARS: usize = 8;

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
}

pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
    .unwrap_or(false)
}

fn check_password_strength(password: &str) -> Result<(), ApiError> {
  if password.chars().count() < MIN_PASSWORD_CHARS {
    return Err(ApiError::BadRequest(format!(
      "password must be at least {MIN_PASSWORD_CHARS} characters"
    )));
  }
  Ok(())
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  /// Admin id.
  pub sub: Uuid,
  /// Expiry, seconds since the Unix epoch.
  pub exp: i64,
}

/// Issues and verifies `base64url(claims).hex(hmac_sha256)` bearer tokens.
pub struct TokenSigner {
  secret: Vec<u8>,
  ttl:    Duration,
}

impl TokenSigner {
  pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
    Self { secret: secret.into(), ttl }
  }

  fn mac(&self, payload: &str) -> Result<HmacSha256, ApiError> {
    let mut mac = HmacSha256::new_from_slice(&self.secret)
      .map_err(|e| ApiError::Internal(format!("hmac key error: {e}")))?;
    mac.update(payload.as_bytes());
    Ok(mac)
  }

  pub fn issue(&self, admin_id: Uuid) -> Result<String, ApiError> {
    self.issue_at(admin_id, Utc::now())
  }

  fn issue_at(&self, admin_id: Uuid, now: DateTime<Utc>) -> Result<String, ApiError> {
    let claims = Claims { sub: admin_id, exp: (now + self.ttl).timestamp() };
    let json = serde_json::to_vec(&claims)
      .map_err(|e| ApiError::Internal(format!("claims encoding error: {e}")))?;
    let payload = URL_SAFE_NO_PAD.encode(json);
    let signature = hex::encode(self.mac(&payload)?.finalize().into_bytes());
    Ok(format!("{payload}.{signature}"))
  }

  /// Check the signature (in constant time), then expiry.
  pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
    let invalid = || ApiError::Unauthenticated("invalid token".into());

    let (payload, signature) = token.split_once('.').ok_or_else(invalid)?;
    let signature = hex::decode(signature).map_err(|_| invalid())?;
    self.mac(payload)?.verify_slice(&signature).map_err(|_| invalid())?;

    let json = URL_SAFE_NO_PAD.decode(payload).map_err(|_| invalid())?;
    let claims: Claims = serde_json::from_slice(&json).map_err(|_| invalid())?;
    if claims.exp <= Utc::now().timestamp() {
      return Err(ApiError::Unauthenticated("token expired".into()));
    }
    Ok(claims)
  }
}

// ─── Middleware ──────────────────────────────────────────────────────────────

fn bearer(req: &Request) -> Option<&str> {
  req
    .headers()
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
}

pub(crate) fn store_error<E>(e: E) -> ApiError
where
  E: std::error::Error + Send + Sync + 'static,
{
  ApiError::Core(kbase_core::Error::Store(Box::new(e)))
}

/// Reject requests without a valid bearer token for an existing admin.
/// On success the [`AdminPrincipal`] is stored as a request extension.
pub async fn require_admin<S>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Result<Response, ApiError>
where
  S: CatalogStore + AdminStore + 'static,
{
  let token = bearer(&req)
    .ok_or_else(|| ApiError::Unauthenticated("missing bearer token".into()))?;
  let claims = state.tokens.verify(token)?;
  let admin = state
    .store
    .get_admin(claims.sub)
    .await
    .map_err(store_error)?
    .ok_or_else(|| ApiError::Unauthorized("admin no longer exists".into()))?;

  req.extensions_mut().insert(admin);
  Ok(next.run(req).await)
}

// ─── Handlers ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct Credentials {
  pub username: String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
  pub access_token: String,
  pub token_type:   &'static str,
}

/// `POST /admin/setup`: create the first admin.
pub async fn setup<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<Credentials>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CatalogStore + AdminStore + 'static,
{
  if state.store.count_admins().await.map_err(store_error)? > 0 {
    return Err(ApiError::BadRequest("an admin already exists".into()));
  }
  let username = body.username.trim();
  if username.is_empty() {
    return Err(ApiError::BadRequest("username must not be empty".into()));
  }
  check_password_strength(&body.password)?;

  let admin = AdminPrincipal::new(username, hash_password(&body.password)?);
  if !state.store.insert_first_admin(admin.clone()).await.map_err(store_error)? {
    return Err(ApiError::BadRequest("an admin already exists".into()));
  }
  info!(username = %admin.username, "created first admin");
  Ok((StatusCode::CREATED, Json(admin)))
}

/// `POST /admin/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<Credentials>,
) -> Result<Json<TokenResponse>, ApiError>
where
  S: CatalogStore + AdminStore + 'static,
{
  let admin = state
    .store
    .find_admin(body.username.trim())
    .await
    .map_err(store_error)?
    .filter(|a| verify_password(&body.password, &a.password_hash));

  let Some(admin) = admin else {
    warn!(username = %body.username, "failed login");
    return Err(ApiError::Unauthenticated("invalid username or password".into()));
  };
  Ok(Json(TokenResponse {
    access_token: state.tokens.issue(admin.id)?,
    token_type:   "bearer",
  }))
}

/// `GET /admin/me`
pub async fn me(Extension(admin): Extension<AdminPrincipal>) -> Json<Value> {
  Json(json!({ "username": admin.username, "created_at": admin.created_at }))
}

#[derive(Debug, Deserialize)]
pub struct PasswordChange {
  pub old_password: String,
  pub new_password: String,
}

/// `PUT /admin/password`
pub async fn change_password<S>(
  State(state): State<AppState<S>>,
  Extension(admin): Extension<AdminPrincipal>,
  Json(body): Json<PasswordChange>,
) -> Result<Json<Value>, ApiError>
where
  S: CatalogStore + AdminStore + 'static,
{
  if !verify_password(&body.old_password, &admin.password_hash) {
    return Err(ApiError::BadRequest("old password is incorrect".into()));
  }
  check_password_strength(&body.new_password)?;

  let hash = hash_password(&body.new_password)?;
  if !state.store.set_admin_password(admin.id, hash).await.map_err(store_error)? {
    return Err(ApiError::Unauthorized("admin no longer exists".into()));
  }
  info!(username = %admin.username, "changed admin password");
  Ok(Json(json!({ "message": "password updated" })))
}

/// Routes reachable without a token.
pub fn open_router<S>(state: AppState<S>) -> Router<()>
where
  S: CatalogStore + AdminStore + 'static,
{
  Router::new()
    .route("/admin/setup", post(setup::<S>))
    .route("/admin/login", post(login::<S>))
    .with_state(state)
}

/// Routes that expect [`require_admin`] in front of them.
pub fn protected_router<S>(state: AppState<S>) -> Router<()>
where
  S: CatalogStore + AdminStore + 'static,
{
  Router::new()
    .route("/admin/me", get(me))
    .route("/admin/password", put(change_password::<S>))
    .with_state(state)
}
