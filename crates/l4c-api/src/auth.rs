//! Passwords, bearer tokens, and the [`CurrentUser`] extractor.
//!
//! A session token is 32 random bytes, URL-safe base64. Only its SHA-256
//! digest reaches the store, so a leaked database cannot be replayed.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use l4c_core::{profile::User, store::PortfolioStore};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::{AppState, Backend, error::ApiError};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Produce an argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Internal(e.to_string().into()))
}

/// Check `password` against a stored PHC string. A malformed hash never
/// verifies.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .map(|parsed| {
      Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
    })
    .unwrap_or(false)
}

/// A fresh opaque bearer token.
pub fn new_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex SHA-256 of `token`: the form sessions are stored and looked up by.
pub fn token_digest(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}

/// The token from an `Authorization: Bearer …` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The signed-in user for this request. Present in a handler means the
/// bearer token matched a live session.
pub struct CurrentUser {
  pub user:       User,
  pub token_hash: String,
}

impl<B: Backend> FromRequestParts<AppState<B>> for CurrentUser {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<B>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
    let token_hash = token_digest(token);

    let session = state
      .store
      .find_session(&token_hash)
      .await
      .map_err(ApiError::store)?
      .ok_or(ApiError::Unauthorized)?;
    if !session.is_live(Utc::now()) {
      return Err(ApiError::Unauthorized);
    }

    let user = state
      .store
      .get_user(session.user_id)
      .await
      .map_err(ApiError::store)?
      .ok_or(ApiError::Unauthorized)?;

    Ok(Self { user, token_hash })
  }
}
