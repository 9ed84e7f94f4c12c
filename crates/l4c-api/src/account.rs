//! Handlers for `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/sign-up` | Body: [`SignUpBody`]; 201 + user |
//! | `POST` | `/auth/sign-in` | Body: [`SignInBody`]; token + expiry + user |
//! | `POST` | `/auth/sign-out` | Bearer; revokes the session |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use l4c_core::{
  profile::{NewUser, Session, User, normalize_email, normalize_username},
  store::PortfolioStore,
};
use serde::{Deserialize, Serialize};

use crate::{
  AppState, Backend,
  auth::{CurrentUser, MIN_PASSWORD_LEN, hash_password, new_token, token_digest, verify_password},
  error::{ApiError, ApiResult, Envelope},
};

// ─── Sign up ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignUpBody {
  pub email:     String,
  pub username:  String,
  pub password:  String,
  pub full_name: Option<String>,
}

/// `POST /auth/sign-up`
pub async fn sign_up<B: Backend>(
  State(state): State<AppState<B>>,
  Json(body): Json<SignUpBody>,
) -> Result<impl IntoResponse, ApiError> {
  let email = normalize_email(&body.email)?;
  let username = normalize_username(&body.username)?;
  if body.password.chars().count() < MIN_PASSWORD_LEN {
    return Err(ApiError::Validation(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }

  let user = state
    .store
    .create_user(NewUser {
      email,
      username,
      full_name: body.full_name.filter(|n| !n.trim().is_empty()),
      password_hash: hash_password(&body.password)?,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(user_id = %user.user_id, username = %user.username, "user signed up");
  Ok(Envelope::created(user))
}

// ─── Sign in ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignInBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignedIn {
  pub token:      String,
  pub expires_at: DateTime<Utc>,
  pub user:       User,
}

/// `POST /auth/sign-in`
pub async fn sign_in<B: Backend>(
  State(state): State<AppState<B>>,
  Json(body): Json<SignInBody>,
) -> ApiResult<SignedIn> {
  let credentials = state
    .store
    .find_credentials(&body.email.trim().to_ascii_lowercase())
    .await
    .map_err(ApiError::store)?;

  // Same answer for an unknown email and a wrong password.
  let Some((user, _)) = credentials.filter(|(_, phc)| verify_password(&body.password, phc))
  else {
    return Err(ApiError::Unauthorized);
  };

  let token = new_token();
  let now = Utc::now();
  let session = Session {
    token_hash: token_digest(&token),
    user_id:    user.user_id,
    created_at: now,
    expires_at: now + state.config.session_ttl,
  };
  let expires_at = session.expires_at;
  state
    .store
    .create_session(session)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(user_id = %user.user_id, "session started");
  Ok(Envelope::ok(SignedIn { token, expires_at, user }))
}

// ─── Sign out ────────────────────────────────────────────────────────────────

/// `POST /auth/sign-out`
pub async fn sign_out<B: Backend>(
  State(state): State<AppState<B>>,
  current: CurrentUser,
) -> Result<StatusCode, ApiError> {
  state
    .store
    .revoke_session(&current.token_hash)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(user_id = %current.user.user_id, "session revoked");
  Ok(StatusCode::NO_CONTENT)
}
