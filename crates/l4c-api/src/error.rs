//! API error type, the response envelope, and their
//! [`axum::response::IntoResponse`] implementations.
//!
//! Every response body is wrapped: `{"success":true,"data":…}` on success,
//! `{"success":false,"error":"…"}` on failure.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use l4c_core::store::{ErrorKind, StoreError};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  Validation(String),

  #[error("authentication required")]
  Unauthorized,

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  AlreadyUsed(String),

  #[error("{0}")]
  Conflict(String),

  #[error("{0}")]
  QuotaExceeded(String),

  #[error("upstream service failed: {0}")]
  Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a store failure by its [`ErrorKind`].
  pub fn store<E: StoreError>(e: E) -> Self {
    let message = e.to_string();
    match e.kind() {
      ErrorKind::NotFound => Self::NotFound(message),
      ErrorKind::AlreadyUsed => Self::AlreadyUsed(message),
      ErrorKind::Conflict => Self::Conflict(message),
      ErrorKind::QuotaExceeded => Self::QuotaExceeded(message),
      ErrorKind::Invalid => Self::Validation(message),
      ErrorKind::Internal => Self::Internal(Box::new(e)),
    }
  }

  pub fn upstream<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Self::Upstream(Box::new(e))
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::Validation(_) => StatusCode::BAD_REQUEST,
      Self::Unauthorized => StatusCode::UNAUTHORIZED,
      Self::Forbidden(_) => StatusCode::FORBIDDEN,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::AlreadyUsed(_) | Self::Conflict(_) => StatusCode::CONFLICT,
      Self::QuotaExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
      Self::Upstream(_) => StatusCode::BAD_GATEWAY,
      Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<l4c_core::Error> for ApiError {
  fn from(e: l4c_core::Error) -> Self {
    match e.kind() {
      ErrorKind::AlreadyUsed => Self::AlreadyUsed(e.to_string()),
      ErrorKind::QuotaExceeded => Self::QuotaExceeded(e.to_string()),
      ErrorKind::Internal => Self::Internal(Box::new(e)),
      _ => Self::Validation(e.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      // Internal details stay in the log.
      Self::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        "internal server error".to_owned()
      }
      Self::Upstream(e) => {
        tracing::error!(error = %e, "upstream request failed");
        self.to_string()
      }
      _ => self.to_string(),
    };
    (status, Json(json!({ "success": false, "error": message }))).into_response()
  }
}

// ─── Success envelope ─────────────────────────────────────────────────────────

/// `{"success": true, "data": …}`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
  pub success: bool,
  pub data:    T,
}

impl<T: Serialize> Envelope<T> {
  pub fn ok(data: T) -> Json<Self> { Json(Self { success: true, data }) }

  pub fn created(data: T) -> (StatusCode, Json<Self>) {
    (StatusCode::CREATED, Self::ok(data))
  }
}

/// What most handlers return.
pub type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;
