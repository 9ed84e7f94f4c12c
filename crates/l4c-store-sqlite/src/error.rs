//! Error type for `l4c-store-sqlite`.

use l4c_core::{
  store::{ErrorKind, StoreError},
  subscription::Subject,
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] l4c_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("link not found: {0}")]
  LinkNotFound(Uuid),

  #[error("testimonial not found: {0}")]
  TestimonialNotFound(Uuid),

  #[error("email or username is already registered")]
  UserExists,

  #[error("trial for {0} has already been used")]
  AlreadyUsed(Subject),

  #[error("usage limit of {limit} reached for {subject}")]
  QuotaExceeded { subject: Subject, limit: i64 },
}

impl StoreError for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Core(e) => e.kind(),
      Self::UserNotFound(_) | Self::LinkNotFound(_) | Self::TestimonialNotFound(_) => {
        ErrorKind::NotFound
      }
      Self::UserExists => ErrorKind::Conflict,
      Self::AlreadyUsed(_) => ErrorKind::AlreadyUsed,
      Self::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
      Self::Database(_) | Self::Json(_) | Self::Uuid(_) | Self::DateParse(_) => {
        ErrorKind::Internal
      }
    }
  }
}

/// True when `e` is a UNIQUE or PRIMARY KEY constraint failure.
pub(crate) fn is_unique_violation(e: &tokio_rusqlite::Error) -> bool {
  match e {
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(f, _)) => matches!(
      f.extended_code,
      rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    ),
    _ => false,
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
