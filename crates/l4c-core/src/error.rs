//! Error types for `l4c-core`.

use thiserror::Error;

use crate::{store::ErrorKind, subscription::Subject};

#[derive(Debug, Error)]
pub enum Error {
  #[error("trial for {0} has already been used")]
  AlreadyUsed(Subject),

  #[error("usage limit of {limit} reached for {subject}")]
  QuotaExceeded { subject: Subject, limit: i64 },

  #[error("unknown gated subject: {0:?}")]
  UnknownSubject(String),

  #[error("unknown subscription status: {0:?}")]
  UnknownStatus(String),

  #[error("unknown link category: {0:?}")]
  UnknownCategory(String),

  #[error("{0}")]
  Validation(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::AlreadyUsed(_) => ErrorKind::AlreadyUsed,
      Self::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
      Self::UnknownSubject(_)
      | Self::UnknownStatus(_)
      | Self::UnknownCategory(_)
      | Self::Validation(_) => ErrorKind::Invalid,
      Self::Serialization(_) => ErrorKind::Internal,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
