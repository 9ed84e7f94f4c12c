//! Error type for `l4c-remote`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{service} returned {status}: {body}")]
  Status {
    service: &'static str,
    status:  u16,
    body:    String,
  },

  #[error("{0} is not configured")]
  NotConfigured(&'static str),

  #[error("invalid github username: {0:?}")]
  InvalidUsername(String),
}

#[cfg(test)]
impl Error {
  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::Status { status: 404, .. })
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
