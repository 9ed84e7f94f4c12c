use axum::{
  http::{StatusCode, header::InvalidHeaderValue},
  response::{Html, IntoResponse, Response},
};
use l4c_api::ApiError;
use thiserror::Error;

/// Failure serving a rendered portfolio page.
#[derive(Debug, Error)]
pub enum PageError {
  #[error(transparent)]
  Api(#[from] ApiError),

  #[error("render error: {0}")]
  Render(#[from] l4c_render::Error),

  #[error("invalid header value: {0}")]
  Header(#[from] InvalidHeaderValue),
}

const NOT_FOUND_PAGE: &str = "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
  <title>Not found</title></head><body><h1>Portfolio not found</h1></body></html>\n";

impl IntoResponse for PageError {
  fn into_response(self) -> Response {
    match self {
      Self::Api(ApiError::NotFound(_)) => {
        (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE)).into_response()
      }
      Self::Api(e) => e.into_response(),
      e @ (Self::Render(_) | Self::Header(_)) => {
        tracing::error!(error = %e, "page render failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
      }
    }
  }
}
