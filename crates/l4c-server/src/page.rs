//! `GET /u/{username}`: the rendered public portfolio.
//!
//! Pages carry a strong ETag, the quoted hex SHA-256 of the HTML. A request
//! whose `If-None-Match` lists it gets `304 Not Modified` with no body.

use axum::{
  extract::{Path, State},
  http::{HeaderMap, HeaderValue, StatusCode, header},
  response::{Html, IntoResponse, Response},
};
use l4c_api::{AppState, Backend, public::build_view};
use sha2::{Digest, Sha256};

use crate::error::PageError;

/// Strong ETag for a rendered page.
pub fn compute_etag(html: &str) -> String {
  format!("\"{}\"", hex::encode(Sha256::digest(html.as_bytes())))
}

/// Whether an `If-None-Match` header value covers `etag`.
pub fn etag_matches(if_none_match: &str, etag: &str) -> bool {
  if_none_match
    .split(',')
    .map(str::trim)
    .any(|candidate| candidate == "*" || candidate == etag)
}

pub async fn portfolio<B: Backend>(
  State(state): State<AppState<B>>,
  Path(username): Path<String>,
  headers: HeaderMap,
) -> Result<Response, PageError> {
  let view = build_view(&state, &username).await?;
  let html = l4c_render::render(&view)?;
  let etag = compute_etag(&html);

  let not_modified = headers
    .get(header::IF_NONE_MATCH)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|v| etag_matches(v, &etag));

  let etag_value = HeaderValue::from_str(&etag)?;

  if not_modified {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag_value)]).into_response());
  }

  tracing::debug!(%username, template = %view.template, "portfolio rendered");
  Ok(
    (
      [
        (header::ETAG, etag_value),
        (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
      ],
      Html(html),
    )
      .into_response(),
  )
}
