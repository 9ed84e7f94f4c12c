//! Handlers for links: owner CRUD, repository import, and public click
//! counting.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/me/links` | Ordered by category, then position |
//! | `POST`   | `/me/links` | Body: [`CreateLink`]; 201 |
//! | `PUT`    | `/me/links/{id}` | Body: partial [`LinkUpdate`] |
//! | `DELETE` | `/me/links/{id}` | 204 |
//! | `POST`   | `/me/links/import` | Body: [`ImportRequest`]; 201 |
//! | `POST`   | `/links/{id}/click` | Public; returns the new count |

use std::collections::HashSet;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use l4c_core::{
  link::{Link, LinkCategory, LinkUpdate, NewLink, plan_import},
  remote::{RepoSource, is_github_username},
  store::PortfolioStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState, Backend,
  auth::CurrentUser,
  error::{ApiError, ApiResult, Envelope},
};

// ─── Owner CRUD ──────────────────────────────────────────────────────────────

/// `GET /me/links`
pub async fn list<B: Backend>(
  State(state): State<AppState<B>>,
  current: CurrentUser,
) -> ApiResult<Vec<Link>> {
  let links = state
    .store
    .list_links(current.user.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Envelope::ok(links))
}

#[derive(Debug, Deserialize)]
pub struct CreateLink {
  pub title:       String,
  pub url:         String,
  pub description: Option<String>,
  pub category:    LinkCategory,
  pub icon:        Option<String>,
  pub position:    Option<i64>,
}

/// `POST /me/links`
pub async fn create<B: Backend>(
  State(state): State<AppState<B>>,
  current: CurrentUser,
  Json(body): Json<CreateLink>,
) -> Result<impl IntoResponse, ApiError> {
  let input = NewLink {
    user_id:     current.user.user_id,
    title:       body.title,
    url:         body.url,
    description: body.description.filter(|d| !d.trim().is_empty()),
    category:    body.category,
    icon:        body.icon.filter(|i| !i.is_empty()),
    position:    body.position,
    metadata:    None,
  }
  .validate()?;

  let link = state.store.add_link(input).await.map_err(ApiError::store)?;
  tracing::debug!(link_id = %link.link_id, category = %link.category, "link added");
  Ok(Envelope::created(link))
}

/// `PUT /me/links/{id}`
pub async fn update<B: Backend>(
  State(state): State<AppState<B>>,
  current: CurrentUser,
  Path(link_id): Path<Uuid>,
  Json(update): Json<LinkUpdate>,
) -> ApiResult<Link> {
  let update = update.validate()?;
  let link = state
    .store
    .update_link(current.user.user_id, link_id, update)
    .await
    .map_err(ApiError::store)?;
  Ok(Envelope::ok(link))
}

/// `DELETE /me/links/{id}`
pub async fn remove<B: Backend>(
  State(state): State<AppState<B>>,
  current: CurrentUser,
  Path(link_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  state
    .store
    .delete_link(current.user.user_id, link_id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Import ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ImportRequest {
  /// Defaults to the profile's GitHub username.
  pub github_username: Option<String>,
  /// Only these repositories; all of them when absent.
  pub repo_ids:        Option<Vec<i64>>,
  /// Defaults to [`LinkCategory::Projects`].
  pub category:        Option<LinkCategory>,
}

#[derive(Debug, Serialize)]
pub struct ImportResult {
  pub imported: usize,
  pub links:    Vec<Link>,
}

/// `POST /me/links/import`
///
/// Appends the selected repositories to the end of the category in one
/// batch. Repositories already linked (same URL) are skipped.
pub async fn import<B: Backend>(
  State(state): State<AppState<B>>,
  current: CurrentUser,
  Json(req): Json<ImportRequest>,
) -> Result<impl IntoResponse, ApiError> {
  let user = current.user;
  let Some(github_username) = req
    .github_username
    .or(user.github_username)
    .map(|u| u.trim().to_owned())
    .filter(|u| !u.is_empty())
  else {
    return Err(ApiError::Validation(
      "no GitHub username given and none set on the profile".into(),
    ));
  };
  if !is_github_username(&github_username) {
    return Err(ApiError::Validation(format!(
      "{github_username:?} is not a valid GitHub username"
    )));
  }
  let category = req.category.unwrap_or(LinkCategory::Projects);

  let repos = state
    .repos
    .list_repos(&github_username)
    .await
    .map_err(ApiError::upstream)?;
  let fetched = repos.len();

  let existing: HashSet<String> = state
    .store
    .list_links(user.user_id)
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .map(|l| l.url)
    .collect();

  let selected: Vec<_> = repos
    .into_iter()
    .filter(|r| req.repo_ids.as_ref().is_none_or(|ids| ids.contains(&r.id)))
    .filter(|r| !existing.contains(&r.url))
    .collect();

  let links = if selected.is_empty() {
    Vec::new()
  } else {
    let max_position = state
      .store
      .max_position(user.user_id, category)
      .await
      .map_err(ApiError::store)?;
    let planned = plan_import(user.user_id, category, max_position, selected);
    state.store.insert_links(planned).await.map_err(ApiError::store)?
  };

  tracing::info!(
    user_id = %user.user_id,
    %github_username,
    fetched,
    imported = links.len(),
    "repositories imported"
  );
  Ok(Envelope::created(ImportResult { imported: links.len(), links }))
}

// ─── Clicks ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ClickCount {
  pub click_count: i64,
}

/// `POST /links/{id}/click`
pub async fn click<B: Backend>(
  State(state): State<AppState<B>>,
  Path(link_id): Path<Uuid>,
) -> ApiResult<ClickCount> {
  let click_count = state
    .store
    .increment_clicks(link_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Envelope::ok(ClickCount { click_count }))
}
