//! Handlers for the owner's profile and template choice.

use axum::{Json, extract::State};
use l4c_core::{
  profile::{ProfileUpdate, User},
  store::PortfolioStore,
  subscription::Subject,
  template::TemplateId,
};
use serde::Deserialize;

use crate::{
  AppState, Backend,
  access::decision_for,
  auth::CurrentUser,
  error::{ApiError, ApiResult, Envelope},
};

/// `GET /me`
pub async fn get_me<B: Backend>(current: CurrentUser) -> ApiResult<User> {
  Ok(Envelope::ok(current.user))
}

/// `PUT /me`
pub async fn update_me<B: Backend>(
  State(state): State<AppState<B>>,
  current: CurrentUser,
  Json(update): Json<ProfileUpdate>,
) -> ApiResult<User> {
  let user = state
    .store
    .update_profile(current.user.user_id, update)
    .await
    .map_err(ApiError::store)?;
  Ok(Envelope::ok(user))
}

#[derive(Debug, Deserialize)]
pub struct TemplateChoice {
  pub template_id: String,
}

/// `PUT /me/template`
///
/// Free templates are always selectable; a premium one needs access to it.
pub async fn select_template<B: Backend>(
  State(state): State<AppState<B>>,
  current: CurrentUser,
  Json(choice): Json<TemplateChoice>,
) -> ApiResult<User> {
  let template: TemplateId = choice
    .template_id
    .trim()
    .parse()
    .map_err(|_| ApiError::Validation(format!("unknown template: {:?}", choice.template_id)))?;

  if template.is_premium() {
    let decision =
      decision_for(&*state.store, current.user.user_id, Subject::Template(template)).await?;
    if !decision.has_access {
      return Err(ApiError::Forbidden(format!(
        "{} is a premium template; start a trial to use it",
        template.display_name()
      )));
    }
  }

  let user = state
    .store
    .set_template(current.user.user_id, template)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(user_id = %user.user_id, %template, "template selected");
  Ok(Envelope::ok(user))
}
