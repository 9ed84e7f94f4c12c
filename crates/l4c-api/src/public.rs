//! The public portfolio: everything a visitor sees, assembled into a
//! [`PortfolioView`]. The JSON route serves it directly; the server renders
//! the same view as HTML.

use axum::extract::{Path, State};
use l4c_core::{
  access::{effective_template, evaluate_access},
  store::PortfolioStore,
  subscription::Subject,
  template::TemplateId,
  view::{PortfolioView, PublicProfile, WidgetConfig, group_links},
};

use crate::{
  AppState, Backend,
  access::decision_for,
  error::{ApiError, ApiResult, Envelope},
};

/// Assemble the public view of `username`'s portfolio.
///
/// A missing or private profile is [`ApiError::NotFound`]. A premium
/// template the owner no longer has access to renders as the default one.
pub async fn build_view<B: Backend>(
  state: &AppState<B>,
  username: &str,
) -> Result<PortfolioView, ApiError> {
  let store = &*state.store;
  let user = store
    .find_user_by_username(&username.trim().to_ascii_lowercase())
    .await
    .map_err(ApiError::store)?
    .filter(|u| u.is_public)
    .ok_or_else(|| ApiError::NotFound(format!("no public profile {username:?}")))?;

  let stored = TemplateId::resolve(&user.template_id);
  let template_access = if stored.is_premium() {
    Some(decision_for(store, user.user_id, Subject::Template(stored)).await?)
  } else {
    None
  };
  let template = effective_template(&user.template_id, template_access.as_ref());

  let links = store.list_links(user.user_id).await.map_err(ApiError::store)?;
  let testimonials = store
    .list_testimonials(user.user_id, true)
    .await
    .map_err(ApiError::store)?;

  Ok(PortfolioView {
    template,
    profile: PublicProfile::from(&user),
    groups: group_links(links),
    testimonials,
    assistant: widget(state, user.user_id).await?,
  })
}

/// The voice widget, if the owner's assistant can take calls right now.
async fn widget<B: Backend>(
  state: &AppState<B>,
  user_id: uuid::Uuid,
) -> Result<Option<WidgetConfig>, ApiError> {
  let Some(public_key) = state.config.vapi_public_key.clone() else {
    return Ok(None);
  };
  let Some(assistant) = state
    .store
    .get_assistant(user_id)
    .await
    .map_err(ApiError::store)?
    .filter(|a| a.is_active && a.is_provisioned())
  else {
    return Ok(None);
  };

  let row = state
    .store
    .get_subscription(user_id, Subject::VoiceAssistant)
    .await
    .map_err(ApiError::store)?;
  let access = evaluate_access(row.as_ref(), chrono::Utc::now());
  if !access.has_access || !access.usage_available() {
    return Ok(None);
  }

  Ok(Some(WidgetConfig { assistant_id: assistant.remote_id, public_key }))
}

/// `GET /public/{username}`
pub async fn profile<B: Backend>(
  State(state): State<AppState<B>>,
  Path(username): Path<String>,
) -> ApiResult<PortfolioView> {
  Ok(Envelope::ok(build_view(&state, &username).await?))
}
