//! Handlers for the owner's voice assistant.
//!
//! `PUT /me/assistant` is the provisioner: it creates the assistant at the
//! voice provider on first use and pushes only changed fields afterwards.

use axum::{Json, extract::State};
use chrono::Utc;
use l4c_core::{
  access::AccessDecision,
  assistant::{
    AssistantSettings, VoiceAssistant, patch_between, placeholder_id, resolve_spec,
  },
  remote::VoiceProvider,
  store::PortfolioStore,
  subscription::Subject,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  AppState, Backend,
  access::decision_for,
  auth::CurrentUser,
  error::{ApiError, ApiResult, Envelope},
};

#[derive(Debug, Serialize)]
pub struct AssistantStatus {
  pub assistant: Option<VoiceAssistant>,
  pub access:    AccessDecision,
}

/// `GET /me/assistant`
pub async fn get_one<B: Backend>(
  State(state): State<AppState<B>>,
  current: CurrentUser,
) -> ApiResult<AssistantStatus> {
  let user_id = current.user.user_id;
  let assistant = state
    .store
    .get_assistant(user_id)
    .await
    .map_err(ApiError::store)?;
  let access = decision_for(&*state.store, user_id, Subject::VoiceAssistant).await?;
  Ok(Envelope::ok(AssistantStatus { assistant, access }))
}

#[derive(Debug, Serialize)]
pub struct Provisioned {
  pub assistant: VoiceAssistant,
  /// Set when the provider could not create the assistant and a local
  /// placeholder was stored instead. The next save retries creation.
  pub degraded:  bool,
}

/// `PUT /me/assistant`
pub async fn provision<B: Backend>(
  State(state): State<AppState<B>>,
  current: CurrentUser,
  Json(settings): Json<AssistantSettings>,
) -> ApiResult<Provisioned> {
  let settings = settings.validate()?;
  let user = current.user;

  let access = decision_for(&*state.store, user.user_id, Subject::VoiceAssistant).await?;
  if !access.has_access {
    return Err(ApiError::Forbidden(
      "the voice assistant needs an active trial or subscription".into(),
    ));
  }

  let current = state
    .store
    .get_assistant(user.user_id)
    .await
    .map_err(ApiError::store)?;
  let links = state
    .store
    .list_links(user.user_id)
    .await
    .map_err(ApiError::store)?;
  let spec = resolve_spec(
    &user,
    &links,
    current.as_ref(),
    &settings,
    &state.config.assistant_defaults,
  );

  let mut degraded = false;
  let remote_id = match current.as_ref().filter(|a| a.is_provisioned()) {
    Some(existing) => {
      let patch = patch_between(&existing.spec(), &spec);
      if !patch.is_empty() {
        state
          .voice
          .update_assistant(&existing.remote_id, &patch)
          .await
          .map_err(ApiError::upstream)?;
        tracing::info!(user_id = %user.user_id, remote_id = %existing.remote_id, "assistant updated");
      }
      existing.remote_id.clone()
    }
    None => match state.voice.create_assistant(&spec).await {
      Ok(remote) => {
        tracing::info!(user_id = %user.user_id, remote_id = %remote.id, "assistant created");
        remote.id
      }
      Err(e) => {
        tracing::warn!(
          user_id = %user.user_id,
          error = %e,
          "voice provider unavailable; storing a local placeholder"
        );
        degraded = true;
        placeholder_id()
      }
    },
  };

  let now = Utc::now();
  let assistant = VoiceAssistant {
    assistant_id: current.as_ref().map_or_else(Uuid::new_v4, |a| a.assistant_id),
    user_id: user.user_id,
    remote_id,
    name: spec.name,
    system_prompt: spec.system_prompt,
    first_message: spec.first_message,
    voice_provider: spec.voice_provider,
    voice_id: spec.voice_id,
    model: spec.model,
    temperature: spec.temperature,
    is_active: settings
      .is_active
      .or(current.as_ref().map(|a| a.is_active))
      .unwrap_or(true),
    created_at: current.as_ref().map_or(now, |a| a.created_at),
    updated_at: now,
  };
  let assistant = state
    .store
    .save_assistant(assistant)
    .await
    .map_err(ApiError::store)?;

  Ok(Envelope::ok(Provisioned { assistant, degraded }))
}
