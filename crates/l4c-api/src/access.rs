//! Handlers for the access gate.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/me/access/{subject}` | Current [`AccessDecision`] |
//! | `POST` | `/me/access/{subject}/trial` | Starts the one-time 7 day trial |
//!
//! `{subject}` is `voice_assistant` or a premium template id.

use axum::{
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use l4c_core::{
  access::{AccessDecision, evaluate_access},
  store::PortfolioStore,
  subscription::{NewTrial, Subject, Subscription},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  AppState, Backend,
  auth::CurrentUser,
  error::{ApiError, ApiResult, Envelope},
};

/// The access decision for `user_id` on `subject` right now.
pub async fn decision_for<S: PortfolioStore>(
  store: &S,
  user_id: Uuid,
  subject: Subject,
) -> Result<AccessDecision, ApiError> {
  let row = store
    .get_subscription(user_id, subject)
    .await
    .map_err(ApiError::store)?;
  Ok(evaluate_access(row.as_ref(), Utc::now()))
}

fn parse_subject(raw: &str) -> Result<Subject, ApiError> { Ok(raw.parse::<Subject>()?) }

/// `GET /me/access/{subject}`
pub async fn check<B: Backend>(
  State(state): State<AppState<B>>,
  current: CurrentUser,
  Path(subject): Path<String>,
) -> ApiResult<AccessDecision> {
  let subject = parse_subject(&subject)?;
  let decision = decision_for(&*state.store, current.user.user_id, subject).await?;
  Ok(Envelope::ok(decision))
}

#[derive(Debug, Serialize)]
pub struct TrialStarted {
  pub subscription: Subscription,
  pub access:       AccessDecision,
}

/// `POST /me/access/{subject}/trial`
pub async fn start_trial<B: Backend>(
  State(state): State<AppState<B>>,
  current: CurrentUser,
  Path(subject): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  let subject = parse_subject(&subject)?;
  if !subject.is_gated() {
    return Err(ApiError::Validation(format!("{subject} is free and needs no trial")));
  }

  let now = Utc::now();
  let subscription = state
    .store
    .start_trial(NewTrial::starting(current.user.user_id, subject, now))
    .await
    .map_err(ApiError::store)?;
  let access = evaluate_access(Some(&subscription), now);

  tracing::info!(
    user_id = %current.user.user_id,
    %subject,
    trial_end = ?subscription.trial_end,
    "trial started"
  );
  Ok((StatusCode::CREATED, Envelope::ok(TrialStarted { subscription, access })))
}
