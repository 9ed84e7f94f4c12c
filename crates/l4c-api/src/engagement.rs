//! Conversations and testimonials.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/me/conversations` | Newest first |
//! | `GET`    | `/me/testimonials` | All, approved or not |
//! | `POST`   | `/me/testimonials/{id}/approve` | |
//! | `DELETE` | `/me/testimonials/{id}` | 204 |
//! | `POST`   | `/testimonials` | Public; lands unapproved |
//! | `POST`   | `/conversations` | Records a finished call |
//! | `POST`   | `/webhooks/vapi` | Provider callback; only end-of-call reports are stored |

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use l4c_core::{
  engagement::{CallRecord, Conversation, NewConversation, NewTestimonial, Testimonial},
  store::PortfolioStore,
  subscription::Subject,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
  AppState, Backend,
  auth::CurrentUser,
  error::{ApiError, ApiResult, Envelope},
};

// ─── Owner views ─────────────────────────────────────────────────────────────

/// `GET /me/conversations`
pub async fn list_conversations<B: Backend>(
  State(state): State<AppState<B>>,
  current: CurrentUser,
) -> ApiResult<Vec<Conversation>> {
  let conversations = state
    .store
    .list_conversations(current.user.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Envelope::ok(conversations))
}

/// `GET /me/testimonials`
pub async fn list_testimonials<B: Backend>(
  State(state): State<AppState<B>>,
  current: CurrentUser,
) -> ApiResult<Vec<Testimonial>> {
  let testimonials = state
    .store
    .list_testimonials(current.user.user_id, false)
    .await
    .map_err(ApiError::store)?;
  Ok(Envelope::ok(testimonials))
}

/// `POST /me/testimonials/{id}/approve`
pub async fn approve_testimonial<B: Backend>(
  State(state): State<AppState<B>>,
  current: CurrentUser,
  Path(testimonial_id): Path<Uuid>,
) -> ApiResult<Testimonial> {
  let testimonial = state
    .store
    .approve_testimonial(current.user.user_id, testimonial_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Envelope::ok(testimonial))
}

/// `DELETE /me/testimonials/{id}`
pub async fn delete_testimonial<B: Backend>(
  State(state): State<AppState<B>>,
  current: CurrentUser,
  Path(testimonial_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  state
    .store
    .delete_testimonial(current.user.user_id, testimonial_id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Public testimonial submission ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubmitTestimonial {
  /// Whose portfolio the testimonial is for.
  pub username:       String,
  pub author_name:    String,
  pub author_title:   Option<String>,
  pub author_company: Option<String>,
  pub content:        String,
  pub rating:         u8,
}

/// `POST /testimonials`
pub async fn submit_testimonial<B: Backend>(
  State(state): State<AppState<B>>,
  Json(body): Json<SubmitTestimonial>,
) -> Result<impl IntoResponse, ApiError> {
  let owner = state
    .store
    .find_user_by_username(body.username.trim())
    .await
    .map_err(ApiError::store)?
    .filter(|u| u.is_public)
    .ok_or_else(|| ApiError::NotFound(format!("no public profile {:?}", body.username)))?;

  let input = NewTestimonial {
    user_id:        owner.user_id,
    author_name:    body.author_name,
    author_title:   body.author_title.filter(|s| !s.trim().is_empty()),
    author_company: body.author_company.filter(|s| !s.trim().is_empty()),
    content:        body.content,
    rating:         body.rating,
  }
  .validate()?;

  let testimonial = state
    .store
    .add_testimonial(input)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    user_id = %owner.user_id,
    testimonial_id = %testimonial.testimonial_id,
    "testimonial submitted for approval"
  );
  Ok(Envelope::created(testimonial))
}

// ─── Recording calls ─────────────────────────────────────────────────────────

/// A finished call as reported by the widget or the provider webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct CallReport {
  /// The provider's assistant id.
  pub assistant_id:     String,
  pub call_id:          String,
  #[serde(default)]
  pub duration_seconds: i64,
  pub transcript:       Option<String>,
  pub summary:          Option<String>,
  pub ended_reason:     Option<String>,
}

/// Store a call against its assistant's owner, counting one unit of usage.
///
/// A call that was already recorded is returned as-is without counting
/// again.
async fn record_call<S: PortfolioStore>(
  store: &S,
  report: CallReport,
) -> Result<Conversation, ApiError> {
  let assistant = store
    .find_assistant_by_remote_id(report.assistant_id.trim())
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("unknown assistant {:?}", report.assistant_id)))?;

  let input = NewConversation {
    user_id:          assistant.user_id,
    call_id:          report.call_id,
    duration_seconds: report.duration_seconds,
    transcript:       report.transcript.filter(|s| !s.trim().is_empty()),
    summary:          report.summary.filter(|s| !s.trim().is_empty()),
    ended_reason:     report.ended_reason,
  }
  .validate()?;

  let record = store
    .record_conversation_with_usage(input, Subject::VoiceAssistant)
    .await
    .map_err(ApiError::store)?;

  match record {
    CallRecord::Recorded { conversation, usage } => {
      tracing::info!(
        user_id = %conversation.user_id,
        call_id = %conversation.call_id,
        usage_count = usage.as_ref().map(|u| u.usage_count),
        "conversation recorded"
      );
      Ok(conversation)
    }
    CallRecord::Duplicate(conversation) => {
      tracing::debug!(call_id = %conversation.call_id, "call already recorded");
      Ok(conversation)
    }
  }
}

/// `POST /conversations`
pub async fn record_conversation<B: Backend>(
  State(state): State<AppState<B>>,
  Json(report): Json<CallReport>,
) -> ApiResult<Conversation> {
  let conversation = record_call(&*state.store, report).await?;
  Ok(Envelope::ok(conversation))
}

// ─── Provider webhook ────────────────────────────────────────────────────────

pub const WEBHOOK_SECRET_HEADER: &str = "x-vapi-secret";

const END_OF_CALL_REPORT: &str = "end-of-call-report";

#[derive(Debug, Serialize)]
pub struct WebhookAck {
  pub received:     String,
  pub conversation: Option<Conversation>,
}

/// Pull a [`CallReport`] out of an `end-of-call-report` message.
fn call_report(message: &Value) -> Result<CallReport, ApiError> {
  let text = |paths: &[&str]| {
    paths
      .iter()
      .find_map(|p| message.pointer(p).and_then(Value::as_str))
      .map(str::to_owned)
  };

  let call_id = text(&["/call/id"])
    .ok_or_else(|| ApiError::Validation("webhook is missing call.id".into()))?;
  let assistant_id = text(&["/call/assistantId", "/assistant/id"])
    .ok_or_else(|| ApiError::Validation("webhook is missing the assistant id".into()))?;
  let duration_seconds = message
    .get("durationSeconds")
    .and_then(Value::as_f64)
    .map_or(0, |d| d.round() as i64);

  Ok(CallReport {
    assistant_id,
    call_id,
    duration_seconds,
    transcript: text(&["/artifact/transcript", "/transcript"]),
    summary: text(&["/analysis/summary", "/summary"]),
    ended_reason: text(&["/endedReason"]),
  })
}

/// `POST /webhooks/vapi`
///
/// Every message type is acknowledged; only end-of-call reports are stored.
pub async fn vapi_webhook<B: Backend>(
  State(state): State<AppState<B>>,
  headers: HeaderMap,
  Json(payload): Json<Value>,
) -> ApiResult<WebhookAck> {
  if let Some(expected) = state.config.vapi_webhook_secret.as_deref() {
    let given = headers
      .get(WEBHOOK_SECRET_HEADER)
      .and_then(|v| v.to_str().ok());
    if given != Some(expected) {
      tracing::warn!("webhook rejected: bad or missing secret");
      return Err(ApiError::Unauthorized);
    }
  }

  let message = payload.get("message").unwrap_or(&payload);
  let kind = message
    .get("type")
    .and_then(Value::as_str)
    .unwrap_or_default()
    .to_owned();

  if kind != END_OF_CALL_REPORT {
    tracing::debug!(%kind, "webhook acknowledged");
    return Ok(Envelope::ok(WebhookAck { received: kind, conversation: None }));
  }

  let conversation = record_call(&*state.store, call_report(message)?).await?;
  Ok(Envelope::ok(WebhookAck { received: kind, conversation: Some(conversation) }))
}
