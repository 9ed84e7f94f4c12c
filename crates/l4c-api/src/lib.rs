//! JSON REST API for Link4Coders.
//!
//! Exposes an axum [`Router`] backed by any [`Backend`]: a
//! [`PortfolioStore`] plus the two remote services. TLS, tracing layers and
//! the rendered public page are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", l4c_api::api_router(state.clone()))
//! ```

pub mod access;
pub mod account;
pub mod assistant;
pub mod auth;
pub mod engagement;
pub mod error;
pub mod links;
pub mod profile;
pub mod public;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use l4c_core::{
  assistant::AssistantDefaults,
  remote::{RepoSource, VoiceProvider},
  store::PortfolioStore,
};

pub use error::{ApiError, Envelope};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Settings the handlers consult at request time.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  /// Lifetime of a session created by sign-in.
  pub session_ttl:         chrono::Duration,
  pub assistant_defaults:  AssistantDefaults,
  /// Browser key embedded in public pages; no widget without it.
  pub vapi_public_key:     Option<String>,
  /// Expected `x-vapi-secret` header on webhooks; unchecked when `None`.
  pub vapi_webhook_secret: Option<String>,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      session_ttl:         chrono::Duration::days(30),
      assistant_defaults:  AssistantDefaults::default(),
      vapi_public_key:     None,
      vapi_webhook_secret: None,
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// The concrete collaborators one deployment runs with.
pub trait Backend: Send + Sync + 'static {
  type Store: PortfolioStore + 'static;
  type Repos: RepoSource + 'static;
  type Voice: VoiceProvider + 'static;
}

/// Shared state threaded through all axum handlers.
pub struct AppState<B: Backend> {
  pub store:  Arc<B::Store>,
  pub repos:  Arc<B::Repos>,
  pub voice:  Arc<B::Voice>,
  pub config: Arc<ApiConfig>,
}

impl<B: Backend> AppState<B> {
  pub fn new(store: B::Store, repos: B::Repos, voice: B::Voice, config: ApiConfig) -> Self {
    Self {
      store:  Arc::new(store),
      repos:  Arc::new(repos),
      voice:  Arc::new(voice),
      config: Arc::new(config),
    }
  }
}

impl<B: Backend> Clone for AppState<B> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      repos:  Arc::clone(&self.repos),
      voice:  Arc::clone(&self.voice),
      config: Arc::clone(&self.config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<B: Backend>(state: AppState<B>) -> Router<()> {
  Router::new()
    // Accounts
    .route("/auth/sign-up", post(account::sign_up::<B>))
    .route("/auth/sign-in", post(account::sign_in::<B>))
    .route("/auth/sign-out", post(account::sign_out::<B>))
    // Owner: profile and template
    .route("/me", get(profile::get_me::<B>).put(profile::update_me::<B>))
    .route("/me/template", put(profile::select_template::<B>))
    // Owner: links
    .route("/me/links", get(links::list::<B>).post(links::create::<B>))
    .route("/me/links/import", post(links::import::<B>))
    .route("/me/links/{id}", put(links::update::<B>).delete(links::remove::<B>))
    // Owner: access gate
    .route("/me/access/{subject}", get(access::check::<B>))
    .route("/me/access/{subject}/trial", post(access::start_trial::<B>))
    // Owner: assistant and engagement
    .route("/me/assistant", get(assistant::get_one::<B>).put(assistant::provision::<B>))
    .route("/me/conversations", get(engagement::list_conversations::<B>))
    .route("/me/testimonials", get(engagement::list_testimonials::<B>))
    .route("/me/testimonials/{id}", axum::routing::delete(engagement::delete_testimonial::<B>))
    .route("/me/testimonials/{id}/approve", post(engagement::approve_testimonial::<B>))
    // Public
    .route("/public/{username}", get(public::profile::<B>))
    .route("/testimonials", post(engagement::submit_testimonial::<B>))
    .route("/links/{id}/click", post(links::click::<B>))
    .route("/conversations", post(engagement::record_conversation::<B>))
    .route("/webhooks/vapi", post(engagement::vapi_webhook::<B>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
