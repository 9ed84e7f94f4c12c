//! The `PortfolioStore` trait: the database boundary.
//!
//! The trait is implemented by storage backends (e.g. `l4c-store-sqlite`).
//! Higher layers (`l4c-api`, `l4c-server`) depend on this abstraction, not on
//! any concrete backend. Uniqueness, atomic counters and all-or-nothing batch
//! inserts are the backend's responsibility.

use std::future::Future;

use uuid::Uuid;

use crate::{
  assistant::VoiceAssistant,
  engagement::{CallRecord, Conversation, NewConversation, NewTestimonial, Testimonial},
  link::{Link, LinkCategory, LinkUpdate, NewLink},
  profile::{NewUser, ProfileUpdate, Session, User},
  subscription::{NewTrial, Subject, Subscription},
  template::TemplateId,
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Backend-independent classification of a store failure, so callers can
/// choose a response without knowing the backend's error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  /// A trial was requested for a subject that already has a row.
  AlreadyUsed,
  /// A uniqueness constraint other than the trial one.
  Conflict,
  QuotaExceeded,
  Invalid,
  Internal,
}

pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> ErrorKind;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Link4Coders database backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait PortfolioStore: Send + Sync {
  type Error: StoreError;

  // ── Users and sessions ────────────────────────────────────────────────

  /// Fails with [`ErrorKind::Conflict`] if the email or username is taken.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn find_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// The user with `email` and their stored password hash.
  fn find_credentials<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<(User, String)>, Self::Error>> + Send + 'a;

  fn update_profile(
    &self,
    user_id: Uuid,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn set_template(
    &self,
    user_id: Uuid,
    template: TemplateId,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn create_session(
    &self,
    session: Session,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn find_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + 'a;

  /// Revoking an unknown session is not an error.
  fn revoke_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Links ─────────────────────────────────────────────────────────────

  /// Insert one link. A `None` position appends to the category.
  fn add_link(
    &self,
    input: NewLink,
  ) -> impl Future<Output = Result<Link, Self::Error>> + Send + '_;

  /// All of a user's links, ordered by category then position.
  fn list_links(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Link>, Self::Error>> + Send + '_;

  fn update_link(
    &self,
    user_id: Uuid,
    link_id: Uuid,
    update: LinkUpdate,
  ) -> impl Future<Output = Result<Link, Self::Error>> + Send + '_;

  fn delete_link(
    &self,
    user_id: Uuid,
    link_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The highest position in `category`, or `None` if it has no links.
  fn max_position(
    &self,
    user_id: Uuid,
    category: LinkCategory,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;

  /// Insert a batch of links in one transaction: either every row is
  /// written or none is.
  fn insert_links(
    &self,
    links: Vec<NewLink>,
  ) -> impl Future<Output = Result<Vec<Link>, Self::Error>> + Send + '_;

  /// Atomically add one to a link's click counter and return the new
  /// count. Fails with [`ErrorKind::NotFound`] for an unknown link.
  fn increment_clicks(
    &self,
    link_id: Uuid,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  // ── Subscriptions ─────────────────────────────────────────────────────

  fn get_subscription(
    &self,
    user_id: Uuid,
    subject: Subject,
  ) -> impl Future<Output = Result<Option<Subscription>, Self::Error>> + Send + '_;

  /// Create the trial row. Fails with [`ErrorKind::AlreadyUsed`] if any row
  /// exists for (user, subject), whatever its status.
  fn start_trial(
    &self,
    trial: NewTrial,
  ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send + '_;

  /// Add one unit of usage. Returns `Ok(None)` without writing when no row
  /// exists; fails with [`ErrorKind::QuotaExceeded`] when the row is at its
  /// limit.
  fn record_usage(
    &self,
    user_id: Uuid,
    subject: Subject,
  ) -> impl Future<Output = Result<Option<Subscription>, Self::Error>> + Send + '_;

  // ── Voice assistant ───────────────────────────────────────────────────

  fn get_assistant(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<VoiceAssistant>, Self::Error>> + Send + '_;

  fn find_assistant_by_remote_id<'a>(
    &'a self,
    remote_id: &'a str,
  ) -> impl Future<Output = Result<Option<VoiceAssistant>, Self::Error>> + Send + 'a;

  /// Insert or replace the user's single assistant.
  fn save_assistant(
    &self,
    assistant: VoiceAssistant,
  ) -> impl Future<Output = Result<VoiceAssistant, Self::Error>> + Send + '_;

  // ── Conversations ─────────────────────────────────────────────────────

  /// Store a conversation and count one unit of `subject` usage for its
  /// owner in a single transaction.
  ///
  /// A call id that is already stored comes back as
  /// [`CallRecord::Duplicate`] and counts nothing. Fails with
  /// [`ErrorKind::QuotaExceeded`], writing nothing, when the owner's row is
  /// at its limit.
  fn record_conversation_with_usage(
    &self,
    input: NewConversation,
    subject: Subject,
  ) -> impl Future<Output = Result<CallRecord, Self::Error>> + Send + '_;

  fn find_conversation<'a>(
    &'a self,
    call_id: &'a str,
  ) -> impl Future<Output = Result<Option<Conversation>, Self::Error>> + Send + 'a;

  /// Newest first.
  fn list_conversations(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Conversation>, Self::Error>> + Send + '_;

  // ── Testimonials ──────────────────────────────────────────────────────

  fn add_testimonial(
    &self,
    input: NewTestimonial,
  ) -> impl Future<Output = Result<Testimonial, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_testimonials(
    &self,
    user_id: Uuid,
    approved_only: bool,
  ) -> impl Future<Output = Result<Vec<Testimonial>, Self::Error>> + Send + '_;

  fn approve_testimonial(
    &self,
    user_id: Uuid,
    testimonial_id: Uuid,
  ) -> impl Future<Output = Result<Testimonial, Self::Error>> + Send + '_;

  fn delete_testimonial(
    &self,
    user_id: Uuid,
    testimonial_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
