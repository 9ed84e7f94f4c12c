//! Subscriptions: one row per (user, gated subject).
//!
//! A row is created once, when the user starts a trial. Expiry is never
//! written back: it is computed at read time by [`crate::access`]. The
//! `active` and `cancelled` states are set by an external billing process.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, template::TemplateId};

/// Length of every trial.
pub const TRIAL_DAYS: i64 = 7;

/// Conversation quota granted with a voice-assistant trial.
pub const VOICE_ASSISTANT_USAGE_LIMIT: i64 = 50;

// ─── Subject ─────────────────────────────────────────────────────────────────

/// The gated thing a subscription row refers to.
///
/// Stored as `"voice_assistant"` or as the template identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Subject {
  VoiceAssistant,
  Template(TemplateId),
}

impl Subject {
  pub const VOICE_ASSISTANT: &'static str = "voice_assistant";

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::VoiceAssistant => Self::VOICE_ASSISTANT,
      Self::Template(id) => (*id).into(),
    }
  }

  /// Ceiling for `usage_count`; `0` means the subject is unmetered.
  pub fn usage_limit(&self) -> i64 {
    match self {
      Self::VoiceAssistant => VOICE_ASSISTANT_USAGE_LIMIT,
      Self::Template(_) => 0,
    }
  }

  /// Free templates are never gated, so a trial for them is meaningless.
  pub fn is_gated(&self) -> bool {
    match self {
      Self::VoiceAssistant => true,
      Self::Template(id) => id.is_premium(),
    }
  }
}

impl fmt::Display for Subject {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Subject {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s == Self::VOICE_ASSISTANT {
      return Ok(Self::VoiceAssistant);
    }
    s.parse::<TemplateId>()
      .map(Self::Template)
      .map_err(|_| Error::UnknownSubject(s.to_owned()))
  }
}

impl TryFrom<String> for Subject {
  type Error = Error;

  fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl From<Subject> for String {
  fn from(s: Subject) -> Self { s.as_str().to_owned() }
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
  Trial,
  Active,
  Expired,
  Cancelled,
}

impl SubscriptionStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Trial => "trial",
      Self::Active => "active",
      Self::Expired => "expired",
      Self::Cancelled => "cancelled",
    }
  }
}

impl FromStr for SubscriptionStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "trial" => Ok(Self::Trial),
      "active" => Ok(Self::Active),
      "expired" => Ok(Self::Expired),
      "cancelled" => Ok(Self::Cancelled),
      other => Err(Error::UnknownStatus(other.to_owned())),
    }
  }
}

// ─── Rows ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
  pub subscription_id:  Uuid,
  pub user_id:          Uuid,
  pub subject:          Subject,
  pub status:           SubscriptionStatus,
  /// Present only while `status = trial`.
  pub trial_start:      Option<DateTime<Utc>>,
  pub trial_end:        Option<DateTime<Utc>>,
  /// Present only while `status = active`.
  pub subscription_end: Option<DateTime<Utc>>,
  pub usage_count:      i64,
  pub usage_limit:      i64,
  pub created_at:       DateTime<Utc>,
}

/// Input to [`crate::store::PortfolioStore::start_trial`].
#[derive(Debug, Clone)]
pub struct NewTrial {
  pub user_id:     Uuid,
  pub subject:     Subject,
  pub trial_start: DateTime<Utc>,
  pub trial_end:   DateTime<Utc>,
  pub usage_limit: i64,
}

impl NewTrial {
  /// A trial for `subject` beginning at `now` and lasting [`TRIAL_DAYS`].
  pub fn starting(user_id: Uuid, subject: Subject, now: DateTime<Utc>) -> Self {
    Self {
      user_id,
      subject,
      trial_start: now,
      trial_end: now + Duration::days(TRIAL_DAYS),
      usage_limit: subject.usage_limit(),
    }
  }
}
