//! Visitor-generated records: testimonials left on a profile and voice
//! conversations held with a profile's assistant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, subscription::Subscription};

// ─── Testimonials ────────────────────────────────────────────────────────────

/// A testimonial is hidden from the public page until the owner approves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Testimonial {
  pub testimonial_id: Uuid,
  /// The profile owner the testimonial is about.
  pub user_id:        Uuid,
  pub author_name:    String,
  pub author_title:   Option<String>,
  pub author_company: Option<String>,
  pub content:        String,
  pub rating:         u8,
  pub is_approved:    bool,
  pub created_at:     DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTestimonial {
  pub user_id:        Uuid,
  pub author_name:    String,
  pub author_title:   Option<String>,
  pub author_company: Option<String>,
  pub content:        String,
  pub rating:         u8,
}

impl NewTestimonial {
  pub fn validate(mut self) -> Result<Self> {
    self.author_name = self.author_name.trim().to_owned();
    self.content = self.content.trim().to_owned();
    if self.author_name.is_empty() {
      return Err(Error::Validation("author name is required".into()));
    }
    if self.content.is_empty() {
      return Err(Error::Validation("testimonial content is required".into()));
    }
    if self.content.chars().count() > 2000 {
      return Err(Error::Validation("testimonial content exceeds 2000 characters".into()));
    }
    if !(1..=5).contains(&self.rating) {
      return Err(Error::Validation(format!("rating must be 1-5, got {}", self.rating)));
    }
    Ok(self)
  }
}

// ─── Conversations ───────────────────────────────────────────────────────────

/// One completed call with a user's voice assistant. Each conversation
/// consumes one unit of the `voice_assistant` usage quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
  pub conversation_id:  Uuid,
  pub user_id:          Uuid,
  /// The provider's call identifier; unique.
  pub call_id:          String,
  pub duration_seconds: i64,
  pub transcript:       Option<String>,
  pub summary:          Option<String>,
  pub ended_reason:     Option<String>,
  pub created_at:       DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewConversation {
  pub user_id:          Uuid,
  pub call_id:          String,
  pub duration_seconds: i64,
  pub transcript:       Option<String>,
  pub summary:          Option<String>,
  pub ended_reason:     Option<String>,
}

impl NewConversation {
  pub fn validate(mut self) -> Result<Self> {
    self.call_id = self.call_id.trim().to_owned();
    if self.call_id.is_empty() {
      return Err(Error::Validation("call id is required".into()));
    }
    if self.duration_seconds < 0 {
      return Err(Error::Validation("duration cannot be negative".into()));
    }
    Ok(self)
  }
}

/// What storing a call report did.
#[derive(Debug, Clone)]
pub enum CallRecord {
  /// A new conversation. `usage` is the owner's subscription after counting
  /// the call, or `None` when they have no row for the subject.
  Recorded {
    conversation: Conversation,
    usage:        Option<Subscription>,
  },
  /// The call id was already stored; nothing was written or counted.
  Duplicate(Conversation),
}

impl CallRecord {
  pub fn into_conversation(self) -> Conversation {
    match self {
      Self::Recorded { conversation, .. } | Self::Duplicate(conversation) => conversation,
    }
  }
}
