//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings with microsecond precision
//! and a `Z` suffix. UUIDs are stored as hyphenated lowercase strings.
//! Repository metadata is stored as compact JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use l4c_core::{
  assistant::VoiceAssistant,
  engagement::{Conversation, Testimonial},
  link::{Link, LinkCategory, RepoMetadata},
  profile::{Session, User},
  subscription::{Subject, Subscription, SubscriptionStatus},
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

pub fn encode_metadata(m: Option<&RepoMetadata>) -> Result<Option<String>> {
  Ok(m.map(serde_json::to_string).transpose()?)
}

fn decode_metadata(s: Option<String>) -> Result<Option<RepoMetadata>> {
  Ok(s.as_deref().map(serde_json::from_str).transpose()?)
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "user_id, email, username, full_name, profile_title, bio, \
   avatar_url, location, website, company, github_username, template_id, is_public, \
   created_at, updated_at";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:         String,
  pub email:           String,
  pub username:        String,
  pub full_name:       Option<String>,
  pub profile_title:   Option<String>,
  pub bio:             Option<String>,
  pub avatar_url:      Option<String>,
  pub location:        Option<String>,
  pub website:         Option<String>,
  pub company:         Option<String>,
  pub github_username: Option<String>,
  pub template_id:     String,
  pub is_public:       bool,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawUser {
  /// Read the [`USER_COLUMNS`] starting at column `offset`.
  pub fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:         row.get(offset)?,
      email:           row.get(offset + 1)?,
      username:        row.get(offset + 2)?,
      full_name:       row.get(offset + 3)?,
      profile_title:   row.get(offset + 4)?,
      bio:             row.get(offset + 5)?,
      avatar_url:      row.get(offset + 6)?,
      location:        row.get(offset + 7)?,
      website:         row.get(offset + 8)?,
      company:         row.get(offset + 9)?,
      github_username: row.get(offset + 10)?,
      template_id:     row.get(offset + 11)?,
      is_public:       row.get(offset + 12)?,
      created_at:      row.get(offset + 13)?,
      updated_at:      row.get(offset + 14)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:         decode_uuid(&self.user_id)?,
      email:           self.email,
      username:        self.username,
      full_name:       self.full_name,
      profile_title:   self.profile_title,
      bio:             self.bio,
      avatar_url:      self.avatar_url,
      location:        self.location,
      website:         self.website,
      company:         self.company,
      github_username: self.github_username,
      template_id:     self.template_id,
      is_public:       self.is_public,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Sessions ────────────────────────────────────────────────────────────────

pub struct RawSession {
  pub token_hash: String,
  pub user_id:    String,
  pub created_at: String,
  pub expires_at: String,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      token_hash: self.token_hash,
      user_id:    decode_uuid(&self.user_id)?,
      created_at: decode_dt(&self.created_at)?,
      expires_at: decode_dt(&self.expires_at)?,
    })
  }
}

// ─── Links ───────────────────────────────────────────────────────────────────

pub const LINK_COLUMNS: &str = "link_id, user_id, title, url, description, category, icon, \
   position, is_active, click_count, metadata, created_at";

pub struct RawLink {
  pub link_id:     String,
  pub user_id:     String,
  pub title:       String,
  pub url:         String,
  pub description: Option<String>,
  pub category:    String,
  pub icon:        Option<String>,
  pub position:    i64,
  pub is_active:   bool,
  pub click_count: i64,
  pub metadata:    Option<String>,
  pub created_at:  String,
}

impl RawLink {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      link_id:     row.get(0)?,
      user_id:     row.get(1)?,
      title:       row.get(2)?,
      url:         row.get(3)?,
      description: row.get(4)?,
      category:    row.get(5)?,
      icon:        row.get(6)?,
      position:    row.get(7)?,
      is_active:   row.get(8)?,
      click_count: row.get(9)?,
      metadata:    row.get(10)?,
      created_at:  row.get(11)?,
    })
  }

  pub fn into_link(self) -> Result<Link> {
    Ok(Link {
      link_id:     decode_uuid(&self.link_id)?,
      user_id:     decode_uuid(&self.user_id)?,
      title:       self.title,
      url:         self.url,
      description: self.description,
      category:    self
        .category
        .parse::<LinkCategory>()
        .map_err(|_| l4c_core::Error::UnknownCategory(self.category.clone()))?,
      icon:        self.icon,
      position:    self.position,
      is_active:   self.is_active,
      click_count: self.click_count,
      metadata:    decode_metadata(self.metadata)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

// ─── Subscriptions ───────────────────────────────────────────────────────────

pub const SUBSCRIPTION_COLUMNS: &str = "subscription_id, user_id, subject, status, \
   trial_start, trial_end, subscription_end, usage_count, usage_limit, created_at";

pub struct RawSubscription {
  pub subscription_id:  String,
  pub user_id:          String,
  pub subject:          String,
  pub status:           String,
  pub trial_start:      Option<String>,
  pub trial_end:        Option<String>,
  pub subscription_end: Option<String>,
  pub usage_count:      i64,
  pub usage_limit:      i64,
  pub created_at:       String,
}

impl RawSubscription {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subscription_id:  row.get(0)?,
      user_id:          row.get(1)?,
      subject:          row.get(2)?,
      status:           row.get(3)?,
      trial_start:      row.get(4)?,
      trial_end:        row.get(5)?,
      subscription_end: row.get(6)?,
      usage_count:      row.get(7)?,
      usage_limit:      row.get(8)?,
      created_at:       row.get(9)?,
    })
  }

  pub fn into_subscription(self) -> Result<Subscription> {
    Ok(Subscription {
      subscription_id:  decode_uuid(&self.subscription_id)?,
      user_id:          decode_uuid(&self.user_id)?,
      subject:          self.subject.parse::<Subject>()?,
      status:           self.status.parse::<SubscriptionStatus>()?,
      trial_start:      decode_opt_dt(self.trial_start)?,
      trial_end:        decode_opt_dt(self.trial_end)?,
      subscription_end: decode_opt_dt(self.subscription_end)?,
      usage_count:      self.usage_count,
      usage_limit:      self.usage_limit,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

// ─── Voice assistants ────────────────────────────────────────────────────────

pub const ASSISTANT_COLUMNS: &str = "assistant_id, user_id, remote_id, name, system_prompt, \
   first_message, voice_provider, voice_id, model, temperature, is_active, created_at, \
   updated_at";

pub struct RawAssistant {
  pub assistant_id:   String,
  pub user_id:        String,
  pub remote_id:      String,
  pub name:           String,
  pub system_prompt:  String,
  pub first_message:  String,
  pub voice_provider: String,
  pub voice_id:       String,
  pub model:          String,
  pub temperature:    f64,
  pub is_active:      bool,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawAssistant {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      assistant_id:   row.get(0)?,
      user_id:        row.get(1)?,
      remote_id:      row.get(2)?,
      name:           row.get(3)?,
      system_prompt:  row.get(4)?,
      first_message:  row.get(5)?,
      voice_provider: row.get(6)?,
      voice_id:       row.get(7)?,
      model:          row.get(8)?,
      temperature:    row.get(9)?,
      is_active:      row.get(10)?,
      created_at:     row.get(11)?,
      updated_at:     row.get(12)?,
    })
  }

  pub fn into_assistant(self) -> Result<VoiceAssistant> {
    Ok(VoiceAssistant {
      assistant_id:   decode_uuid(&self.assistant_id)?,
      user_id:        decode_uuid(&self.user_id)?,
      remote_id:      self.remote_id,
      name:           self.name,
      system_prompt:  self.system_prompt,
      first_message:  self.first_message,
      voice_provider: self.voice_provider,
      voice_id:       self.voice_id,
      model:          self.model,
      temperature:    self.temperature as f32,
      is_active:      self.is_active,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Conversations ───────────────────────────────────────────────────────────

pub const CONVERSATION_COLUMNS: &str = "conversation_id, user_id, call_id, duration_seconds, \
   transcript, summary, ended_reason, created_at";

pub struct RawConversation {
  pub conversation_id:  String,
  pub user_id:          String,
  pub call_id:          String,
  pub duration_seconds: i64,
  pub transcript:       Option<String>,
  pub summary:          Option<String>,
  pub ended_reason:     Option<String>,
  pub created_at:       String,
}

impl RawConversation {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      conversation_id:  row.get(0)?,
      user_id:          row.get(1)?,
      call_id:          row.get(2)?,
      duration_seconds: row.get(3)?,
      transcript:       row.get(4)?,
      summary:          row.get(5)?,
      ended_reason:     row.get(6)?,
      created_at:       row.get(7)?,
    })
  }

  pub fn into_conversation(self) -> Result<Conversation> {
    Ok(Conversation {
      conversation_id:  decode_uuid(&self.conversation_id)?,
      user_id:          decode_uuid(&self.user_id)?,
      call_id:          self.call_id,
      duration_seconds: self.duration_seconds,
      transcript:       self.transcript,
      summary:          self.summary,
      ended_reason:     self.ended_reason,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

// ─── Testimonials ────────────────────────────────────────────────────────────

pub const TESTIMONIAL_COLUMNS: &str = "testimonial_id, user_id, author_name, author_title, \
   author_company, content, rating, is_approved, created_at";

pub struct RawTestimonial {
  pub testimonial_id: String,
  pub user_id:        String,
  pub author_name:    String,
  pub author_title:   Option<String>,
  pub author_company: Option<String>,
  pub content:        String,
  pub rating:         i64,
  pub is_approved:    bool,
  pub created_at:     String,
}

impl RawTestimonial {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      testimonial_id: row.get(0)?,
      user_id:        row.get(1)?,
      author_name:    row.get(2)?,
      author_title:   row.get(3)?,
      author_company: row.get(4)?,
      content:        row.get(5)?,
      rating:         row.get(6)?,
      is_approved:    row.get(7)?,
      created_at:     row.get(8)?,
    })
  }

  pub fn into_testimonial(self) -> Result<Testimonial> {
    Ok(Testimonial {
      testimonial_id: decode_uuid(&self.testimonial_id)?,
      user_id:        decode_uuid(&self.user_id)?,
      author_name:    self.author_name,
      author_title:   self.author_title,
      author_company: self.author_company,
      content:        self.content,
      rating:         u8::try_from(self.rating).map_err(|_| {
        l4c_core::Error::Validation(format!("stored rating out of range: {}", self.rating))
      })?,
      is_approved:    self.is_approved,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}
