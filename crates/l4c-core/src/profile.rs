//! Users, their public profile fields, and authenticated sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// A registered user together with the profile shown on their public page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:         Uuid,
  pub email:           String,
  /// Public handle; the page lives at `/u/{username}`.
  pub username:        String,
  pub full_name:       Option<String>,
  pub profile_title:   Option<String>,
  pub bio:             Option<String>,
  pub avatar_url:      Option<String>,
  pub location:        Option<String>,
  pub website:         Option<String>,
  pub company:         Option<String>,
  pub github_username: Option<String>,
  /// Stored verbatim; resolved with [`crate::template::TemplateId::resolve`].
  pub template_id:     String,
  pub is_public:       bool,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

impl User {
  /// The name to greet visitors with.
  pub fn display_name(&self) -> &str {
    self
      .full_name
      .as_deref()
      .filter(|n| !n.trim().is_empty())
      .unwrap_or(&self.username)
  }
}

/// Input to [`crate::store::PortfolioStore::create_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub email:         String,
  pub username:      String,
  pub full_name:     Option<String>,
  /// argon2 PHC string; the plain password never reaches the store.
  pub password_hash: String,
}

/// Partial profile update; `None` leaves a field unchanged and an empty
/// string clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
  pub full_name:       Option<String>,
  pub profile_title:   Option<String>,
  pub bio:             Option<String>,
  pub avatar_url:      Option<String>,
  pub location:        Option<String>,
  pub website:         Option<String>,
  pub company:         Option<String>,
  pub github_username: Option<String>,
  pub is_public:       Option<bool>,
}

impl ProfileUpdate {
  /// Apply to `user`, stamping `updated_at` with `now`.
  pub fn apply(self, user: &mut User, now: DateTime<Utc>) {
    let set = |field: &mut Option<String>, value: Option<String>| {
      if let Some(v) = value {
        let v = v.trim();
        *field = (!v.is_empty()).then(|| v.to_owned());
      }
    };
    set(&mut user.full_name, self.full_name);
    set(&mut user.profile_title, self.profile_title);
    set(&mut user.bio, self.bio);
    set(&mut user.avatar_url, self.avatar_url);
    set(&mut user.location, self.location);
    set(&mut user.website, self.website);
    set(&mut user.company, self.company);
    set(&mut user.github_username, self.github_username);
    if let Some(public) = self.is_public {
      user.is_public = public;
    }
    user.updated_at = now;
  }
}

/// A signed-in session. The bearer token itself is never stored; only its
/// SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub token_hash: String,
  pub user_id:    Uuid,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

impl Session {
  pub fn is_live(&self, now: DateTime<Utc>) -> bool { now < self.expires_at }
}

/// Usernames are lowercase `[a-z0-9_-]`, 3 to 32 characters.
pub fn normalize_username(raw: &str) -> Result<String> {
  let name = raw.trim().to_ascii_lowercase();
  let valid_chars = name
    .chars()
    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
  if !(3..=32).contains(&name.len()) || !valid_chars {
    return Err(Error::Validation(format!(
      "username must be 3-32 characters of a-z, 0-9, '_' or '-': {raw:?}"
    )));
  }
  Ok(name)
}

pub fn normalize_email(raw: &str) -> Result<String> {
  let email = raw.trim().to_ascii_lowercase();
  match email.split_once('@') {
    Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
    _ => Err(Error::Validation(format!("invalid email address: {raw:?}"))),
  }
}
