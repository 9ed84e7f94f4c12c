//! The per-user voice assistant and the text it is configured with.
//!
//! A user has at most one assistant. Its `remote_id` is the voice provider's
//! identifier, or a local placeholder when the provider could not be reached
//! at creation time.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error,
  Result,
  link::Link,
  profile::User,
  remote::{AssistantPatch, AssistantSpec},
};

const PLACEHOLDER_PREFIX: &str = "local-";

/// A locally generated stand-in for a remote assistant id.
pub fn placeholder_id() -> String { format!("{PLACEHOLDER_PREFIX}{}", Uuid::new_v4()) }

pub fn is_placeholder(remote_id: &str) -> bool { remote_id.starts_with(PLACEHOLDER_PREFIX) }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceAssistant {
  pub assistant_id:   Uuid,
  pub user_id:        Uuid,
  pub remote_id:      String,
  pub name:           String,
  pub system_prompt:  String,
  pub first_message:  String,
  pub voice_provider: String,
  pub voice_id:       String,
  pub model:          String,
  pub temperature:    f32,
  pub is_active:      bool,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

impl VoiceAssistant {
  /// Whether the assistant exists at the provider (and can take calls).
  pub fn is_provisioned(&self) -> bool { !is_placeholder(&self.remote_id) }

  pub fn spec(&self) -> AssistantSpec {
    AssistantSpec {
      name:           self.name.clone(),
      system_prompt:  self.system_prompt.clone(),
      first_message:  self.first_message.clone(),
      voice_provider: self.voice_provider.clone(),
      voice_id:       self.voice_id.clone(),
      model:          self.model.clone(),
      temperature:    self.temperature,
    }
  }
}

/// Provider settings used when the owner does not choose their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantDefaults {
  pub voice_provider: String,
  pub voice_id:       String,
  pub model:          String,
  pub temperature:    f32,
}

impl Default for AssistantDefaults {
  fn default() -> Self {
    Self {
      voice_provider: "11labs".to_owned(),
      voice_id:       "burt".to_owned(),
      model:          "gpt-4o-mini".to_owned(),
      temperature:    0.7,
    }
  }
}

/// Owner-supplied overrides; anything left `None` is derived from the
/// profile or taken from [`AssistantDefaults`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantSettings {
  pub name:           Option<String>,
  pub system_prompt:  Option<String>,
  pub first_message:  Option<String>,
  pub voice_provider: Option<String>,
  pub voice_id:       Option<String>,
  pub model:          Option<String>,
  pub temperature:    Option<f32>,
  pub is_active:      Option<bool>,
}

impl AssistantSettings {
  pub fn validate(self) -> Result<Self> {
    if let Some(t) = self.temperature
      && !(0.0..=2.0).contains(&t)
    {
      return Err(Error::Validation(format!("temperature must be within 0..=2, got {t}")));
    }
    Ok(self)
  }
}

/// The instructions the assistant starts from: who it represents and what
/// it may talk about.
pub fn default_system_prompt(user: &User, links: &[Link]) -> String {
  let name = user.display_name();
  let mut prompt = format!(
    "You are the voice assistant on {name}'s developer portfolio. Answer visitors' \
     questions about {name}'s background, skills and projects in a friendly, concise way."
  );

  let mut facts = String::new();
  let fields = [
    ("Title", &user.profile_title),
    ("Company", &user.company),
    ("Location", &user.location),
    ("About", &user.bio),
    ("GitHub", &user.github_username),
    ("Website", &user.website),
  ];
  for (label, value) in fields {
    if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
      let _ = writeln!(facts, "- {label}: {v}");
    }
  }
  for link in links.iter().filter(|l| l.is_active) {
    let _ = writeln!(facts, "- {} link: {} ({})", link.category.heading(), link.title, link.url);
  }

  if !facts.is_empty() {
    prompt.push_str("\n\nWhat you know:\n");
    prompt.push_str(&facts);
  }
  prompt.push_str(
    "\nIf you don't know something, say so and suggest contacting them directly. \
     Never invent experience or credentials.",
  );
  prompt
}

pub fn default_first_message(user: &User) -> String {
  format!(
    "Hi! I'm {}'s AI assistant. Ask me anything about their work and projects.",
    user.display_name()
  )
}

/// The full configuration an assistant should have after applying
/// `settings` on top of `current` (or, for a new assistant, the profile
/// derived defaults).
pub fn resolve_spec(
  user: &User,
  links: &[Link],
  current: Option<&VoiceAssistant>,
  settings: &AssistantSettings,
  defaults: &AssistantDefaults,
) -> AssistantSpec {
  let base = match current {
    Some(a) => a.spec(),
    None => AssistantSpec {
      name:           format!("{} Assistant", user.display_name()),
      system_prompt:  default_system_prompt(user, links),
      first_message:  default_first_message(user),
      voice_provider: defaults.voice_provider.clone(),
      voice_id:       defaults.voice_id.clone(),
      model:          defaults.model.clone(),
      temperature:    defaults.temperature,
    },
  };

  let pick = |over: &Option<String>, base: String| {
    over
      .as_deref()
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_owned)
      .unwrap_or(base)
  };

  AssistantSpec {
    name:           pick(&settings.name, base.name),
    system_prompt:  pick(&settings.system_prompt, base.system_prompt),
    first_message:  pick(&settings.first_message, base.first_message),
    voice_provider: pick(&settings.voice_provider, base.voice_provider),
    voice_id:       pick(&settings.voice_id, base.voice_id),
    model:          pick(&settings.model, base.model),
    temperature:    settings.temperature.unwrap_or(base.temperature),
  }
}

/// The fields of `next` that differ from `current`.
///
/// The provider replaces its `model` and `voice` objects whole, so a change
/// to any field in one of those groups carries every field of the group.
pub fn patch_between(current: &AssistantSpec, next: &AssistantSpec) -> AssistantPatch {
  fn changed<T: PartialEq + Clone>(a: &T, b: &T) -> Option<T> {
    (a != b).then(|| b.clone())
  }
  let model_changed = current.system_prompt != next.system_prompt
    || current.model != next.model
    || current.temperature != next.temperature;
  let voice_changed =
    current.voice_provider != next.voice_provider || current.voice_id != next.voice_id;

  AssistantPatch {
    name:           changed(&current.name, &next.name),
    first_message:  changed(&current.first_message, &next.first_message),
    system_prompt:  model_changed.then(|| next.system_prompt.clone()),
    model:          model_changed.then(|| next.model.clone()),
    temperature:    model_changed.then_some(next.temperature),
    voice_provider: voice_changed.then(|| next.voice_provider.clone()),
    voice_id:       voice_changed.then(|| next.voice_id.clone()),
  }
}
