//! Boundaries to the external HTTP services: the public code host that
//! repositories are imported from, and the voice-assistant provider.
//!
//! Implemented by `l4c-remote`; tests substitute in-memory fakes.

use std::future::Future;

use serde::{Deserialize, Serialize};

/// A repository as listed by the code host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRecord {
  pub id:          i64,
  pub name:        String,
  pub description: Option<String>,
  /// Browser URL of the repository.
  pub url:         String,
  pub language:    Option<String>,
  pub stars:       i64,
  pub forks:       i64,
  pub topics:      Vec<String>,
  pub owner:       String,
}

/// Whether `name` is a valid GitHub login: 1 to 39 ASCII letters, digits or
/// hyphens, with no leading, trailing or doubled hyphen.
pub fn is_github_username(name: &str) -> bool {
  (1..=39).contains(&name.len())
    && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    && !name.starts_with('-')
    && !name.ends_with('-')
    && !name.contains("--")
}

/// Read-only listing of a user's public repositories.
pub trait RepoSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All public repositories owned by `username`, following pagination.
  fn list_repos<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Vec<RepoRecord>, Self::Error>> + Send + 'a;
}

/// Everything needed to create a remote voice assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantSpec {
  pub name:           String,
  pub system_prompt:  String,
  pub first_message:  String,
  pub voice_provider: String,
  pub voice_id:       String,
  pub model:          String,
  pub temperature:    f32,
}

/// Fields to change on an existing remote assistant; `None` is left as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantPatch {
  pub name:           Option<String>,
  pub system_prompt:  Option<String>,
  pub first_message:  Option<String>,
  pub voice_provider: Option<String>,
  pub voice_id:       Option<String>,
  pub model:          Option<String>,
  pub temperature:    Option<f32>,
}

impl AssistantPatch {
  pub fn is_empty(&self) -> bool { *self == Self::default() }
}

/// The provider's handle for a created assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAssistant {
  pub id: String,
}

/// Creation and update of hosted voice assistants.
pub trait VoiceProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn create_assistant<'a>(
    &'a self,
    spec: &'a AssistantSpec,
  ) -> impl Future<Output = Result<RemoteAssistant, Self::Error>> + Send + 'a;

  fn update_assistant<'a>(
    &'a self,
    id: &'a str,
    patch: &'a AssistantPatch,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
