//! Runtime configuration, read from `config.toml` and `L4C_*` environment
//! variables.
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `L4C_VAPI__PRIVATE_KEY` or `L4C_GITHUB__TOKEN`. Every key has a default,
//! so an empty configuration serves on `127.0.0.1:8080` with `l4c.db`.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use l4c_api::ApiConfig;
use l4c_core::assistant::AssistantDefaults;
use l4c_remote::{GithubConfig, VapiConfig};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "L4C";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_store_path")]
  pub store_path:       PathBuf,
  #[serde(default = "default_session_ttl_days")]
  pub session_ttl_days: i64,
  #[serde(default)]
  pub github:           GithubConfig,
  #[serde(default)]
  pub vapi:             VapiConfig,
  #[serde(default)]
  pub assistant:        AssistantDefaults,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("l4c.db") }
fn default_session_ttl_days() -> i64 { 30 }

impl ServerConfig {
  /// Layer the environment over the TOML file at `path`. A missing file is
  /// not an error.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Config::builder()
      .add_source(File::from(path).required(false))
      .add_source(
        Environment::with_prefix(ENV_PREFIX)
          .prefix_separator("_")
          .separator("__"),
      )
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// The settings the API handlers consult per request.
  pub fn api_config(&self) -> ApiConfig {
    ApiConfig {
      session_ttl:         chrono::Duration::days(self.session_ttl_days.max(1)),
      assistant_defaults:  self.assistant.clone(),
      vapi_public_key:     self.vapi.public_key.clone(),
      vapi_webhook_secret: self.vapi.webhook_secret.clone(),
    }
  }
}
