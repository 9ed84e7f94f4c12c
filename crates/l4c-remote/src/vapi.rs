//! Hosted voice assistants on the VAPI REST API.

use std::time::Duration;

use l4c_core::remote::{AssistantPatch, AssistantSpec, RemoteAssistant, VoiceProvider};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Connection settings for VAPI.
#[derive(Debug, Clone, Deserialize)]
pub struct VapiConfig {
  #[serde(default = "default_base_url")]
  pub base_url:       String,
  /// Server-side key used for assistant management.
  #[serde(default)]
  pub private_key:    Option<String>,
  /// Browser key handed to the public page's widget.
  #[serde(default)]
  pub public_key:     Option<String>,
  /// Shared secret expected in the `x-vapi-secret` webhook header.
  #[serde(default)]
  pub webhook_secret: Option<String>,
}

fn default_base_url() -> String { "https://api.vapi.ai".into() }

impl Default for VapiConfig {
  fn default() -> Self {
    Self {
      base_url:       default_base_url(),
      private_key:    None,
      public_key:     None,
      webhook_secret: None,
    }
  }
}

#[derive(Clone)]
pub struct VapiClient {
  client: Client,
  config: VapiConfig,
}

// ─── Wire format ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssistantBody<'a> {
  #[serde(skip_serializing_if = "Option::is_none")]
  name:          Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  first_message: Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  model:         Option<ModelBody<'a>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  voice:         Option<VoiceBody<'a>>,
}

#[derive(Debug, Serialize)]
struct ModelBody<'a> {
  provider:    &'static str,
  model:       &'a str,
  temperature: f32,
  messages:    [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
  role:    &'static str,
  content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceBody<'a> {
  provider: &'a str,
  voice_id: &'a str,
}

#[derive(Deserialize)]
struct CreatedAssistant {
  id: String,
}

fn model_body<'a>(model: &'a str, temperature: f32, system_prompt: &'a str) -> ModelBody<'a> {
  ModelBody {
    provider: "openai",
    model,
    temperature,
    messages: [Message { role: "system", content: system_prompt }],
  }
}

impl<'a> From<&'a AssistantSpec> for AssistantBody<'a> {
  fn from(spec: &'a AssistantSpec) -> Self {
    Self {
      name:          Some(spec.name.as_str()),
      first_message: Some(spec.first_message.as_str()),
      model:         Some(model_body(&spec.model, spec.temperature, &spec.system_prompt)),
      voice:         Some(VoiceBody {
        provider: &spec.voice_provider,
        voice_id: &spec.voice_id,
      }),
    }
  }
}

impl<'a> From<&'a AssistantPatch> for AssistantBody<'a> {
  fn from(patch: &'a AssistantPatch) -> Self {
    let model = match (&patch.model, patch.temperature, &patch.system_prompt) {
      (Some(model), Some(temperature), Some(prompt)) => {
        Some(model_body(model, temperature, prompt))
      }
      _ => None,
    };
    let voice = match (&patch.voice_provider, &patch.voice_id) {
      (Some(provider), Some(voice_id)) => Some(VoiceBody { provider, voice_id }),
      _ => None,
    };
    Self {
      name: patch.name.as_deref(),
      first_message: patch.first_message.as_deref(),
      model,
      voice,
    }
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

impl VapiClient {
  pub fn new(config: VapiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self { client, config })
  }

  pub fn config(&self) -> &VapiConfig { &self.config }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: RequestBuilder) -> Result<RequestBuilder> {
    match &self.config.private_key {
      Some(key) if !key.is_empty() => Ok(req.bearer_auth(key)),
      _ => Err(Error::NotConfigured("vapi private key")),
    }
  }

  async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    Err(Error::Status {
      service: "vapi",
      status:  status.as_u16(),
      body:    resp.text().await.unwrap_or_default(),
    })
  }
}

impl VoiceProvider for VapiClient {
  type Error = Error;

  /// `POST /assistant`
  async fn create_assistant(&self, spec: &AssistantSpec) -> Result<RemoteAssistant> {
    let resp = self
      .auth(self.client.post(self.url("/assistant")))?
      .json(&AssistantBody::from(spec))
      .send()
      .await?;
    let created: CreatedAssistant = Self::check(resp).await?.json().await?;
    tracing::info!(remote_id = %created.id, "created vapi assistant");
    Ok(RemoteAssistant { id: created.id })
  }

  /// `PATCH /assistant/{id}`
  async fn update_assistant(&self, id: &str, patch: &AssistantPatch) -> Result<()> {
    let resp = self
      .auth(self.client.patch(self.url(&format!("/assistant/{id}"))))?
      .json(&AssistantBody::from(patch))
      .send()
      .await?;
    Self::check(resp).await?;
    tracing::info!(remote_id = id, "updated vapi assistant");
    Ok(())
  }
}
