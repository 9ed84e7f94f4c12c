use std::sync::{
  Mutex,
  atomic::{AtomicBool, AtomicUsize, Ordering},
};

use axum::{
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use l4c_core::{
  remote::{AssistantPatch, AssistantSpec, RemoteAssistant, RepoRecord, RepoSource, VoiceProvider},
  store::PortfolioStore,
  subscription::Subject,
};
use l4c_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use super::*;

// ─── Fakes ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("fake upstream failure")]
struct FakeError;

/// Serves two repositories for any username except `ghost`.
struct FakeGithub;

impl RepoSource for FakeGithub {
  type Error = FakeError;

  async fn list_repos(&self, username: &str) -> Result<Vec<RepoRecord>, FakeError> {
    if username == "ghost" {
      return Err(FakeError);
    }
    Ok(
      [(101, "kiln"), (102, "loom")]
        .into_iter()
        .map(|(id, name)| RepoRecord {
          id,
          name: name.into(),
          description: Some(format!("{name} description")),
          url: format!("https://github.com/{username}/{name}"),
          language: Some("Rust".into()),
          stars: 10,
          forks: 2,
          topics: vec![],
          owner: username.into(),
        })
        .collect(),
    )
  }
}

#[derive(Default)]
struct FakeVapi {
  fail:    AtomicBool,
  created: AtomicUsize,
  patches: Mutex<Vec<(String, AssistantPatch)>>,
}

impl VoiceProvider for FakeVapi {
  type Error = FakeError;

  async fn create_assistant(&self, _spec: &AssistantSpec) -> Result<RemoteAssistant, FakeError> {
    if self.fail.load(Ordering::SeqCst) {
      return Err(FakeError);
    }
    let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
    Ok(RemoteAssistant { id: format!("asst_{n}") })
  }

  async fn update_assistant(&self, id: &str, patch: &AssistantPatch) -> Result<(), FakeError> {
    if self.fail.load(Ordering::SeqCst) {
      return Err(FakeError);
    }
    self.patches.lock().unwrap().push((id.to_owned(), patch.clone()));
    Ok(())
  }
}

struct TestBackend;

impl Backend for TestBackend {
  type Repos = FakeGithub;
  type Store = SqliteStore;
  type Voice = FakeVapi;
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

async fn make_state_with(config: ApiConfig) -> AppState<TestBackend> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  AppState::new(store, FakeGithub, FakeVapi::default(), config)
}

async fn make_state() -> AppState<TestBackend> { make_state_with(ApiConfig::default()).await }

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  builder.body(body).unwrap()
}

async fn send(state: &AppState<TestBackend>, req: Request<Body>) -> (StatusCode, Value) {
  let resp = api_router(state.clone()).oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn call(
  state: &AppState<TestBackend>,
  method: Method,
  uri: &str,
  token: Option<&str>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  send(state, request(method, uri, token, body)).await
}

/// Sign up and sign in `username`; returns the bearer token and user id.
async fn signed_in(state: &AppState<TestBackend>, username: &str) -> (String, Uuid) {
  let (status, _) = call(
    state,
    Method::POST,
    "/auth/sign-up",
    None,
    Some(json!({
      "email": format!("{username}@example.com"),
      "username": username,
      "password": "hunter2hunter2",
      "full_name": "Ada Lovelace",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, body) = call(
    state,
    Method::POST,
    "/auth/sign-in",
    None,
    Some(json!({ "email": format!("{username}@example.com"), "password": "hunter2hunter2" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  let token = body["data"]["token"].as_str().unwrap().to_owned();
  let user_id = body["data"]["user"]["user_id"].as_str().unwrap().parse().unwrap();
  (token, user_id)
}

/// Start the voice trial and provision an assistant; returns its remote id.
async fn provisioned(state: &AppState<TestBackend>, token: &str) -> String {
  let (status, _) =
    call(state, Method::POST, "/me/access/voice_assistant/trial", Some(token), None).await;
  assert_eq!(status, StatusCode::CREATED);
  let (status, body) = call(state, Method::PUT, "/me/assistant", Some(token), Some(json!({}))).await;
  assert_eq!(status, StatusCode::OK, "{body}");
  body["data"]["assistant"]["remote_id"].as_str().unwrap().to_owned()
}

// ── Accounts ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sign_up_sign_in_and_read_profile() {
  let state = make_state().await;
  let (token, user_id) = signed_in(&state, "ada").await;

  let (status, body) = call(&state, Method::GET, "/me", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["success"], json!(true));
  assert_eq!(body["data"]["username"], json!("ada"));
  assert_eq!(body["data"]["user_id"], json!(user_id.to_string()));
  assert_eq!(body["data"]["template_id"], json!("developer_dark"));
}

#[tokio::test]
async fn owner_routes_need_a_live_session() {
  let state = make_state().await;
  let (status, body) = call(&state, Method::GET, "/me", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["success"], json!(false));
  assert!(body["error"].is_string());

  let (status, _) = call(&state, Method::GET, "/me/links", Some("made-up"), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sign_in_rejects_a_wrong_password() {
  let state = make_state().await;
  signed_in(&state, "ada").await;
  let (status, _) = call(
    &state,
    Method::POST,
    "/auth/sign-in",
    None,
    Some(json!({ "email": "ada@example.com", "password": "not-the-one" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_and_invalid_sign_ups_are_rejected() {
  let state = make_state().await;
  signed_in(&state, "ada").await;

  let (status, _) = call(
    &state,
    Method::POST,
    "/auth/sign-up",
    None,
    Some(json!({ "email": "ADA@example.com", "username": "ada2", "password": "longenough" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, _) = call(
    &state,
    Method::POST,
    "/auth/sign-up",
    None,
    Some(json!({ "email": "bob@example.com", "username": "bob", "password": "short" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sign_out_revokes_the_token() {
  let state = make_state().await;
  let (token, _) = signed_in(&state, "ada").await;
  let (status, _) = call(&state, Method::POST, "/auth/sign-out", Some(&token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = call(&state, Method::GET, "/me", Some(&token), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ── Access gate ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn trial_starts_once_per_subject() {
  let state = make_state().await;
  let (token, _) = signed_in(&state, "ada").await;

  let (status, body) =
    call(&state, Method::GET, "/me/access/voice_assistant", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["hasAccess"], json!(false));
  assert_eq!(body["data"]["canStartTrial"], json!(true));

  let (status, body) =
    call(&state, Method::POST, "/me/access/voice_assistant/trial", Some(&token), None).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["data"]["subscription"]["status"], json!("trial"));
  assert_eq!(body["data"]["subscription"]["usage_limit"], json!(50));
  assert_eq!(body["data"]["access"]["hasAccess"], json!(true));
  assert_eq!(body["data"]["access"]["isTrial"], json!(true));
  assert_eq!(body["data"]["access"]["daysLeft"], json!(7));

  let (status, _) =
    call(&state, Method::POST, "/me/access/voice_assistant/trial", Some(&token), None).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (_, body) = call(&state, Method::GET, "/me/access/voice_assistant", Some(&token), None).await;
  assert_eq!(body["data"]["hasAccess"], json!(true));
  assert_eq!(body["data"]["canStartTrial"], json!(false));

  // A different subject has its own trial.
  let (status, _) =
    call(&state, Method::POST, "/me/access/terminal/trial", Some(&token), None).await;
  assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_trial_requests_create_one_trial() {
  let state = make_state().await;
  let (token, _) = signed_in(&state, "ada").await;

  let mut handles = Vec::new();
  for _ in 0..8 {
    let state = state.clone();
    let token = token.clone();
    handles.push(tokio::spawn(async move {
      call(&state, Method::POST, "/me/access/voice_assistant/trial", Some(&token), None).await
    }));
  }

  let mut statuses = Vec::new();
  for h in handles {
    statuses.push(h.await.unwrap().0);
  }
  assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CREATED).count(), 1, "{statuses:?}");
  assert!(
    statuses
      .iter()
      .all(|s| *s == StatusCode::CREATED || *s == StatusCode::CONFLICT),
    "{statuses:?}"
  );

  let (_, body) = call(&state, Method::GET, "/me/access/voice_assistant", Some(&token), None).await;
  assert_eq!(body["data"]["usageCount"], json!(0));
}

#[tokio::test]
async fn trials_need_a_gated_subject() {
  let state = make_state().await;
  let (token, _) = signed_in(&state, "ada").await;

  let (status, _) =
    call(&state, Method::POST, "/me/access/minimalist_light/trial", Some(&token), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = call(&state, Method::GET, "/me/access/analytics", Some(&token), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn premium_template_needs_access() {
  let state = make_state().await;
  let (token, _) = signed_in(&state, "ada").await;

  let choose = |template: &'static str| json!({ "template_id": template });

  let (status, _) =
    call(&state, Method::PUT, "/me/template", Some(&token), Some(choose("terminal"))).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) =
    call(&state, Method::PUT, "/me/template", Some(&token), Some(choose("minimalist_light")))
      .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["template_id"], json!("minimalist_light"));

  call(&state, Method::POST, "/me/access/terminal/trial", Some(&token), None).await;
  let (status, body) =
    call(&state, Method::PUT, "/me/template", Some(&token), Some(choose("terminal"))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["template_id"], json!("terminal"));

  let (status, _) =
    call(&state, Method::PUT, "/me/template", Some(&token), Some(choose("vaporwave"))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Links and import ─────────────────────────────────────────────────────────

#[tokio::test]
async fn import_appends_after_existing_links_and_skips_known_repos() {
  let state = make_state().await;
  let (token, _) = signed_in(&state, "ada").await;

  for i in 0..6 {
    let (status, body) = call(
      &state,
      Method::POST,
      "/me/links",
      Some(&token),
      Some(json!({
        "title": format!("Project {i}"),
        "url": format!("https://example.com/{i}"),
        "category": "projects",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["position"], json!(i));
  }

  let (status, body) = call(
    &state,
    Method::POST,
    "/me/links/import",
    Some(&token),
    Some(json!({ "github_username": "ada" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  assert_eq!(body["data"]["imported"], json!(2));
  let positions: Vec<_> = body["data"]["links"]
    .as_array()
    .unwrap()
    .iter()
    .map(|l| l["position"].as_i64().unwrap())
    .collect();
  assert_eq!(positions, vec![6, 7]);
  assert_eq!(body["data"]["links"][0]["metadata"]["stars"], json!(10));

  let (_, body) = call(
    &state,
    Method::POST,
    "/me/links/import",
    Some(&token),
    Some(json!({ "github_username": "ada" })),
  )
  .await;
  assert_eq!(body["data"]["imported"], json!(0));

  let (_, body) = call(&state, Method::GET, "/me/links", Some(&token), None).await;
  assert_eq!(body["data"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn import_selects_repos_and_uses_the_profile_username() {
  let state = make_state().await;
  let (token, _) = signed_in(&state, "ada").await;

  let (status, _) =
    call(&state, Method::POST, "/me/links/import", Some(&token), Some(json!({}))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  call(&state, Method::PUT, "/me", Some(&token), Some(json!({ "github_username": "ada" }))).await;
  let (status, body) = call(
    &state,
    Method::POST,
    "/me/links/import",
    Some(&token),
    Some(json!({ "repo_ids": [102], "category": "custom" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["data"]["imported"], json!(1));
  assert_eq!(body["data"]["links"][0]["title"], json!("loom"));
  assert_eq!(body["data"]["links"][0]["category"], json!("custom"));
  assert_eq!(body["data"]["links"][0]["position"], json!(0));
}

#[tokio::test]
async fn import_reports_upstream_failure() {
  let state = make_state().await;
  let (token, _) = signed_in(&state, "ada").await;
  let (status, body) = call(
    &state,
    Method::POST,
    "/me/links/import",
    Some(&token),
    Some(json!({ "github_username": "ghost" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);
  assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn import_rejects_a_malformed_github_username() {
  let state = make_state().await;
  let (token, _) = signed_in(&state, "ada").await;
  let (status, body) = call(
    &state,
    Method::POST,
    "/me/links/import",
    Some(&token),
    Some(json!({ "github_username": "ada/../orgs/rust-lang" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn links_update_delete_and_count_clicks() {
  let state = make_state().await;
  let (token, _) = signed_in(&state, "ada").await;

  let (_, body) = call(
    &state,
    Method::POST,
    "/me/links",
    Some(&token),
    Some(json!({ "title": "Blog", "url": "https://ada.dev", "category": "blogs" })),
  )
  .await;
  let link_id = body["data"]["link_id"].as_str().unwrap().to_owned();

  for expected in 1..=3 {
    let (status, body) =
      call(&state, Method::POST, &format!("/links/{link_id}/click"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["click_count"], json!(expected));
  }

  let (status, body) = call(
    &state,
    Method::PUT,
    &format!("/me/links/{link_id}"),
    Some(&token),
    Some(json!({ "title": "Writing" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["title"], json!("Writing"));
  assert_eq!(body["data"]["click_count"], json!(3));

  let (status, _) = call(
    &state,
    Method::PUT,
    &format!("/me/links/{link_id}"),
    Some(&token),
    Some(json!({ "url": "ftp://nope" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) =
    call(&state, Method::DELETE, &format!("/me/links/{link_id}"), Some(&token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) =
    call(&state, Method::POST, &format!("/links/{link_id}/click"), None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn links_of_another_user_are_not_found() {
  let state = make_state().await;
  let (ada, _) = signed_in(&state, "ada").await;
  let (bob, _) = signed_in(&state, "bob").await;

  let (_, body) = call(
    &state,
    Method::POST,
    "/me/links",
    Some(&ada),
    Some(json!({ "title": "Mine", "url": "https://ada.dev", "category": "personal" })),
  )
  .await;
  let link_id = body["data"]["link_id"].as_str().unwrap().to_owned();

  let (status, _) =
    call(&state, Method::DELETE, &format!("/me/links/{link_id}"), Some(&bob), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Assistant provisioning ───────────────────────────────────────────────────

#[tokio::test]
async fn provisioning_needs_access() {
  let state = make_state().await;
  let (token, _) = signed_in(&state, "ada").await;
  let (status, _) =
    call(&state, Method::PUT, "/me/assistant", Some(&token), Some(json!({}))).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(state.voice.created.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn provider_outage_stores_a_placeholder_then_retries() {
  let state = make_state().await;
  let (token, _) = signed_in(&state, "ada").await;
  call(&state, Method::POST, "/me/access/voice_assistant/trial", Some(&token), None).await;

  state.voice.fail.store(true, Ordering::SeqCst);
  let (status, body) =
    call(&state, Method::PUT, "/me/assistant", Some(&token), Some(json!({}))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["degraded"], json!(true));
  let remote_id = body["data"]["assistant"]["remote_id"].as_str().unwrap();
  assert!(remote_id.starts_with("local-"), "{remote_id}");
  let assistant_id = body["data"]["assistant"]["assistant_id"].clone();

  state.voice.fail.store(false, Ordering::SeqCst);
  let (status, body) =
    call(&state, Method::PUT, "/me/assistant", Some(&token), Some(json!({}))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["degraded"], json!(false));
  assert_eq!(body["data"]["assistant"]["remote_id"], json!("asst_1"));
  assert_eq!(body["data"]["assistant"]["assistant_id"], assistant_id);
}

#[tokio::test]
async fn updates_push_only_changed_fields() {
  let state = make_state().await;
  let (token, _) = signed_in(&state, "ada").await;
  let remote_id = provisioned(&state, &token).await;
  assert_eq!(remote_id, "asst_1");

  let (status, body) = call(
    &state,
    Method::PUT,
    "/me/assistant",
    Some(&token),
    Some(json!({ "name": "Ada's Concierge" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["assistant"]["name"], json!("Ada's Concierge"));

  // Saving again with nothing new makes no provider call.
  call(&state, Method::PUT, "/me/assistant", Some(&token), Some(json!({}))).await;

  let patches = state.voice.patches.lock().unwrap().clone();
  assert_eq!(patches.len(), 1);
  let (id, patch) = &patches[0];
  assert_eq!(id, "asst_1");
  assert_eq!(patch.name.as_deref(), Some("Ada's Concierge"));
  assert_eq!(patch.system_prompt, None);
  assert_eq!(patch.voice_id, None);
  assert_eq!(state.voice.created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn provider_update_failure_is_a_bad_gateway() {
  let state = make_state().await;
  let (token, _) = signed_in(&state, "ada").await;
  provisioned(&state, &token).await;

  state.voice.fail.store(true, Ordering::SeqCst);
  let (status, _) = call(
    &state,
    Method::PUT,
    "/me/assistant",
    Some(&token),
    Some(json!({ "first_message": "Hello there" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);

  let (_, body) = call(&state, Method::GET, "/me/assistant", Some(&token), None).await;
  assert_ne!(body["data"]["assistant"]["first_message"], json!("Hello there"));
  assert_eq!(body["data"]["access"]["hasAccess"], json!(true));
}

#[tokio::test]
async fn out_of_range_temperature_is_rejected() {
  let state = make_state().await;
  let (token, _) = signed_in(&state, "ada").await;
  let (status, _) = call(
    &state,
    Method::PUT,
    "/me/assistant",
    Some(&token),
    Some(json!({ "temperature": 3.5 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Conversations ────────────────────────────────────────────────────────────

#[tokio::test]
async fn conversations_count_usage_once_per_call() {
  let state = make_state().await;
  let (token, _) = signed_in(&state, "ada").await;
  let remote_id = provisioned(&state, &token).await;

  let report = |call_id: &str| {
    json!({
      "assistant_id": remote_id,
      "call_id": call_id,
      "duration_seconds": 42,
      "summary": "Asked about kiln",
    })
  };

  let (status, first) =
    call(&state, Method::POST, "/conversations", None, Some(report("call_1"))).await;
  assert_eq!(status, StatusCode::OK, "{first}");
  let (status, again) =
    call(&state, Method::POST, "/conversations", None, Some(report("call_1"))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(first["data"]["conversation_id"], again["data"]["conversation_id"]);

  let (_, body) = call(&state, Method::GET, "/me/access/voice_assistant", Some(&token), None).await;
  assert_eq!(body["data"]["usageCount"], json!(1));

  let (_, body) = call(&state, Method::GET, "/me/conversations", Some(&token), None).await;
  assert_eq!(body["data"].as_array().unwrap().len(), 1);
  assert_eq!(body["data"][0]["summary"], json!("Asked about kiln"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reports_of_one_call_count_once() {
  let state = make_state().await;
  let (token, _) = signed_in(&state, "ada").await;
  let remote_id = provisioned(&state, &token).await;

  let mut handles = Vec::new();
  for _ in 0..8 {
    let state = state.clone();
    let report = json!({ "assistant_id": remote_id, "call_id": "call_1", "duration_seconds": 30 });
    handles.push(tokio::spawn(async move {
      call(&state, Method::POST, "/conversations", None, Some(report)).await
    }));
  }

  let mut ids = Vec::new();
  for h in handles {
    let (status, body) = h.await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    ids.push(body["data"]["conversation_id"].clone());
  }
  assert!(ids.iter().all(|id| *id == ids[0]));

  let (_, body) = call(&state, Method::GET, "/me/access/voice_assistant", Some(&token), None).await;
  assert_eq!(body["data"]["usageCount"], json!(1));

  let (_, body) = call(&state, Method::GET, "/me/conversations", Some(&token), None).await;
  assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn conversations_past_the_quota_are_refused() {
  let state = make_state().await;
  let (token, user_id) = signed_in(&state, "ada").await;
  let remote_id = provisioned(&state, &token).await;

  for _ in 0..50 {
    state.store.record_usage(user_id, Subject::VoiceAssistant).await.unwrap();
  }

  let (status, body) = call(
    &state,
    Method::POST,
    "/conversations",
    None,
    Some(json!({ "assistant_id": remote_id, "call_id": "call_51", "duration_seconds": 10 })),
  )
  .await;
  assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
  assert_eq!(body["success"], json!(false));

  let (_, body) = call(&state, Method::GET, "/me/conversations", Some(&token), None).await;
  assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn conversation_for_unknown_assistant_is_not_found() {
  let state = make_state().await;
  let (status, _) = call(
    &state,
    Method::POST,
    "/conversations",
    None,
    Some(json!({ "assistant_id": "asst_nope", "call_id": "c", "duration_seconds": 1 })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn webhook_checks_the_secret_and_records_reports() {
  let state = make_state_with(ApiConfig {
    vapi_webhook_secret: Some("s3cret".into()),
    ..ApiConfig::default()
  })
  .await;
  let (token, _) = signed_in(&state, "ada").await;
  let remote_id = provisioned(&state, &token).await;

  let hook = |secret: Option<&str>, payload: Value| {
    let mut req = request(Method::POST, "/webhooks/vapi", None, Some(payload));
    if let Some(secret) = secret {
      req
        .headers_mut()
        .insert(engagement::WEBHOOK_SECRET_HEADER, secret.parse().unwrap());
    }
    req
  };

  let status_update = json!({ "message": { "type": "status-update", "status": "in-progress" } });
  let (status, _) = send(&state, hook(None, status_update.clone())).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  let (status, _) = send(&state, hook(Some("wrong"), status_update.clone())).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, body) = send(&state, hook(Some("s3cret"), status_update)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["received"], json!("status-update"));
  assert_eq!(body["data"]["conversation"], Value::Null);

  let report = json!({ "message": {
    "type": "end-of-call-report",
    "durationSeconds": 61.2,
    "endedReason": "assistant-ended-call",
    "call": { "id": "call_hook", "assistantId": remote_id },
    "artifact": { "transcript": "AI: Hi" },
  }});
  let (status, body) = send(&state, hook(Some("s3cret"), report)).await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["data"]["conversation"]["call_id"], json!("call_hook"));
  assert_eq!(body["data"]["conversation"]["duration_seconds"], json!(61));
}

// ── Testimonials and the public view ─────────────────────────────────────────

#[tokio::test]
async fn testimonials_appear_publicly_once_approved() {
  let state = make_state().await;
  let (token, _) = signed_in(&state, "ada").await;

  let (status, body) = call(
    &state,
    Method::POST,
    "/testimonials",
    None,
    Some(json!({
      "username": "ada",
      "author_name": "Grace",
      "author_title": "Rear Admiral",
      "content": "Ships reliable code.",
      "rating": 5,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["data"]["is_approved"], json!(false));
  let id = body["data"]["testimonial_id"].as_str().unwrap().to_owned();

  let (_, view) = call(&state, Method::GET, "/public/ada", None, None).await;
  assert!(view["data"]["testimonials"].as_array().unwrap().is_empty());

  let (status, _) = call(
    &state,
    Method::POST,
    &format!("/me/testimonials/{id}/approve"),
    Some(&token),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (_, view) = call(&state, Method::GET, "/public/ada", None, None).await;
  assert_eq!(view["data"]["testimonials"][0]["author_name"], json!("Grace"));

  let (status, _) = call(
    &state,
    Method::POST,
    "/testimonials",
    None,
    Some(json!({ "username": "ada", "author_name": "X", "content": "Hm", "rating": 9 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) =
    call(&state, Method::DELETE, &format!("/me/testimonials/{id}"), Some(&token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (_, body) = call(&state, Method::GET, "/me/testimonials", Some(&token), None).await;
  assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn private_or_unknown_profiles_are_not_found() {
  let state = make_state().await;
  let (token, _) = signed_in(&state, "ada").await;

  let (status, _) = call(&state, Method::GET, "/public/nobody", None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  call(&state, Method::PUT, "/me", Some(&token), Some(json!({ "is_public": false }))).await;
  let (status, _) = call(&state, Method::GET, "/public/ada", None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = call(
    &state,
    Method::POST,
    "/testimonials",
    None,
    Some(json!({ "username": "ada", "author_name": "G", "content": "Great", "rating": 5 })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn public_view_groups_active_links_and_shows_the_template() {
  let state = make_state().await;
  let (token, _) = signed_in(&state, "ada").await;

  for (title, category) in [("Mastodon", "social"), ("Kiln", "projects"), ("Loom", "projects")] {
    call(
      &state,
      Method::POST,
      "/me/links",
      Some(&token),
      Some(json!({
        "title": title,
        "url": format!("https://example.com/{title}"),
        "category": category,
      })),
    )
    .await;
  }
  call(&state, Method::POST, "/me/access/github_focus/trial", Some(&token), None).await;
  call(
    &state,
    Method::PUT,
    "/me/template",
    Some(&token),
    Some(json!({ "template_id": "github_focus" })),
  )
  .await;

  let (status, body) = call(&state, Method::GET, "/public/ada", None, None).await;
  assert_eq!(status, StatusCode::OK);
  let view = &body["data"];
  assert_eq!(view["template"], json!("github_focus"));
  assert_eq!(view["profile"]["display_name"], json!("Ada Lovelace"));
  assert_eq!(view["groups"][0]["category"], json!("projects"));
  assert_eq!(view["groups"][0]["links"][1]["title"], json!("Loom"));
  assert_eq!(view["groups"][1]["category"], json!("social"));
  assert_eq!(view["assistant"], Value::Null);
}

#[tokio::test]
async fn widget_needs_a_public_key_and_a_provisioned_assistant() {
  let state = make_state_with(ApiConfig {
    vapi_public_key: Some("pk_test".into()),
    ..ApiConfig::default()
  })
  .await;
  let (token, _) = signed_in(&state, "ada").await;

  let (_, body) = call(&state, Method::GET, "/public/ada", None, None).await;
  assert_eq!(body["data"]["assistant"], Value::Null);

  let remote_id = provisioned(&state, &token).await;
  let (_, body) = call(&state, Method::GET, "/public/ada", None, None).await;
  assert_eq!(body["data"]["assistant"]["assistant_id"], json!(remote_id));
  assert_eq!(body["data"]["assistant"]["public_key"], json!("pk_test"));

  call(&state, Method::PUT, "/me/assistant", Some(&token), Some(json!({ "is_active": false })))
    .await;
  let (_, body) = call(&state, Method::GET, "/public/ada", None, None).await;
  assert_eq!(body["data"]["assistant"], Value::Null);
}
