//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, Utc};
use l4c_core::{
  assistant::VoiceAssistant,
  engagement::{CallRecord, NewConversation, NewTestimonial},
  link::{LinkCategory, LinkUpdate, NewLink},
  profile::{NewUser, ProfileUpdate, Session, User},
  store::{ErrorKind, PortfolioStore, StoreError},
  subscription::{NewTrial, Subject, SubscriptionStatus},
  template::TemplateId,
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, username: &str) -> User {
  s.create_user(NewUser {
    email:         format!("{username}@example.com"),
    username:      username.into(),
    full_name:     Some("Ada Lovelace".into()),
    password_hash: "$argon2id$stub".into(),
  })
  .await
  .unwrap()
}

fn link(user_id: Uuid, title: &str, category: LinkCategory, position: Option<i64>) -> NewLink {
  NewLink {
    user_id,
    title: title.into(),
    url: format!("https://example.com/{title}"),
    description: None,
    category,
    icon: None,
    position,
    metadata: None,
  }
}

// ─── Users and sessions ──────────────────────────────────────────────────────

#[tokio::test]
async fn created_user_round_trips_with_defaults() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  assert_eq!(ada.template_id, "developer_dark");
  assert!(ada.is_public);

  let fetched = s.get_user(ada.user_id).await.unwrap().unwrap();
  assert_eq!(fetched.email, "ada@example.com");
  assert_eq!(fetched.full_name.as_deref(), Some("Ada Lovelace"));

  let by_name = s.find_user_by_username("ADA").await.unwrap().unwrap();
  assert_eq!(by_name.user_id, ada.user_id);
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
  let s = store().await;
  user(&s, "ada").await;
  let err = s
    .create_user(NewUser {
      email:         "other@example.com".into(),
      username:      "ada".into(),
      full_name:     None,
      password_hash: "x".into(),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UserExists));
  assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn credentials_include_the_password_hash() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let (found, hash) = s.find_credentials(" Ada@Example.com ").await.unwrap().unwrap();
  assert_eq!(found.user_id, ada.user_id);
  assert_eq!(hash, "$argon2id$stub");
  assert!(s.find_credentials("nobody@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn profile_and_template_updates_persist() {
  let s = store().await;
  let ada = user(&s, "ada").await;

  s.update_profile(ada.user_id, ProfileUpdate {
    bio: Some("Analytical engines.".into()),
    ..Default::default()
  })
  .await
  .unwrap();
  s.set_template(ada.user_id, TemplateId::Terminal).await.unwrap();

  let fetched = s.get_user(ada.user_id).await.unwrap().unwrap();
  assert_eq!(fetched.bio.as_deref(), Some("Analytical engines."));
  assert_eq!(fetched.template_id, "terminal");
}

#[tokio::test]
async fn update_profile_for_missing_user_is_not_found() {
  let s = store().await;
  let err = s
    .update_profile(Uuid::new_v4(), ProfileUpdate::default())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn sessions_can_be_found_and_revoked() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let now = Utc::now();
  s.create_session(Session {
    token_hash: "abc123".into(),
    user_id:    ada.user_id,
    created_at: now,
    expires_at: now + Duration::days(30),
  })
  .await
  .unwrap();

  let session = s.find_session("abc123").await.unwrap().unwrap();
  assert_eq!(session.user_id, ada.user_id);
  assert!(session.is_live(now));

  s.revoke_session("abc123").await.unwrap();
  assert!(s.find_session("abc123").await.unwrap().is_none());
}

// ─── Links ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_link_appends_within_its_category() {
  let s = store().await;
  let ada = user(&s, "ada").await;

  let a = s.add_link(link(ada.user_id, "a", LinkCategory::Projects, None)).await.unwrap();
  let b = s.add_link(link(ada.user_id, "b", LinkCategory::Projects, None)).await.unwrap();
  let c = s.add_link(link(ada.user_id, "c", LinkCategory::Social, None)).await.unwrap();

  assert_eq!((a.position, b.position, c.position), (0, 1, 0));
  assert_eq!(a.click_count, 0);
  assert!(a.is_active);
}

#[tokio::test]
async fn insert_links_continues_after_the_maximum() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  s.add_link(link(ada.user_id, "existing", LinkCategory::Projects, Some(5)))
    .await
    .unwrap();

  let max = s.max_position(ada.user_id, LinkCategory::Projects).await.unwrap();
  assert_eq!(max, Some(5));
  assert_eq!(s.max_position(ada.user_id, LinkCategory::Blogs).await.unwrap(), None);

  let inserted = s
    .insert_links(vec![
      link(ada.user_id, "alpha", LinkCategory::Projects, Some(6)),
      link(ada.user_id, "beta", LinkCategory::Projects, Some(7)),
    ])
    .await
    .unwrap();
  let positions: Vec<_> = inserted.iter().map(|l| l.position).collect();
  assert_eq!(positions, vec![6, 7]);

  let titles: Vec<_> = s
    .list_links(ada.user_id)
    .await
    .unwrap()
    .into_iter()
    .map(|l| l.title)
    .collect();
  assert_eq!(titles, vec!["existing", "alpha", "beta"]);
}

#[tokio::test]
async fn failed_batch_inserts_nothing() {
  let s = store().await;
  let ada = user(&s, "ada").await;

  // The second row references a user that does not exist.
  let err = s
    .insert_links(vec![
      link(ada.user_id, "alpha", LinkCategory::Projects, Some(0)),
      link(Uuid::new_v4(), "orphan", LinkCategory::Projects, Some(1)),
    ])
    .await;
  assert!(err.is_err());
  assert!(s.list_links(ada.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_links_orders_by_category_then_position() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  s.add_link(link(ada.user_id, "twitter", LinkCategory::Social, Some(0))).await.unwrap();
  s.add_link(link(ada.user_id, "second", LinkCategory::Projects, Some(1))).await.unwrap();
  s.add_link(link(ada.user_id, "first", LinkCategory::Projects, Some(0))).await.unwrap();
  s.add_link(link(ada.user_id, "about", LinkCategory::Personal, Some(3))).await.unwrap();

  let titles: Vec<_> = s
    .list_links(ada.user_id)
    .await
    .unwrap()
    .into_iter()
    .map(|l| l.title)
    .collect();
  assert_eq!(titles, vec!["about", "first", "second", "twitter"]);
}

#[tokio::test]
async fn update_and_delete_are_scoped_to_the_owner() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let bob = user(&s, "bob").await;
  let l = s.add_link(link(ada.user_id, "blog", LinkCategory::Blogs, None)).await.unwrap();

  let err = s
    .update_link(bob.user_id, l.link_id, LinkUpdate::default())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  let updated = s
    .update_link(ada.user_id, l.link_id, LinkUpdate {
      title: Some("Notes".into()),
      is_active: Some(false),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(updated.title, "Notes");
  assert!(!updated.is_active);

  assert!(s.delete_link(bob.user_id, l.link_id).await.is_err());
  s.delete_link(ada.user_id, l.link_id).await.unwrap();
  assert!(s.list_links(ada.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn increment_clicks_counts_up() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let l = s.add_link(link(ada.user_id, "repo", LinkCategory::Projects, None)).await.unwrap();

  assert_eq!(s.increment_clicks(l.link_id).await.unwrap(), 1);
  assert_eq!(s.increment_clicks(l.link_id).await.unwrap(), 2);

  let stored = &s.list_links(ada.user_id).await.unwrap()[0];
  assert_eq!(stored.click_count, 2);
}

#[tokio::test]
async fn increment_clicks_on_missing_link_is_not_found() {
  let s = store().await;
  let missing = Uuid::new_v4();
  let err = s.increment_clicks(missing).await.unwrap_err();
  assert!(matches!(err, Error::LinkNotFound(id) if id == missing));
}

#[tokio::test]
async fn concurrent_clicks_are_not_lost() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let link_id = s
    .add_link(link(ada.user_id, "repo", LinkCategory::Projects, None))
    .await
    .unwrap()
    .link_id;

  let mut handles = Vec::new();
  for _ in 0..20 {
    let s = s.clone();
    handles.push(tokio::spawn(async move { s.increment_clicks(link_id).await }));
  }
  for h in handles {
    h.await.unwrap().unwrap();
  }
  assert_eq!(s.list_links(ada.user_id).await.unwrap()[0].click_count, 20);
}

// ─── Subscriptions ───────────────────────────────────────────────────────────

#[tokio::test]
async fn trial_can_only_be_started_once() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let now = Utc::now();

  let first = s
    .start_trial(NewTrial::starting(ada.user_id, Subject::VoiceAssistant, now))
    .await
    .unwrap();
  assert_eq!(first.status, SubscriptionStatus::Trial);
  assert_eq!(first.usage_limit, 50);
  assert_eq!(first.trial_end, Some(now + Duration::days(7)));

  let err = s
    .start_trial(NewTrial::starting(
      ada.user_id,
      Subject::VoiceAssistant,
      now + Duration::days(30),
    ))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::AlreadyUsed(Subject::VoiceAssistant)));
  assert_eq!(err.kind(), ErrorKind::AlreadyUsed);

  let stored = s
    .get_subscription(ada.user_id, Subject::VoiceAssistant)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(stored.subscription_id, first.subscription_id);
  assert_eq!(stored.usage_count, 0);
  assert_eq!(stored.trial_start.map(|t| t.timestamp_micros()), Some(now.timestamp_micros()));
  assert_eq!(
    stored.trial_end.map(|t| t.timestamp_micros()),
    Some((now + Duration::days(7)).timestamp_micros())
  );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_trials_create_one_row() {
  let s = store().await;
  let user_id = user(&s, "ada").await.user_id;
  let now = Utc::now();

  let mut handles = Vec::new();
  for _ in 0..8 {
    let s = s.clone();
    handles.push(tokio::spawn(async move {
      s.start_trial(NewTrial::starting(user_id, Subject::VoiceAssistant, now)).await
    }));
  }

  let mut created = Vec::new();
  for h in handles {
    match h.await.unwrap() {
      Ok(sub) => created.push(sub),
      Err(e) => assert_eq!(e.kind(), ErrorKind::AlreadyUsed),
    }
  }
  assert_eq!(created.len(), 1);

  let stored = s
    .get_subscription(user_id, Subject::VoiceAssistant)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(stored.subscription_id, created[0].subscription_id);
  assert_eq!(stored.usage_count, 0);
}

#[tokio::test]
async fn trials_are_tracked_per_subject() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let now = Utc::now();
  let terminal = Subject::Template(TemplateId::Terminal);

  s.start_trial(NewTrial::starting(ada.user_id, terminal, now)).await.unwrap();
  s.start_trial(NewTrial::starting(ada.user_id, Subject::VoiceAssistant, now))
    .await
    .unwrap();

  let sub = s.get_subscription(ada.user_id, terminal).await.unwrap().unwrap();
  assert_eq!(sub.usage_limit, 0);
  assert!(
    s.get_subscription(ada.user_id, Subject::Template(TemplateId::GithubFocus))
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn record_usage_counts_each_call() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  s.start_trial(NewTrial::starting(ada.user_id, Subject::VoiceAssistant, Utc::now()))
    .await
    .unwrap();

  for _ in 0..3 {
    s.record_usage(ada.user_id, Subject::VoiceAssistant).await.unwrap();
  }
  let sub = s
    .get_subscription(ada.user_id, Subject::VoiceAssistant)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(sub.usage_count, 3);
}

#[tokio::test]
async fn record_usage_stops_at_the_limit() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let mut trial = NewTrial::starting(ada.user_id, Subject::VoiceAssistant, Utc::now());
  trial.usage_limit = 2;
  s.start_trial(trial).await.unwrap();

  s.record_usage(ada.user_id, Subject::VoiceAssistant).await.unwrap();
  let second = s
    .record_usage(ada.user_id, Subject::VoiceAssistant)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(second.usage_count, 2);

  let err = s
    .record_usage(ada.user_id, Subject::VoiceAssistant)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::QuotaExceeded { limit: 2, .. }));
  assert_eq!(err.kind(), ErrorKind::QuotaExceeded);
}

#[tokio::test]
async fn record_usage_without_a_subscription_is_a_no_op() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let result = s
    .record_usage(ada.user_id, Subject::VoiceAssistant)
    .await
    .unwrap();
  assert!(result.is_none());
}

// ─── Voice assistant ─────────────────────────────────────────────────────────

fn assistant(user_id: Uuid, remote_id: &str) -> VoiceAssistant {
  let now = Utc::now();
  VoiceAssistant {
    assistant_id:   Uuid::new_v4(),
    user_id,
    remote_id:      remote_id.into(),
    name:           "Ada's assistant".into(),
    system_prompt:  "You represent Ada.".into(),
    first_message:  "Hi!".into(),
    voice_provider: "11labs".into(),
    voice_id:       "burt".into(),
    model:          "gpt-4o-mini".into(),
    temperature:    0.5,
    is_active:      true,
    created_at:     now,
    updated_at:     now,
  }
}

#[tokio::test]
async fn save_assistant_upserts_by_user() {
  let s = store().await;
  let ada = user(&s, "ada").await;

  let first = s.save_assistant(assistant(ada.user_id, "asst_1")).await.unwrap();
  assert_eq!(first.remote_id, "asst_1");
  assert_eq!(first.temperature, 0.5);

  let mut replacement = assistant(ada.user_id, "asst_2");
  replacement.name = "Renamed".into();
  let second = s.save_assistant(replacement).await.unwrap();

  assert_eq!(second.assistant_id, first.assistant_id);
  assert_eq!(second.name, "Renamed");
  assert_eq!(second.remote_id, "asst_2");

  let by_remote = s.find_assistant_by_remote_id("asst_2").await.unwrap().unwrap();
  assert_eq!(by_remote.user_id, ada.user_id);
  assert!(s.find_assistant_by_remote_id("asst_1").await.unwrap().is_none());
}

// ─── Conversations ───────────────────────────────────────────────────────────

fn conversation(user_id: Uuid, call_id: &str) -> NewConversation {
  NewConversation {
    user_id,
    call_id: call_id.into(),
    duration_seconds: 42,
    transcript: Some("Hello".into()),
    summary: None,
    ended_reason: Some("customer-ended-call".into()),
  }
}

async fn voice_trial(s: &SqliteStore, user_id: Uuid, limit: i64) {
  let mut trial = NewTrial::starting(user_id, Subject::VoiceAssistant, Utc::now());
  trial.usage_limit = limit;
  s.start_trial(trial).await.unwrap();
}

async fn voice_usage(s: &SqliteStore, user_id: Uuid) -> i64 {
  s.get_subscription(user_id, Subject::VoiceAssistant)
    .await
    .unwrap()
    .unwrap()
    .usage_count
}

#[tokio::test]
async fn conversation_counts_one_unit_of_usage() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  voice_trial(&s, ada.user_id, 50).await;

  let record = s
    .record_conversation_with_usage(conversation(ada.user_id, "call-1"), Subject::VoiceAssistant)
    .await
    .unwrap();
  let CallRecord::Recorded { conversation, usage } = record else {
    panic!("expected a new conversation, got {record:?}");
  };
  assert_eq!(conversation.call_id, "call-1");
  assert_eq!(usage.unwrap().usage_count, 1);

  let found = s.find_conversation("call-1").await.unwrap().unwrap();
  assert_eq!(found.conversation_id, conversation.conversation_id);
  assert_eq!(found.duration_seconds, 42);
}

#[tokio::test]
async fn duplicate_call_ids_are_not_counted_twice() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  voice_trial(&s, ada.user_id, 50).await;

  let first = s
    .record_conversation_with_usage(conversation(ada.user_id, "call-1"), Subject::VoiceAssistant)
    .await
    .unwrap()
    .into_conversation();
  let again = s
    .record_conversation_with_usage(conversation(ada.user_id, "call-1"), Subject::VoiceAssistant)
    .await
    .unwrap();
  let CallRecord::Duplicate(existing) = again else {
    panic!("expected the stored conversation, got {again:?}");
  };
  assert_eq!(existing.conversation_id, first.conversation_id);

  assert_eq!(voice_usage(&s, ada.user_id).await, 1);
  assert_eq!(s.list_conversations(ada.user_id).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reports_of_one_call_count_once() {
  let s = store().await;
  let user_id = user(&s, "ada").await.user_id;
  voice_trial(&s, user_id, 50).await;

  let mut handles = Vec::new();
  for _ in 0..8 {
    let s = s.clone();
    handles.push(tokio::spawn(async move {
      s.record_conversation_with_usage(conversation(user_id, "call-1"), Subject::VoiceAssistant)
        .await
    }));
  }

  let mut ids = Vec::new();
  let mut recorded = 0;
  for h in handles {
    let record = h.await.unwrap().unwrap();
    if matches!(record, CallRecord::Recorded { .. }) {
      recorded += 1;
    }
    ids.push(record.into_conversation().conversation_id);
  }
  assert_eq!(recorded, 1);
  assert!(ids.iter().all(|id| *id == ids[0]));
  assert_eq!(voice_usage(&s, user_id).await, 1);
  assert_eq!(s.list_conversations(user_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn conversation_past_the_limit_is_not_stored() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  voice_trial(&s, ada.user_id, 1).await;

  s.record_conversation_with_usage(conversation(ada.user_id, "call-1"), Subject::VoiceAssistant)
    .await
    .unwrap();
  let err = s
    .record_conversation_with_usage(conversation(ada.user_id, "call-2"), Subject::VoiceAssistant)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::QuotaExceeded { limit: 1, .. }));
  assert_eq!(err.kind(), ErrorKind::QuotaExceeded);

  assert!(s.find_conversation("call-2").await.unwrap().is_none());
  assert_eq!(voice_usage(&s, ada.user_id).await, 1);
}

#[tokio::test]
async fn conversation_without_a_subscription_is_stored_uncounted() {
  let s = store().await;
  let ada = user(&s, "ada").await;

  let record = s
    .record_conversation_with_usage(conversation(ada.user_id, "call-1"), Subject::VoiceAssistant)
    .await
    .unwrap();
  assert!(matches!(record, CallRecord::Recorded { usage: None, .. }));
  assert!(s.find_conversation("call-1").await.unwrap().is_some());
}

// ─── Testimonials ────────────────────────────────────────────────────────────

#[tokio::test]
async fn testimonials_need_approval_to_be_public() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let t = s
    .add_testimonial(NewTestimonial {
      user_id:        ada.user_id,
      author_name:    "Charles".into(),
      author_title:   Some("Inventor".into()),
      author_company: None,
      content:        "Remarkable work.".into(),
      rating:         5,
    })
    .await
    .unwrap();
  assert!(!t.is_approved);

  assert_eq!(s.list_testimonials(ada.user_id, false).await.unwrap().len(), 1);
  assert!(s.list_testimonials(ada.user_id, true).await.unwrap().is_empty());

  let approved = s.approve_testimonial(ada.user_id, t.testimonial_id).await.unwrap();
  assert!(approved.is_approved);
  assert_eq!(approved.rating, 5);
  assert_eq!(s.list_testimonials(ada.user_id, true).await.unwrap().len(), 1);

  s.delete_testimonial(ada.user_id, t.testimonial_id).await.unwrap();
  let err = s
    .delete_testimonial(ada.user_id, t.testimonial_id)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}
