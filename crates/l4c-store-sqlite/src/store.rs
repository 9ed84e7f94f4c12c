//! [`SqliteStore`]: the SQLite implementation of [`PortfolioStore`].

use std::path::Path;

use chrono::Utc;
use l4c_core::{
  assistant::VoiceAssistant,
  engagement::{CallRecord, Conversation, NewConversation, NewTestimonial, Testimonial},
  link::{Link, LinkCategory, LinkUpdate, NewLink},
  profile::{NewUser, ProfileUpdate, Session, User},
  store::PortfolioStore,
  subscription::{NewTrial, Subject, Subscription, SubscriptionStatus},
  template::TemplateId,
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    ASSISTANT_COLUMNS, CONVERSATION_COLUMNS, LINK_COLUMNS, RawAssistant, RawConversation,
    RawLink, RawSession, RawSubscription, RawTestimonial, RawUser, SUBSCRIPTION_COLUMNS,
    TESTIMONIAL_COLUMNS, USER_COLUMNS, encode_dt, encode_metadata, encode_uuid,
  },
  error::is_unique_violation,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Link4Coders store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// What a conditional usage increment found.
enum UsageOutcome {
  Missing,
  AtLimit(i64),
  Recorded(RawSubscription),
}

impl UsageOutcome {
  /// Add one to `usage_count` unless the row is at its limit, then read the
  /// row back.
  fn count(conn: &rusqlite::Connection, user_id: &str, subject: &str) -> rusqlite::Result<Self> {
    let changed = conn.execute(
      "UPDATE subscriptions SET usage_count = usage_count + 1
       WHERE user_id = ?1 AND subject = ?2
         AND (usage_limit = 0 OR usage_count < usage_limit)",
      rusqlite::params![user_id, subject],
    )?;
    let row = conn
      .query_row(
        &format!(
          "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
           WHERE user_id = ?1 AND subject = ?2"
        ),
        rusqlite::params![user_id, subject],
        RawSubscription::from_row,
      )
      .optional()?;
    Ok(match (changed, row) {
      (_, None) => Self::Missing,
      (0, Some(raw)) => Self::AtLimit(raw.usage_limit),
      (_, Some(raw)) => Self::Recorded(raw),
    })
  }
}

/// A call report as it came out of the transaction.
enum RawCallRecord {
  Duplicate(RawConversation),
  Recorded(RawConversation, UsageOutcome),
}

/// A link row ready for insertion; `position` is resolved inside the
/// transaction when the caller left it open.
struct LinkRow {
  link_id:     String,
  user_id:     String,
  title:       String,
  url:         String,
  description: Option<String>,
  category:    &'static str,
  icon:        Option<String>,
  position:    Option<i64>,
  metadata:    Option<String>,
  created_at:  String,
}

impl LinkRow {
  fn new(input: &NewLink, created_at: &str) -> Result<Self> {
    Ok(Self {
      link_id:     encode_uuid(Uuid::new_v4()),
      user_id:     encode_uuid(input.user_id),
      title:       input.title.clone(),
      url:         input.url.clone(),
      description: input.description.clone(),
      category:    input.category.into(),
      icon:        input.icon.clone(),
      position:    input.position,
      metadata:    encode_metadata(input.metadata.as_ref())?,
      created_at:  created_at.to_owned(),
    })
  }

  /// Insert within `conn` (normally a transaction) and return the stored id.
  fn insert(self, conn: &rusqlite::Connection) -> rusqlite::Result<String> {
    let position = match self.position {
      Some(p) => p,
      None => conn.query_row(
        "SELECT COALESCE(MAX(position), -1) + 1 FROM links WHERE user_id = ?1 AND category = ?2",
        rusqlite::params![self.user_id, self.category],
        |r| r.get(0),
      )?,
    };
    conn.execute(
      "INSERT INTO links (
         link_id, user_id, title, url, description, category, icon,
         position, is_active, click_count, metadata, created_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, 0, ?9, ?10)",
      rusqlite::params![
        self.link_id,
        self.user_id,
        self.title,
        self.url,
        self.description,
        self.category,
        self.icon,
        position,
        self.metadata,
        self.created_at,
      ],
    )?;
    Ok(self.link_id)
  }
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Write every profile column of `user` back to its row.
  async fn write_user(&self, user: &User) -> Result<()> {
    let id_str          = encode_uuid(user.user_id);
    let full_name       = user.full_name.clone();
    let profile_title   = user.profile_title.clone();
    let bio             = user.bio.clone();
    let avatar_url      = user.avatar_url.clone();
    let location        = user.location.clone();
    let website         = user.website.clone();
    let company         = user.company.clone();
    let github_username = user.github_username.clone();
    let template_id     = user.template_id.clone();
    let is_public       = user.is_public;
    let updated_at      = encode_dt(user.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE users SET
             full_name = ?2, profile_title = ?3, bio = ?4, avatar_url = ?5,
             location = ?6, website = ?7, company = ?8, github_username = ?9,
             template_id = ?10, is_public = ?11, updated_at = ?12
           WHERE user_id = ?1",
          rusqlite::params![
            id_str,
            full_name,
            profile_title,
            bio,
            avatar_url,
            location,
            website,
            company,
            github_username,
            template_id,
            is_public,
            updated_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn require_user(&self, user_id: Uuid) -> Result<User> {
    self.get_user(user_id).await?.ok_or(Error::UserNotFound(user_id))
  }

  async fn get_link(&self, user_id: Uuid, link_id: Uuid) -> Result<Option<Link>> {
    let user_str = encode_uuid(user_id);
    let link_str = encode_uuid(link_id);

    let raw: Option<RawLink> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {LINK_COLUMNS} FROM links WHERE link_id = ?1 AND user_id = ?2"),
            rusqlite::params![link_str, user_str],
            RawLink::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawLink::into_link).transpose()
  }

  async fn get_testimonial(&self, testimonial_id: Uuid) -> Result<Option<Testimonial>> {
    let id_str = encode_uuid(testimonial_id);

    let raw: Option<RawTestimonial> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {TESTIMONIAL_COLUMNS} FROM testimonials WHERE testimonial_id = ?1"),
            rusqlite::params![id_str],
            RawTestimonial::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawTestimonial::into_testimonial).transpose()
  }

  async fn query_assistant(
    &self,
    column: &'static str,
    value: String,
  ) -> Result<Option<VoiceAssistant>> {
    let raw: Option<RawAssistant> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {ASSISTANT_COLUMNS} FROM voice_assistants WHERE {column} = ?1"),
            rusqlite::params![value],
            RawAssistant::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAssistant::into_assistant).transpose()
  }

  async fn query_user(&self, column: &'static str, value: String) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
            rusqlite::params![value],
            |row| RawUser::from_row(row, 0),
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }
}

// ─── PortfolioStore impl ─────────────────────────────────────────────────────

impl PortfolioStore for SqliteStore {
  type Error = Error;

  // ── Users and sessions ────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let now = Utc::now();
    let user = User {
      user_id:         Uuid::new_v4(),
      email:           input.email,
      username:        input.username,
      full_name:       input.full_name,
      profile_title:   None,
      bio:             None,
      avatar_url:      None,
      location:        None,
      website:         None,
      company:         None,
      github_username: None,
      template_id:     TemplateId::default().to_string(),
      is_public:       true,
      created_at:      now,
      updated_at:      now,
    };

    let id_str        = encode_uuid(user.user_id);
    let email         = user.email.clone();
    let username      = user.username.clone();
    let full_name     = user.full_name.clone();
    let template_id   = user.template_id.clone();
    let at_str        = encode_dt(now);
    let password_hash = input.password_hash;

    let inserted = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (
             user_id, email, username, password_hash, full_name,
             template_id, is_public, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)",
          rusqlite::params![id_str, email, username, password_hash, full_name, template_id, at_str],
        )?;
        Ok(())
      })
      .await;

    match inserted {
      Ok(()) => Ok(user),
      Err(e) if is_unique_violation(&e) => Err(Error::UserExists),
      Err(e) => Err(e.into()),
    }
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    self.query_user("user_id", encode_uuid(user_id)).await
  }

  async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
    self.query_user("username", username.to_ascii_lowercase()).await
  }

  async fn find_credentials(&self, email: &str) -> Result<Option<(User, String)>> {
    let email = email.trim().to_ascii_lowercase();

    let raw: Option<(RawUser, String)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?1"),
            rusqlite::params![email],
            |row| Ok((RawUser::from_row(row, 0)?, row.get(15)?)),
          )
          .optional()?)
      })
      .await?;

    raw
      .map(|(user, hash)| Ok((user.into_user()?, hash)))
      .transpose()
  }

  async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<User> {
    let mut user = self.require_user(user_id).await?;
    update.apply(&mut user, Utc::now());
    self.write_user(&user).await?;
    Ok(user)
  }

  async fn set_template(&self, user_id: Uuid, template: TemplateId) -> Result<User> {
    let mut user = self.require_user(user_id).await?;
    user.template_id = template.to_string();
    user.updated_at = Utc::now();
    self.write_user(&user).await?;
    Ok(user)
  }

  async fn create_session(&self, session: Session) -> Result<()> {
    let user_str    = encode_uuid(session.user_id);
    let created_str = encode_dt(session.created_at);
    let expires_str = encode_dt(session.expires_at);
    let hash        = session.token_hash;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![hash, user_str, created_str, expires_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn find_session(&self, token_hash: &str) -> Result<Option<Session>> {
    let hash = token_hash.to_owned();

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT token_hash, user_id, created_at, expires_at
             FROM sessions WHERE token_hash = ?1",
            rusqlite::params![hash],
            |row| {
              Ok(RawSession {
                token_hash: row.get(0)?,
                user_id:    row.get(1)?,
                created_at: row.get(2)?,
                expires_at: row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  async fn revoke_session(&self, token_hash: &str) -> Result<()> {
    let hash = token_hash.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM sessions WHERE token_hash = ?1", rusqlite::params![hash])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Links ─────────────────────────────────────────────────────────────────

  async fn add_link(&self, input: NewLink) -> Result<Link> {
    let user_id = input.user_id;
    let mut links = self.insert_links(vec![input]).await?;
    links.pop().ok_or(Error::UserNotFound(user_id))
  }

  async fn list_links(&self, user_id: Uuid) -> Result<Vec<Link>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawLink> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {LINK_COLUMNS} FROM links WHERE user_id = ?1 ORDER BY position, created_at"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], RawLink::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut links: Vec<Link> = raws.into_iter().map(RawLink::into_link).collect::<Result<_>>()?;
    // Stable: keeps position order within each category.
    links.sort_by_key(|l| l.category as usize);
    Ok(links)
  }

  async fn update_link(&self, user_id: Uuid, link_id: Uuid, update: LinkUpdate) -> Result<Link> {
    let mut link = self
      .get_link(user_id, link_id)
      .await?
      .ok_or(Error::LinkNotFound(link_id))?;
    update.apply(&mut link);

    let id_str      = encode_uuid(link.link_id);
    let title       = link.title.clone();
    let url         = link.url.clone();
    let description = link.description.clone();
    let category    = <&'static str>::from(link.category);
    let icon        = link.icon.clone();
    let position    = link.position;
    let is_active   = link.is_active;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE links SET
             title = ?2, url = ?3, description = ?4, category = ?5,
             icon = ?6, position = ?7, is_active = ?8
           WHERE link_id = ?1",
          rusqlite::params![id_str, title, url, description, category, icon, position, is_active],
        )?;
        Ok(())
      })
      .await?;

    Ok(link)
  }

  async fn delete_link(&self, user_id: Uuid, link_id: Uuid) -> Result<()> {
    let user_str = encode_uuid(user_id);
    let link_str = encode_uuid(link_id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM links WHERE link_id = ?1 AND user_id = ?2",
          rusqlite::params![link_str, user_str],
        )?)
      })
      .await?;

    if deleted == 0 {
      return Err(Error::LinkNotFound(link_id));
    }
    Ok(())
  }

  async fn max_position(&self, user_id: Uuid, category: LinkCategory) -> Result<Option<i64>> {
    let user_str = encode_uuid(user_id);
    let category = <&'static str>::from(category);

    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(conn.query_row(
            "SELECT MAX(position) FROM links WHERE user_id = ?1 AND category = ?2",
            rusqlite::params![user_str, category],
            |r| r.get::<_, Option<i64>>(0),
          )?)
        })
        .await?,
    )
  }

  async fn insert_links(&self, links: Vec<NewLink>) -> Result<Vec<Link>> {
    if links.is_empty() {
      return Ok(Vec::new());
    }
    let at_str = encode_dt(Utc::now());
    let rows = links
      .iter()
      .map(|l| LinkRow::new(l, &at_str))
      .collect::<Result<Vec<_>>>()?;

    let raws: Vec<RawLink> = self
      .conn
      .call(move |conn| {
        // Dropping the transaction on any error rolls the whole batch back.
        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
          ids.push(row.insert(&tx)?);
        }
        let mut inserted = Vec::with_capacity(ids.len());
        {
          let mut stmt =
            tx.prepare(&format!("SELECT {LINK_COLUMNS} FROM links WHERE link_id = ?1"))?;
          for id in &ids {
            inserted.push(stmt.query_row(rusqlite::params![id], RawLink::from_row)?);
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;

    raws.into_iter().map(RawLink::into_link).collect()
  }

  async fn increment_clicks(&self, link_id: Uuid) -> Result<i64> {
    let id_str = encode_uuid(link_id);

    let count: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "UPDATE links SET click_count = click_count + 1
             WHERE link_id = ?1
             RETURNING click_count",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?)
      })
      .await?;

    count.ok_or(Error::LinkNotFound(link_id))
  }

  // ── Subscriptions ─────────────────────────────────────────────────────────

  async fn get_subscription(
    &self,
    user_id: Uuid,
    subject: Subject,
  ) -> Result<Option<Subscription>> {
    let user_str = encode_uuid(user_id);
    let subject_str = subject.as_str();

    let raw: Option<RawSubscription> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
               WHERE user_id = ?1 AND subject = ?2"
            ),
            rusqlite::params![user_str, subject_str],
            RawSubscription::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSubscription::into_subscription).transpose()
  }

  async fn start_trial(&self, trial: NewTrial) -> Result<Subscription> {
    if self.get_subscription(trial.user_id, trial.subject).await?.is_some() {
      return Err(Error::AlreadyUsed(trial.subject));
    }

    let subscription = Subscription {
      subscription_id:  Uuid::new_v4(),
      user_id:          trial.user_id,
      subject:          trial.subject,
      status:           SubscriptionStatus::Trial,
      trial_start:      Some(trial.trial_start),
      trial_end:        Some(trial.trial_end),
      subscription_end: None,
      usage_count:      0,
      usage_limit:      trial.usage_limit,
      created_at:       Utc::now(),
    };

    let id_str      = encode_uuid(subscription.subscription_id);
    let user_str    = encode_uuid(subscription.user_id);
    let subject_str = subscription.subject.as_str();
    let status_str  = subscription.status.as_str();
    let start_str   = encode_dt(trial.trial_start);
    let end_str     = encode_dt(trial.trial_end);
    let limit       = subscription.usage_limit;
    let at_str      = encode_dt(subscription.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subscriptions (
             subscription_id, user_id, subject, status, trial_start, trial_end,
             subscription_end, usage_count, usage_limit, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, 0, ?7, ?8)",
          rusqlite::params![id_str, user_str, subject_str, status_str, start_str, end_str, limit, at_str],
        )?;
        Ok(())
      })
      .await;

    match inserted {
      Ok(()) => Ok(subscription),
      // A concurrent request won the race between the check and the insert.
      Err(e) if is_unique_violation(&e) => Err(Error::AlreadyUsed(trial.subject)),
      Err(e) => Err(e.into()),
    }
  }

  async fn record_usage(&self, user_id: Uuid, subject: Subject) -> Result<Option<Subscription>> {
    let user_str = encode_uuid(user_id);
    let subject_str = subject.as_str();

    let outcome = self
      .conn
      .call(move |conn| Ok(UsageOutcome::count(conn, &user_str, subject_str)?))
      .await?;

    match outcome {
      UsageOutcome::Missing => Ok(None),
      UsageOutcome::AtLimit(limit) => Err(Error::QuotaExceeded { subject, limit }),
      UsageOutcome::Recorded(raw) => raw.into_subscription().map(Some),
    }
  }

  // ── Voice assistant ───────────────────────────────────────────────────────

  async fn get_assistant(&self, user_id: Uuid) -> Result<Option<VoiceAssistant>> {
    self.query_assistant("user_id", encode_uuid(user_id)).await
  }

  async fn find_assistant_by_remote_id(&self, remote_id: &str) -> Result<Option<VoiceAssistant>> {
    self.query_assistant("remote_id", remote_id.to_owned()).await
  }

  async fn save_assistant(&self, assistant: VoiceAssistant) -> Result<VoiceAssistant> {
    let user_id = assistant.user_id;
    let params = (
      encode_uuid(assistant.assistant_id),
      encode_uuid(assistant.user_id),
      assistant.remote_id,
      assistant.name,
      assistant.system_prompt,
      assistant.first_message,
      assistant.voice_provider,
      assistant.voice_id,
      assistant.model,
      f64::from(assistant.temperature),
      assistant.is_active,
      encode_dt(assistant.created_at),
      encode_dt(assistant.updated_at),
    );

    self
      .conn
      .call(move |conn| {
        // The row keeps its original id and creation time on replace.
        conn.execute(
          "INSERT INTO voice_assistants (
             assistant_id, user_id, remote_id, name, system_prompt, first_message,
             voice_provider, voice_id, model, temperature, is_active, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
           ON CONFLICT(user_id) DO UPDATE SET
             remote_id      = excluded.remote_id,
             name           = excluded.name,
             system_prompt  = excluded.system_prompt,
             first_message  = excluded.first_message,
             voice_provider = excluded.voice_provider,
             voice_id       = excluded.voice_id,
             model          = excluded.model,
             temperature    = excluded.temperature,
             is_active      = excluded.is_active,
             updated_at     = excluded.updated_at",
          params,
        )?;
        Ok(())
      })
      .await?;

    self.get_assistant(user_id).await?.ok_or(Error::UserNotFound(user_id))
  }

  // ── Conversations ─────────────────────────────────────────────────────────

  async fn record_conversation_with_usage(
    &self,
    input: NewConversation,
    subject: Subject,
  ) -> Result<CallRecord> {
    let user_str = encode_uuid(input.user_id);
    let subject_str = subject.as_str();
    let call_id = input.call_id.clone();
    let row = (
      encode_uuid(Uuid::new_v4()),
      user_str.clone(),
      input.call_id,
      input.duration_seconds,
      input.transcript,
      input.summary,
      input.ended_reason,
      encode_dt(Utc::now()),
    );

    let record = self
      .conn
      .call(move |conn| {
        // Returning without a commit rolls the insert back.
        let tx = conn.transaction()?;
        let inserted = tx.execute(
          &format!(
            "INSERT INTO conversations ({CONVERSATION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(call_id) DO NOTHING"
          ),
          row,
        )?;
        let stored = tx.query_row(
          &format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE call_id = ?1"),
          rusqlite::params![call_id],
          RawConversation::from_row,
        )?;
        if inserted == 0 {
          return Ok(RawCallRecord::Duplicate(stored));
        }

        let usage = UsageOutcome::count(&tx, &user_str, subject_str)?;
        if !matches!(usage, UsageOutcome::AtLimit(_)) {
          tx.commit()?;
        }
        Ok(RawCallRecord::Recorded(stored, usage))
      })
      .await?;

    match record {
      RawCallRecord::Duplicate(raw) => Ok(CallRecord::Duplicate(raw.into_conversation()?)),
      RawCallRecord::Recorded(_, UsageOutcome::AtLimit(limit)) => {
        Err(Error::QuotaExceeded { subject, limit })
      }
      RawCallRecord::Recorded(raw, UsageOutcome::Missing) => Ok(CallRecord::Recorded {
        conversation: raw.into_conversation()?,
        usage:        None,
      }),
      RawCallRecord::Recorded(raw, UsageOutcome::Recorded(sub)) => Ok(CallRecord::Recorded {
        conversation: raw.into_conversation()?,
        usage:        Some(sub.into_subscription()?),
      }),
    }
  }

  async fn find_conversation(&self, call_id: &str) -> Result<Option<Conversation>> {
    let call_id = call_id.to_owned();

    let raw: Option<RawConversation> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE call_id = ?1"),
            rusqlite::params![call_id],
            RawConversation::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawConversation::into_conversation).transpose()
  }

  async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<Conversation>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawConversation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CONVERSATION_COLUMNS} FROM conversations
           WHERE user_id = ?1 ORDER BY created_at DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], RawConversation::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawConversation::into_conversation).collect()
  }

  // ── Testimonials ──────────────────────────────────────────────────────────

  async fn add_testimonial(&self, input: NewTestimonial) -> Result<Testimonial> {
    let testimonial = Testimonial {
      testimonial_id: Uuid::new_v4(),
      user_id:        input.user_id,
      author_name:    input.author_name,
      author_title:   input.author_title,
      author_company: input.author_company,
      content:        input.content,
      rating:         input.rating,
      is_approved:    false,
      created_at:     Utc::now(),
    };

    let params = (
      encode_uuid(testimonial.testimonial_id),
      encode_uuid(testimonial.user_id),
      testimonial.author_name.clone(),
      testimonial.author_title.clone(),
      testimonial.author_company.clone(),
      testimonial.content.clone(),
      i64::from(testimonial.rating),
      encode_dt(testimonial.created_at),
    );

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO testimonials (
             testimonial_id, user_id, author_name, author_title, author_company,
             content, rating, is_approved, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8)",
          params,
        )?;
        Ok(())
      })
      .await?;

    Ok(testimonial)
  }

  async fn list_testimonials(&self, user_id: Uuid, approved_only: bool) -> Result<Vec<Testimonial>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawTestimonial> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {TESTIMONIAL_COLUMNS} FROM testimonials
           WHERE user_id = ?1 AND (?2 = 0 OR is_approved = 1)
           ORDER BY created_at DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str, approved_only], RawTestimonial::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTestimonial::into_testimonial).collect()
  }

  async fn approve_testimonial(&self, user_id: Uuid, testimonial_id: Uuid) -> Result<Testimonial> {
    let user_str = encode_uuid(user_id);
    let id_str   = encode_uuid(testimonial_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE testimonials SET is_approved = 1 WHERE testimonial_id = ?1 AND user_id = ?2",
          rusqlite::params![id_str, user_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::TestimonialNotFound(testimonial_id));
    }
    self
      .get_testimonial(testimonial_id)
      .await?
      .ok_or(Error::TestimonialNotFound(testimonial_id))
  }

  async fn delete_testimonial(&self, user_id: Uuid, testimonial_id: Uuid) -> Result<()> {
    let user_str = encode_uuid(user_id);
    let id_str   = encode_uuid(testimonial_id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM testimonials WHERE testimonial_id = ?1 AND user_id = ?2",
          rusqlite::params![id_str, user_str],
        )?)
      })
      .await?;

    if deleted == 0 {
      return Err(Error::TestimonialNotFound(testimonial_id));
    }
    Ok(())
  }
}
