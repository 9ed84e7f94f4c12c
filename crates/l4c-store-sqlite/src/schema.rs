//! SQL schema for the Link4Coders SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id         TEXT PRIMARY KEY,
    email           TEXT NOT NULL UNIQUE,
    username        TEXT NOT NULL UNIQUE,
    password_hash   TEXT NOT NULL,
    full_name       TEXT,
    profile_title   TEXT,
    bio             TEXT,
    avatar_url      TEXT,
    location        TEXT,
    website         TEXT,
    company         TEXT,
    github_username TEXT,
    template_id     TEXT NOT NULL DEFAULT 'developer_dark',
    is_public       INTEGER NOT NULL DEFAULT 1,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

-- Only the SHA-256 digest of a bearer token is kept.
CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS links (
    link_id     TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    title       TEXT NOT NULL,
    url         TEXT NOT NULL,
    description TEXT,
    category    TEXT NOT NULL,     -- LinkCategory, lowercase
    icon        TEXT,
    position    INTEGER NOT NULL,
    is_active   INTEGER NOT NULL DEFAULT 1,
    click_count INTEGER NOT NULL DEFAULT 0,
    metadata    TEXT,              -- JSON RepoMetadata or NULL
    created_at  TEXT NOT NULL
);

-- One row per (user, subject). The UNIQUE constraint is what makes a trial
-- non-repeatable under concurrent requests.
CREATE TABLE IF NOT EXISTS subscriptions (
    subscription_id  TEXT PRIMARY KEY,
    user_id          TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    subject          TEXT NOT NULL,   -- 'voice_assistant' | template id
    status           TEXT NOT NULL,   -- 'trial' | 'active' | 'expired' | 'cancelled'
    trial_start      TEXT,
    trial_end        TEXT,
    subscription_end TEXT,
    usage_count      INTEGER NOT NULL DEFAULT 0,
    usage_limit      INTEGER NOT NULL DEFAULT 0,   -- 0 = unmetered
    created_at       TEXT NOT NULL,
    UNIQUE (user_id, subject),
    CHECK  (usage_count >= 0)
);

CREATE TABLE IF NOT EXISTS voice_assistants (
    assistant_id   TEXT PRIMARY KEY,
    user_id        TEXT NOT NULL UNIQUE REFERENCES users(user_id) ON DELETE CASCADE,
    remote_id      TEXT NOT NULL,
    name           TEXT NOT NULL,
    system_prompt  TEXT NOT NULL,
    first_message  TEXT NOT NULL,
    voice_provider TEXT NOT NULL,
    voice_id       TEXT NOT NULL,
    model          TEXT NOT NULL,
    temperature    REAL NOT NULL,
    is_active      INTEGER NOT NULL DEFAULT 1,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS conversations (
    conversation_id  TEXT PRIMARY KEY,
    user_id          TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    call_id          TEXT NOT NULL UNIQUE,
    duration_seconds INTEGER NOT NULL DEFAULT 0,
    transcript       TEXT,
    summary          TEXT,
    ended_reason     TEXT,
    created_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS testimonials (
    testimonial_id TEXT PRIMARY KEY,
    user_id        TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    author_name    TEXT NOT NULL,
    author_title   TEXT,
    author_company TEXT,
    content        TEXT NOT NULL,
    rating         INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    is_approved    INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS links_user_category_idx ON links(user_id, category, position);
CREATE INDEX IF NOT EXISTS sessions_user_idx       ON sessions(user_id);
CREATE INDEX IF NOT EXISTS conversations_user_idx  ON conversations(user_id, created_at);
CREATE INDEX IF NOT EXISTS testimonials_user_idx   ON testimonials(user_id, created_at);

PRAGMA user_version = 1;
";
