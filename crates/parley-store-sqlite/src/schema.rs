//! SQL schema for the Parley SQLite ledger.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
///
/// Timestamps are fixed-width RFC 3339 strings (microseconds, `Z` suffix) so
/// that lexical comparison in SQL matches chronological order.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS providers (
    provider_id   TEXT PRIMARY KEY,
    platform_id   INTEGER NOT NULL UNIQUE,
    display_name  TEXT NOT NULL,
    specialty     TEXT,
    status        TEXT NOT NULL DEFAULT 'pending',  -- 'pending' | 'approved' | 'rejected'
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS clients (
    client_id     TEXT PRIMARY KEY,
    platform_id   INTEGER NOT NULL UNIQUE,
    display_name  TEXT NOT NULL,
    registered_at TEXT NOT NULL
);

-- `used` only ever moves 0 -> 1, via a conditional UPDATE.
CREATE TABLE IF NOT EXISTS invitation_tokens (
    code          TEXT PRIMARY KEY,
    provider_id   TEXT NOT NULL REFERENCES providers(provider_id),
    used          INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL,
    used_at       TEXT
);

CREATE TABLE IF NOT EXISTS attachments (
    client_id     TEXT NOT NULL REFERENCES clients(client_id),
    provider_id   TEXT NOT NULL REFERENCES providers(provider_id),
    created_at    TEXT NOT NULL,
    expires_at    TEXT NOT NULL,
    PRIMARY KEY (client_id, provider_id),
    CHECK (expires_at > created_at)
);

CREATE TABLE IF NOT EXISTS dialogues (
    dialogue_id   TEXT PRIMARY KEY,
    client_id     TEXT NOT NULL REFERENCES clients(client_id),
    provider_id   TEXT NOT NULL REFERENCES providers(provider_id),
    state         TEXT NOT NULL DEFAULT 'active',   -- 'active' | 'completed'
    opened_at     TEXT NOT NULL,
    closed_at     TEXT
);

-- At most one active dialogue per pair.
CREATE UNIQUE INDEX IF NOT EXISTS dialogues_one_active_idx
    ON dialogues(client_id, provider_id) WHERE state = 'active';

-- Append-only. `seq` gives insertion order.
CREATE TABLE IF NOT EXISTS messages (
    seq           INTEGER PRIMARY KEY AUTOINCREMENT,
    message_id    TEXT NOT NULL UNIQUE,
    dialogue_id   TEXT NOT NULL REFERENCES dialogues(dialogue_id),
    sender_role   TEXT NOT NULL,                    -- 'client' | 'provider'
    sender_id     TEXT NOT NULL,
    text          TEXT NOT NULL,
    sent_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS registration_sessions (
    platform_id   INTEGER PRIMARY KEY,
    state_json    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS attachments_expiry_idx   ON attachments(expires_at);
CREATE INDEX IF NOT EXISTS attachments_provider_idx ON attachments(provider_id);
CREATE INDEX IF NOT EXISTS messages_dialogue_idx    ON messages(dialogue_id, seq);

PRAGMA user_version = 1;
";
