//! SQL schema for the Vitrine SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Content tables. Each stores the non-identity columns of a row as a JSON
/// object in `data`, so partially populated rows round-trip unchanged.
pub const CONTENT_TABLES: &[&str] = &[
  "announcements",
  "services",
  "cases",
  "links",
  "home_projects",
  "settings",
  "theme_settings",
];

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS announcements (
    id          INTEGER PRIMARY KEY,
    data        TEXT NOT NULL DEFAULT '{}',
    created_at  TEXT NOT NULL           -- RFC 3339 UTC; server-assigned
);

CREATE TABLE IF NOT EXISTS services (
    id          INTEGER PRIMARY KEY,
    data        TEXT NOT NULL DEFAULT '{}',
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cases (
    id          INTEGER PRIMARY KEY,
    data        TEXT NOT NULL DEFAULT '{}',
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS links (
    id          INTEGER PRIMARY KEY,
    data        TEXT NOT NULL DEFAULT '{}',
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS home_projects (
    id          INTEGER PRIMARY KEY,
    data        TEXT NOT NULL DEFAULT '{}',
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS theme_settings (
    id          INTEGER PRIMARY KEY,
    data        TEXT NOT NULL DEFAULT '{}',
    created_at  TEXT NOT NULL
);

-- Key/value profile settings; the key is chosen by the editor.
CREATE TABLE IF NOT EXISTS settings (
    key         TEXT PRIMARY KEY,
    data        TEXT NOT NULL DEFAULT '{}',
    created_at  TEXT NOT NULL
);

-- Append-only. No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS admin_logs (
    id          INTEGER PRIMARY KEY,
    action      TEXT NOT NULL,          -- 'create' | 'update' | 'delete' | 'sync'
    entity      TEXT NOT NULL,
    description TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

PRAGMA user_version = 1;
";
