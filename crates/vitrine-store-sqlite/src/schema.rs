//! SQL schema for the Vitrine SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Names compare with the default BINARY collation: case-sensitive.
CREATE TABLE IF NOT EXISTS tags (
    tag_id      TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    color       TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS profiles (
    profile_id   TEXT PRIMARY KEY,
    username     TEXT NOT NULL UNIQUE,
    full_name    TEXT NOT NULL,
    profile_pic  TEXT NOT NULL,   -- proxied reference or placeholder URL
    bio          TEXT NOT NULL,
    followers    INTEGER NOT NULL CHECK (followers >= 0),
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

-- Many-to-many; rows disappear with either side.
CREATE TABLE IF NOT EXISTS profile_tags (
    profile_id  TEXT NOT NULL REFERENCES profiles(profile_id) ON DELETE CASCADE,
    tag_id      TEXT NOT NULL REFERENCES tags(tag_id)         ON DELETE CASCADE,
    PRIMARY KEY (profile_id, tag_id)
);

CREATE INDEX IF NOT EXISTS profile_tags_tag_idx   ON profile_tags(tag_id);
CREATE INDEX IF NOT EXISTS profiles_followers_idx ON profiles(followers);

PRAGMA user_version = 1;
";
