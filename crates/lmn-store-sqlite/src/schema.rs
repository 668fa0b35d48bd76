//! SQL schema for the LMN SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL,
    first_name    TEXT NOT NULL DEFAULT '',
    last_name     TEXT NOT NULL DEFAULT '',
    password_hash TEXT NOT NULL,      -- argon2 PHC string
    date_joined   TEXT NOT NULL
);

-- One row per user, created in the same transaction.
CREATE TABLE IF NOT EXISTS profiles (
    user_id INTEGER PRIMARY KEY REFERENCES users(user_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS venues (
    venue_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name     TEXT NOT NULL,
    city     TEXT NOT NULL,
    state    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS artists (
    artist_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS shows (
    show_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    show_date TEXT NOT NULL,          -- UTC, fixed microsecond precision
    artist_id INTEGER NOT NULL REFERENCES artists(artist_id) ON DELETE CASCADE,
    venue_id  INTEGER NOT NULL REFERENCES venues(venue_id)   ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS notes (
    note_id          INTEGER PRIMARY KEY AUTOINCREMENT,
    show_id          INTEGER NOT NULL REFERENCES shows(show_id) ON DELETE CASCADE,
    user_id          INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    title            TEXT NOT NULL,
    text             TEXT NOT NULL,
    posted_date      TEXT NOT NULL,
    image_path       TEXT,            -- key below the media root
    image_name       TEXT,
    image_hash       TEXT,            -- sha-256 hex
    image_media_type TEXT,
    CHECK (length(title) <= 200),
    CHECK (length(text)  <= 1000)
);

CREATE TABLE IF NOT EXISTS show_ratings (
    rating_id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id            INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    show_id            INTEGER NOT NULL REFERENCES shows(show_id) ON DELETE CASCADE,
    rating_out_of_five INTEGER NOT NULL,
    posted_date        TEXT NOT NULL,
    UNIQUE (user_id, show_id),
    CHECK  (rating_out_of_five BETWEEN 1 AND 5)
);

-- Rows appear the first time a badge is awarded.
CREATE TABLE IF NOT EXISTS badges (
    badge_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    slug           TEXT NOT NULL UNIQUE,
    name           TEXT NOT NULL,
    description    TEXT NOT NULL,
    notes_required INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS profile_badges (
    user_id    INTEGER NOT NULL REFERENCES profiles(user_id) ON DELETE CASCADE,
    badge_id   INTEGER NOT NULL REFERENCES badges(badge_id)  ON DELETE CASCADE,
    awarded_at TEXT NOT NULL,
    PRIMARY KEY (user_id, badge_id)
);

CREATE INDEX IF NOT EXISTS shows_artist_idx   ON shows(artist_id);
CREATE INDEX IF NOT EXISTS shows_venue_idx    ON shows(venue_id);
CREATE INDEX IF NOT EXISTS notes_show_idx     ON notes(show_id, posted_date);
CREATE INDEX IF NOT EXISTS notes_user_idx     ON notes(user_id, posted_date);
CREATE INDEX IF NOT EXISTS notes_posted_idx   ON notes(posted_date);
CREATE INDEX IF NOT EXISTS ratings_show_idx   ON show_ratings(show_id);

PRAGMA user_version = 1;
";
