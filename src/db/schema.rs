//! SQL DDL for initializing the wallet storage.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema with:
/// - UUID v4 text primary keys
/// - `users.username` / `users.email` UNIQUE, stored lower-cased
/// - `email_verifications.token` UNIQUE, cascading on user deletion
/// - `cards.card_number` / `cards.barcode` / `cards.qr_data` UNIQUE, cascading on user deletion
/// - timestamps as RFC3339 text, booleans as INTEGER 0/1
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id TEXT PRIMARY KEY NOT NULL,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    confirmed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS email_verifications (
    verification_id TEXT PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    token TEXT NOT NULL UNIQUE,
    expires_at TEXT NOT NULL,
    confirmed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_email_verifications_user_id ON email_verifications(user_id);

CREATE TABLE IF NOT EXISTS cards (
    card_id TEXT PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    card_number TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    description TEXT NULL,
    color TEXT NULL,
    barcode TEXT NOT NULL UNIQUE,
    barcode_type TEXT NOT NULL,
    qr_data TEXT NOT NULL UNIQUE,
    added_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cards_user_id ON cards(user_id);

CREATE TABLE IF NOT EXISTS pictures (
    picture_id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    path TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pictures_path ON pictures(path)
"#;
