//! SQL schema for the kbase SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
///
/// Parent references are plain columns without foreign keys: cascades are
/// performed explicitly, leaves first. Slug scopes are backed by unique
/// indexes so a racing insert fails instead of creating a duplicate.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS categories (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    slug        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    icon        TEXT NOT NULL DEFAULT 'Folder',
    sort_order  INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,   -- RFC 3339 UTC, fixed-width nanoseconds
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS subcategories (
    id               TEXT PRIMARY KEY,
    main_category_id TEXT NOT NULL,
    name             TEXT NOT NULL,
    slug             TEXT NOT NULL,
    description      TEXT NOT NULL DEFAULT '',
    sort_order       INTEGER NOT NULL DEFAULT 0,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS articles (
    id             TEXT PRIMARY KEY,
    subcategory_id TEXT NOT NULL,
    title          TEXT NOT NULL,
    slug           TEXT NOT NULL,
    excerpt        TEXT NOT NULL DEFAULT '',
    content        TEXT NOT NULL DEFAULT '',
    status         TEXT NOT NULL DEFAULT 'draft',   -- 'draft' | 'published'
    sort_order     INTEGER NOT NULL DEFAULT 0,
    featured       INTEGER NOT NULL DEFAULT 0,
    tags           TEXT NOT NULL DEFAULT '[]',      -- JSON array
    views          INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS admins (
    id            TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS categories_slug_idx
    ON categories(slug);
CREATE UNIQUE INDEX IF NOT EXISTS subcategories_slug_idx
    ON subcategories(main_category_id, slug);
CREATE UNIQUE INDEX IF NOT EXISTS articles_slug_idx
    ON articles(subcategory_id, slug);
CREATE INDEX IF NOT EXISTS articles_status_idx ON articles(status);
CREATE INDEX IF NOT EXISTS articles_slug_lookup_idx ON articles(slug);

PRAGMA user_version = 1;
";
