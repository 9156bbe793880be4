//! v001 -- Initial schema creation.
//!
//! Creates the three core tables: `users`, `movies`, and `reviews`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    name          TEXT,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,              -- hex(salt)$hex(digest)
    created_at    TEXT NOT NULL               -- ISO-8601 / RFC-3339
);

-- ----------------------------------------------------------------
-- Movies
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS movies (
    id           TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    title        TEXT NOT NULL,
    release_date INTEGER NOT NULL,            -- year, [1900, 2100]
    genre        TEXT NOT NULL,
    actors       TEXT NOT NULL,               -- JSON array of actor credits
    image_url    TEXT,
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_movies_title ON movies(title);

-- ----------------------------------------------------------------
-- Reviews
-- ----------------------------------------------------------------
-- movie_id is a soft reference: no FOREIGN KEY on purpose, a review
-- may point at a movie id that no longer (or never did) exist.
CREATE TABLE IF NOT EXISTS reviews (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    movie_id   TEXT NOT NULL,
    username   TEXT NOT NULL,
    review     TEXT NOT NULL,
    rating     INTEGER NOT NULL,              -- [1, 5]
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reviews_movie_id ON reviews(movie_id);
"#;

/// Apply the v001 schema.
pub fn up(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(UP_SQL)
}
