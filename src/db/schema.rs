use color_eyre::Result;
use eyre::WrapErr;
use super::Pool;

// Tables are created if missing when the server or the
// seeder starts. There is no migration system, changing
// a table means doing it by hand.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  email TEXT NOT NULL UNIQUE,
  created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  slug TEXT NOT NULL UNIQUE,
  description TEXT,
  color TEXT NOT NULL DEFAULT '#3b82f6',
  is_active INTEGER NOT NULL DEFAULT 1,
  created_at INTEGER NOT NULL,
  updated_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS categories_active_created
  ON categories (is_active, created_at);

CREATE TABLE IF NOT EXISTS articles (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  title TEXT NOT NULL,
  slug TEXT NOT NULL UNIQUE,
  summary TEXT NOT NULL,
  content TEXT NOT NULL,
  featured_image TEXT,
  status TEXT NOT NULL DEFAULT 'draft',
  published_at INTEGER,
  category_id INTEGER NOT NULL
    REFERENCES categories (id) ON DELETE CASCADE,
  author_id INTEGER NOT NULL
    REFERENCES users (id) ON DELETE CASCADE,
  views_count INTEGER NOT NULL DEFAULT 0 CHECK (views_count >= 0),
  meta_tags TEXT,
  created_at INTEGER NOT NULL,
  updated_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS articles_status_published
  ON articles (status, published_at);
CREATE INDEX IF NOT EXISTS articles_category_status_published
  ON articles (category_id, status, published_at);
CREATE INDEX IF NOT EXISTS articles_author
  ON articles (author_id);
CREATE INDEX IF NOT EXISTS articles_created
  ON articles (created_at);
";

pub fn init_schema(pool: &Pool) -> Result<()> {
  let conn = pool.get()?;
  conn.execute_batch(SCHEMA)
    .context("Creating database schema")
}
