use rusqlite::{params, Connection, Params, Row, OptionalExtension, TransactionBehavior};
use rusqlite::functions::FunctionFlags;
use r2d2_sqlite::SqliteConnectionManager;
pub mod entities;
pub mod queries;
pub mod schema;
mod mappers;
#[cfg(test)]
pub mod test_fixtures;
use eyre::{Report, WrapErr};
use color_eyre::Result;
use log::debug;
use entities::*;
use mappers::*;
use crate::utils::text_utils::fold_case;
use queries::{ArticleSort, Order, OrderBy, Predicate, Query, VISIBLE_CLAUSE, visible_params};
pub use schema::init_schema;

// Type alias to make function signatures much clearer:
pub type Pool = r2d2::Pool<SqliteConnectionManager>;

// Column lists have to stay in sync with the mappers.
const ARTICLE_FIELDS: [&str; 18] = [
  "articles.id",
  "articles.title",
  "articles.slug",
  "articles.summary",
  "articles.content",
  "articles.featured_image",
  "articles.status",
  "articles.published_at",
  "articles.views_count",
  "articles.meta_tags",
  "articles.created_at",
  "articles.updated_at",
  "categories.id",
  "categories.name",
  "categories.slug",
  "categories.color",
  "users.id",
  "users.name"
];

// Every article select brings its category and author along.
const ARTICLE_FROM: &str = "articles \
  JOIN categories ON categories.id = articles.category_id \
  JOIN users ON users.id = articles.author_id";

const CATEGORY_FIELDS: &str = "categories.id, categories.name, categories.slug, \
  categories.description, categories.color, categories.is_active, \
  categories.created_at, categories.updated_at";

/// Ordering for the category listings that come with counts.
pub enum CategoryOrder {
  Name,
  ArticleCountDesc,
  CreatedDesc
}

impl CategoryOrder {
  fn order_by(&self) -> String {
    let fields = match self {
      CategoryOrder::Name => vec![OrderBy::new(Order::Asc, "categories.name")],
      CategoryOrder::ArticleCountDesc => vec![
        OrderBy::new(Order::Desc, "articles_count"),
        OrderBy::new(Order::Asc, "categories.name")
      ],
      CategoryOrder::CreatedDesc => vec![
        OrderBy::new(Order::Desc, "categories.created_at"),
        OrderBy::new(Order::Desc, "categories.id")
      ]
    };
    fields.iter()
      .map(|o| o.to_string())
      .collect::<Vec<String>>()
      .join(", ")
  }
}

// SQLite's lower() and LIKE only fold ASCII. Searching
// goes through this one instead.
fn register_lower_unicode(conn: &Connection) -> Result<(), rusqlite::Error> {
  conn.create_scalar_function(
    "lower_unicode",
    1,
    FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
    |ctx| {
      let value: Option<String> = ctx.get(0)?;
      Ok(value.map(|v| fold_case(&v)))
    }
  )
}

/**
 * Open the connection pool. Every new connection gets
 * foreign keys enabled (SQLite has them off by default)
 * and the lower_unicode() function used by the search.
 */
pub fn open_pool(db_path: &str, max_size: u32) -> Result<Pool> {
  let manager = SqliteConnectionManager::file(db_path)
    .with_init(|c| {
      c.execute_batch("PRAGMA foreign_keys = ON;")?;
      register_lower_unicode(c)
    });
  Pool::builder()
    .max_size(max_size)
    .build(manager)
    .context("Opening database connection pool")
}

/// True if the error chain contains a SQLite UNIQUE 
/// constraint failure (slug or email collision).
pub fn is_unique_violation(report: &Report) -> bool {
  report.chain().any(|e| match e.downcast_ref::<rusqlite::Error>() {
    Some(rusqlite::Error::SqliteFailure(failure, _)) =>
      failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
    _ => false
  })
}

fn select_many<T, P, F>(
  pool: &Pool, 
  query: &str, 
  params: P, 
  mapper: F
) -> Result<Vec<T>> 
  where
    P: Params,
    F: FnMut(&Row<'_>) -> Result<T, rusqlite::Error>,
{
  let conn = pool.get()?;
  let mut stmt = conn.prepare(query)?;
  let rows = stmt.query_map(params, mapper)
    .and_then(|mapped| mapped.collect::<Result<Vec<T>, rusqlite::Error>>());
  rows.context("Generic select_many query")
}

fn select_one<T, P, F>(
  pool: &Pool,
  query: &str,
  params: P,
  mapper: F
) -> Result<Option<T>>
  where
    P: Params,
    F: FnOnce(&Row<'_>) -> Result<T, rusqlite::Error>,
{
  let conn = pool.get()?;
  conn.query_row(query, params, mapper)
    .optional()
    .context("Generic select_one query")
}

fn count(pool: &Pool, query: &str, params: impl Params) -> Result<i64> {
  let conn = pool.get()?;
  conn.query_row(query, params, |row| row.get(0))
    .context("Count query")
}

/* --- Users --- */

pub fn insert_user(pool: &Pool, name: &str, email: &str, now: i64) -> Result<User> {
  let conn = pool.get()?;
  conn.execute(
    "INSERT INTO users (name, email, created_at) VALUES (?, ?, ?)",
    params![name, email, now]
  ).context("Inserting user")?;
  Ok(User {
    id: conn.last_insert_rowid(),
    name: name.to_string(),
    email: email.to_string(),
    created_at: now
  })
}

pub fn user_exists(pool: &Pool, user_id: i64) -> Result<bool> {
  count(pool, "SELECT count(*) FROM users WHERE id = ?", params![user_id])
    .map(|c| c > 0)
}

pub fn all_users(pool: &Pool) -> Result<Vec<User>> {
  select_many(
    pool,
    "SELECT id, name, email, created_at FROM users ORDER BY id ASC",
    [],
    map_user
  )
}

/* --- Categories --- */

pub fn insert_category(pool: &Pool, row: &CategoryRow, now: i64) -> Result<i64> {
  let conn = pool.get()?;
  conn.execute(
    "INSERT INTO categories 
    (name, slug, description, color, is_active, created_at, updated_at) 
    VALUES (?, ?, ?, ?, ?, ?, ?)",
    params![row.name, row.slug, row.description, row.color, row.is_active, now, now]
  ).context("Inserting category")?;
  Ok(conn.last_insert_rowid())
}

// Returns false when no category has that id.
pub fn update_category(pool: &Pool, id: i64, row: &CategoryRow, now: i64) -> Result<bool> {
  let conn = pool.get()?;
  let changed = conn.execute(
    "UPDATE categories SET name = ?, slug = ?, description = ?, 
    color = ?, is_active = ?, updated_at = ? WHERE id = ?",
    params![row.name, row.slug, row.description, row.color, row.is_active, now, id]
  ).context("Updating category")?;
  Ok(changed > 0)
}

pub fn category_by_id(pool: &Pool, id: i64) -> Result<Option<Category>> {
  select_one(
    pool,
    &format!("SELECT {} FROM categories WHERE categories.id = ?", CATEGORY_FIELDS),
    params![id],
    map_category
  )
}

pub fn category_by_slug(pool: &Pool, slug: &str) -> Result<Option<Category>> {
  select_one(
    pool,
    &format!("SELECT {} FROM categories WHERE categories.slug = ?", CATEGORY_FIELDS),
    params![slug],
    map_category
  )
}

pub fn category_id_by_slug(pool: &Pool, slug: &str) -> Result<Option<i64>> {
  select_one(
    pool,
    "SELECT id FROM categories WHERE slug = ?",
    params![slug],
    |row| row.get(0)
  )
}

pub fn category_exists(pool: &Pool, id: i64) -> Result<bool> {
  count(pool, "SELECT count(*) FROM categories WHERE id = ?", params![id])
    .map(|c| c > 0)
}

pub fn active_categories(pool: &Pool) -> Result<Vec<Category>> {
  select_many(
    pool,
    &format!(
      "SELECT {} FROM categories WHERE categories.is_active = 1 ORDER BY {}",
      CATEGORY_FIELDS,
      CategoryOrder::Name.order_by()
    ),
    [],
    map_category
  )
}

/// Active categories with the amount of publicly visible
/// articles each one holds.
pub fn active_categories_with_visible_counts(
  pool: &Pool,
  order: CategoryOrder,
  limit: Option<i64>
) -> Result<Vec<CategoryWithCount>> {
  let mut query = format!(
    "SELECT {}, (SELECT count(*) FROM articles WHERE articles.category_id = categories.id 
    AND {}) AS articles_count 
    FROM categories WHERE categories.is_active = 1 ORDER BY {}",
    CATEGORY_FIELDS,
    VISIBLE_CLAUSE,
    order.order_by()
  );
  if let Some(lim) = limit {
    query.push_str(&format!(" LIMIT {}", lim));
  }
  select_many(
    pool,
    &query,
    rusqlite::params_from_iter(visible_params()),
    map_category_with_count
  )
}

/// Every category (active or not) with the count of all 
/// its articles, whatever their status. Admin listing.
pub fn categories_with_article_counts(
  pool: &Pool,
  limit: i64,
  offset: i64
) -> Result<Vec<CategoryWithCount>> {
  select_many(
    pool,
    &format!(
      "SELECT {}, (SELECT count(*) FROM articles 
      WHERE articles.category_id = categories.id) AS articles_count 
      FROM categories ORDER BY {} LIMIT ? OFFSET ?",
      CATEGORY_FIELDS,
      CategoryOrder::CreatedDesc.order_by()
    ),
    params![limit, offset],
    map_category_with_count
  )
}

pub fn category_with_article_count(pool: &Pool, id: i64) -> Result<Option<CategoryWithCount>> {
  select_one(
    pool,
    &format!(
      "SELECT {}, (SELECT count(*) FROM articles 
      WHERE articles.category_id = categories.id) AS articles_count 
      FROM categories WHERE categories.id = ?",
      CATEGORY_FIELDS
    ),
    params![id],
    map_category_with_count
  )
}

pub fn category_count(pool: &Pool) -> Result<i64> {
  count(pool, "SELECT count(*) FROM categories", [])
}

/**
 * Delete a category unless articles still reference it.
 * The count and the delete happen in the same IMMEDIATE 
 * transaction so an article can't sneak in between.
 * Returns None if the category doesn't exist.
 */
pub fn delete_category(pool: &Pool, id: i64) -> Result<Option<CategoryDeletion>> {
  let mut conn = pool.get()?;
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let exists: i64 = tx.query_row(
    "SELECT count(*) FROM categories WHERE id = ?",
    params![id],
    |row| row.get(0)
  )?;
  if exists == 0 {
    return Ok(None);
  }
  let articles: i64 = tx.query_row(
    "SELECT count(*) FROM articles WHERE category_id = ?",
    params![id],
    |row| row.get(0)
  )?;
  if articles > 0 {
    // Dropping the transaction rolls it back.
    return Ok(Some(CategoryDeletion::HasArticles(articles)));
  }
  tx.execute("DELETE FROM categories WHERE id = ?", params![id])?;
  tx.commit().context("Deleting category")?;
  Ok(Some(CategoryDeletion::Deleted))
}

/* --- Articles --- */

pub fn insert_article(pool: &Pool, row: &ArticleRow, now: i64) -> Result<i64> {
  let conn = pool.get()?;
  conn.execute(
    "INSERT INTO articles 
    (title, slug, summary, content, featured_image, status, published_at, 
    category_id, author_id, views_count, meta_tags, created_at, updated_at) 
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?)",
    params![
      row.title,
      row.slug,
      row.summary,
      row.content,
      row.featured_image,
      row.status,
      row.published_at,
      row.category_id,
      row.author_id,
      meta_tags_to_json(&row.meta_tags)?,
      now,
      now
    ]
  ).context("Inserting article")?;
  Ok(conn.last_insert_rowid())
}

// The author and the view counter never change through
// an update.
pub fn update_article(pool: &Pool, id: i64, update: &ArticleUpdate, now: i64) -> Result<bool> {
  let conn = pool.get()?;
  let changed = conn.execute(
    "UPDATE articles SET title = ?, slug = ?, summary = ?, content = ?, 
    featured_image = ?, status = ?, published_at = ?, category_id = ?, 
    meta_tags = ?, updated_at = ? WHERE id = ?",
    params![
      update.title,
      update.slug,
      update.summary,
      update.content,
      update.featured_image,
      update.status,
      update.published_at,
      update.category_id,
      meta_tags_to_json(&update.meta_tags)?,
      now,
      id
    ]
  ).context("Updating article")?;
  Ok(changed > 0)
}

pub fn delete_article(pool: &Pool, id: i64) -> Result<bool> {
  let conn = pool.get()?;
  let changed = conn.execute("DELETE FROM articles WHERE id = ?", params![id])
    .context("Deleting article")?;
  Ok(changed > 0)
}

pub fn article_by_id(pool: &Pool, id: i64) -> Result<Option<Article>> {
  let query = Query::select(&ARTICLE_FIELDS, ARTICLE_FROM)
    .where_and(&["articles.id = ?".to_string()]);
  select_one(pool, &query.to_string(), params![id], map_article)
}

/**
 * Public detail fetch. Bumps the view counter of the visible
 * article with that slug and reads it back. The increment is
 * a single UPDATE so concurrent views can't overwrite each
 * other.
 * Drafts, archived articles and unknown slugs give None and
 * count nothing.
 */
pub fn view_article(pool: &Pool, slug: &str) -> Result<Option<Article>> {
  let conn = pool.get()?;
  let mut update_params = visible_params();
  update_params.insert(0, rusqlite::types::Value::Text(slug.to_string()));
  let changed = conn.execute(
    &format!(
      "UPDATE articles SET views_count = views_count + 1 WHERE articles.slug = ? AND {}",
      VISIBLE_CLAUSE
    ),
    rusqlite::params_from_iter(update_params)
  ).context("Incrementing article views")?;
  if changed == 0 {
    return Ok(None);
  }
  debug!("Counted a view for article {}", slug);
  let query = Query::select(&ARTICLE_FIELDS, ARTICLE_FROM)
    .where_and(&["articles.slug = ?".to_string()]);
  conn.query_row(&query.to_string(), params![slug], map_article)
    .optional()
    .context("Reading viewed article")
}

/// Articles matching a composed predicate, one page of them.
pub fn articles(
  pool: &Pool,
  predicate: &Predicate,
  sort: ArticleSort,
  limit: i64,
  offset: i64
) -> Result<Vec<Article>> {
  let query = Query::select(&ARTICLE_FIELDS, ARTICLE_FROM)
    .where_and(&predicate.clauses)
    .order(sort.order_by())
    .limit(limit)
    .offset(offset);
  select_many(
    pool,
    &query.to_string(),
    rusqlite::params_from_iter(predicate.params.iter()),
    map_article
  )
}

pub fn article_count(pool: &Pool, predicate: &Predicate) -> Result<i64> {
  let query = Query::count("articles")
    .where_and(&predicate.clauses);
  count(
    pool, 
    &query.to_string(), 
    rusqlite::params_from_iter(predicate.params.iter())
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use super::test_fixtures::TestDb;
  use super::queries::{ArticleCriteria, compose};
  use crate::publishing::ArticleStatus;
  use std::sync::Arc;
  use std::thread;

  #[test]
  fn category_round_trip_by_slug_and_id() {
    let db = TestDb::new();
    let category = db.category("World News");
    let by_slug = category_by_slug(&db.pool, "world-news").unwrap().unwrap();
    assert_eq!(category, by_slug);
    assert_eq!(Some(category.id), category_id_by_slug(&db.pool, "world-news").unwrap());
    assert_eq!(None, category_by_slug(&db.pool, "nope").unwrap());
  }

  #[test]
  fn duplicate_slug_is_a_unique_violation() {
    let db = TestDb::new();
    let author = db.author();
    let category = db.category("Tech");
    db.article("Same Title", &category, &author, ArticleStatus::Draft, None);
    let row = TestDb::article_row("Same Title", &category, &author, ArticleStatus::Draft, None);
    let err = insert_article(&db.pool, &row, 1).unwrap_err();
    assert!(is_unique_violation(&err));
  }

  #[test]
  fn other_errors_are_not_unique_violations() {
    let db = TestDb::new();
    let author = db.author();
    let category = db.category("Tech");
    let mut row = TestDb::article_row("Orphan", &category, &author, ArticleStatus::Draft, None);
    // Foreign key failure, not a uniqueness one.
    row.category_id = 999;
    let err = insert_article(&db.pool, &row, 1).unwrap_err();
    assert!(!is_unique_violation(&err));
  }

  #[test]
  fn meta_tags_survive_storage() {
    let db = TestDb::new();
    let author = db.author();
    let category = db.category("Tech");
    let mut row = TestDb::article_row("Tagged", &category, &author, ArticleStatus::Draft, None);
    row.meta_tags = Some(MetaTags {
      keywords: vec!["rust".to_string(), "sqlite".to_string()],
      description: Some("About storage".to_string())
    });
    let id = insert_article(&db.pool, &row, 1).unwrap();
    let stored = article_by_id(&db.pool, id).unwrap().unwrap();
    assert_eq!(row.meta_tags, stored.meta_tags);
    assert_eq!(category.name, stored.category.name);
    assert_eq!(author.name, stored.author.name);
  }

  #[test]
  fn view_article_only_counts_visible_articles() {
    let db = TestDb::new();
    let author = db.author();
    let category = db.category("Tech");
    db.article("Hidden Draft", &category, &author, ArticleStatus::Draft, None);
    let published = db.article("Out Now", &category, &author, ArticleStatus::Published, Some(10));

    assert_eq!(None, view_article(&db.pool, "hidden-draft").unwrap());
    assert_eq!(None, view_article(&db.pool, "missing").unwrap());
    let viewed = view_article(&db.pool, "out-now").unwrap().unwrap();
    assert_eq!(published.views_count + 1, viewed.views_count);
    let draft = article_by_id(&db.pool, published.id - 1).unwrap().unwrap();
    assert_eq!(0, draft.views_count);
  }

  #[test]
  fn concurrent_views_are_all_counted() {
    let db = TestDb::new();
    let author = db.author();
    let category = db.category("Tech");
    db.article("Popular", &category, &author, ArticleStatus::Published, Some(10));
    let pool = Arc::new(db.pool.clone());
    let handles: Vec<_> = (0..2)
      .map(|_| {
        let pool = Arc::clone(&pool);
        thread::spawn(move || view_article(&pool, "popular").unwrap().is_some())
      })
      .collect();
    for handle in handles {
      assert!(handle.join().unwrap());
    }
    let article = article_by_id(&db.pool, 1).unwrap().unwrap();
    assert_eq!(2, article.views_count);
  }

  #[test]
  fn delete_category_refuses_when_articles_reference_it() {
    let db = TestDb::new();
    let author = db.author();
    let busy = db.category("Busy");
    let empty = db.category("Empty");
    let article = db.article("Keeps Busy Busy", &busy, &author, ArticleStatus::Archived, None);

    assert_eq!(Some(CategoryDeletion::HasArticles(1)), delete_category(&db.pool, busy.id).unwrap());
    assert_eq!(Some(busy), category_by_id(&db.pool, article.category.id).unwrap());
    assert!(article_by_id(&db.pool, article.id).unwrap().is_some());

    assert_eq!(Some(CategoryDeletion::Deleted), delete_category(&db.pool, empty.id).unwrap());
    assert_eq!(None, category_by_id(&db.pool, empty.id).unwrap());
    assert_eq!(None, delete_category(&db.pool, empty.id).unwrap());
  }

  #[test]
  fn visible_counts_ignore_drafts_and_inactive_categories() {
    let db = TestDb::new();
    let author = db.author();
    let tech = db.category("Tech");
    let sports = db.category("Sports");
    let hidden = db.inactive_category("Hidden");
    db.article("T1", &tech, &author, ArticleStatus::Published, Some(10));
    db.article("T2", &tech, &author, ArticleStatus::Draft, None);
    db.article("S1", &sports, &author, ArticleStatus::Published, Some(10));
    db.article("S2", &sports, &author, ArticleStatus::Published, Some(11));
    db.article("H1", &hidden, &author, ArticleStatus::Published, Some(10));

    let counted = active_categories_with_visible_counts(
      &db.pool, CategoryOrder::ArticleCountDesc, None
    ).unwrap();
    let summary: Vec<(String, i64)> = counted.into_iter()
      .map(|c| (c.category.name, c.articles_count))
      .collect();
    assert_eq!(vec![("Sports".to_string(), 2), ("Tech".to_string(), 1)], summary);

    let all = categories_with_article_counts(&db.pool, 15, 0).unwrap();
    assert_eq!(3, all.len());
    let tech_count = all.iter().find(|c| c.category.id == tech.id).unwrap();
    assert_eq!(2, tech_count.articles_count);
  }

  #[test]
  fn article_page_and_count_share_the_predicate() {
    let db = TestDb::new();
    let author = db.author();
    let tech = db.category("Tech");
    for i in 0..5 {
      db.article(&format!("Story {}", i), &tech, &author, ArticleStatus::Published, Some(100 + i));
    }
    db.article("Draft story", &tech, &author, ArticleStatus::Draft, None);
    let predicate = compose(&ArticleCriteria::public());
    assert_eq!(5, article_count(&db.pool, &predicate).unwrap());
    let page = articles(&db.pool, &predicate, ArticleSort::PublishedDesc, 2, 2).unwrap();
    let titles: Vec<&str> = page.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(vec!["Story 2", "Story 1"], titles);
  }
}
