/*
 * Everything administrators do to articles and categories.
 * This is where slugs get derived and where the publishing
 * rules run before anything hits the database.
 */

use derive_more::Display;
use eyre::Report;
use log::{info, warn};
use crate::db::{self, Pool};
use crate::db::entities::*;
use crate::publishing::{self, ArticleStatus};
use crate::utils::text_utils::slugify;
use crate::utils::time_utils::current_timestamp;

pub const DEFAULT_CATEGORY_COLOR: &str = "#3b82f6";

#[derive(Debug, Display)]
pub enum EditorialError {
  #[display(fmt = "Slug already in use: {}", _0)]
  SlugConflict(String),
  #[display(fmt = "Not found: {}", _0)]
  NotFound(String),
  #[display(fmt = "Database error: {}", _0)]
  Database(Report)
}

impl std::error::Error for EditorialError {}

impl From<Report> for EditorialError {
  fn from(report: Report) -> Self {
    EditorialError::Database(report)
  }
}

// Slug collisions are left to the UNIQUE index, we only
// recognize them afterwards. No retry, no "-2" suffix.
fn classify_write_error(report: Report, slug: &str) -> EditorialError {
  if db::is_unique_violation(&report) {
    warn!("Slug collision on \"{}\"", slug);
    EditorialError::SlugConflict(slug.to_string())
  } else {
    EditorialError::Database(report)
  }
}

#[derive(Debug, Clone)]
pub struct NewArticle {
  pub title: String,
  pub summary: String,
  pub content: String,
  pub featured_image: Option<String>,
  pub status: ArticleStatus,
  pub category_id: i64,
  pub author_id: i64,
  pub meta_tags: Option<MetaTags>,
  // Only honored for published articles, see
  // publishing::published_at_on_create.
  pub published_at: Option<i64>
}

#[derive(Debug, Clone)]
pub struct ArticleChanges {
  pub title: String,
  pub summary: String,
  pub content: String,
  pub featured_image: Option<String>,
  pub status: ArticleStatus,
  pub category_id: i64,
  pub meta_tags: Option<MetaTags>
}

// Optional fields keep their current value on update and
// fall back to defaults on create.
#[derive(Debug, Clone)]
pub struct CategoryInput {
  pub name: String,
  pub description: Option<String>,
  pub color: Option<String>,
  pub is_active: Option<bool>
}

fn reload_article(pool: &Pool, id: i64) -> Result<Article, EditorialError> {
  db::article_by_id(pool, id)?
    .ok_or_else(|| EditorialError::NotFound(format!("article {}", id)))
}

fn reload_category(pool: &Pool, id: i64) -> Result<Category, EditorialError> {
  db::category_by_id(pool, id)?
    .ok_or_else(|| EditorialError::NotFound(format!("category {}", id)))
}

pub fn create_article(pool: &Pool, input: NewArticle) -> Result<Article, EditorialError> {
  let now = current_timestamp();
  let row = ArticleRow {
    slug: slugify(&input.title),
    published_at: publishing::published_at_on_create(input.status, input.published_at, now),
    title: input.title,
    summary: input.summary,
    content: input.content,
    featured_image: input.featured_image,
    status: input.status,
    category_id: input.category_id,
    author_id: input.author_id,
    meta_tags: input.meta_tags
  };
  let id = db::insert_article(pool, &row, now)
    .map_err(|e| classify_write_error(e, &row.slug))?;
  info!("Created article {} ({}) as {}", id, row.slug, row.status);
  reload_article(pool, id)
}

pub fn update_article(
  pool: &Pool, 
  id: i64, 
  changes: ArticleChanges
) -> Result<Article, EditorialError> {
  let current = reload_article(pool, id)?;
  let now = current_timestamp();
  let update = ArticleUpdate {
    slug: slugify(&changes.title),
    published_at: publishing::published_at_on_update(
      changes.status, 
      current.published_at, 
      now
    ),
    title: changes.title,
    summary: changes.summary,
    content: changes.content,
    featured_image: changes.featured_image,
    status: changes.status,
    category_id: changes.category_id,
    meta_tags: changes.meta_tags
  };
  let updated = db::update_article(pool, id, &update, now)
    .map_err(|e| classify_write_error(e, &update.slug))?;
  if !updated {
    // Deleted in between.
    return Err(EditorialError::NotFound(format!("article {}", id)));
  }
  if current.status != update.status {
    info!("Article {} moved from {} to {}", id, current.status, update.status);
  }
  reload_article(pool, id)
}

pub fn delete_article(pool: &Pool, id: i64) -> Result<(), EditorialError> {
  if db::delete_article(pool, id)? {
    info!("Deleted article {}", id);
    Ok(())
  } else {
    Err(EditorialError::NotFound(format!("article {}", id)))
  }
}

pub fn create_category(pool: &Pool, input: CategoryInput) -> Result<Category, EditorialError> {
  let row = CategoryRow {
    slug: slugify(&input.name),
    name: input.name,
    description: input.description,
    color: input.color.unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
    is_active: input.is_active.unwrap_or(true)
  };
  let id = db::insert_category(pool, &row, current_timestamp())
    .map_err(|e| classify_write_error(e, &row.slug))?;
  info!("Created category {} ({})", id, row.slug);
  reload_category(pool, id)
}

pub fn update_category(
  pool: &Pool, 
  id: i64, 
  input: CategoryInput
) -> Result<Category, EditorialError> {
  let current = reload_category(pool, id)?;
  let row = CategoryRow {
    slug: slugify(&input.name),
    name: input.name,
    description: input.description,
    color: input.color.unwrap_or(current.color),
    is_active: input.is_active.unwrap_or(current.is_active)
  };
  let updated = db::update_category(pool, id, &row, current_timestamp())
    .map_err(|e| classify_write_error(e, &row.slug))?;
  if !updated {
    return Err(EditorialError::NotFound(format!("category {}", id)));
  }
  reload_category(pool, id)
}

/// A refusal because of dependent articles is a normal
/// outcome, only a missing category is an error.
pub fn delete_category(pool: &Pool, id: i64) -> Result<CategoryDeletion, EditorialError> {
  match db::delete_category(pool, id)? {
    Some(CategoryDeletion::HasArticles(count)) => {
      info!("Refused to delete category {}, {} article(s) use it", id, count);
      Ok(CategoryDeletion::HasArticles(count))
    },
    Some(CategoryDeletion::Deleted) => {
      info!("Deleted category {}", id);
      Ok(CategoryDeletion::Deleted)
    },
    None => Err(EditorialError::NotFound(format!("category {}", id)))
  }
}
