use serde::{Deserialize, Serialize};
use crate::publishing::ArticleStatus;

// Rows as they come out of SQLite. Timestamps are Unix
// seconds, the DTOs in the app module turn them into 
// strings.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id: i64,
  pub name: String,
  pub email: String,
  pub created_at: i64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
  pub id: i64,
  pub name: String,
  pub slug: String,
  pub description: Option<String>,
  pub color: String,
  pub is_active: bool,
  pub created_at: i64,
  pub updated_at: i64
}

// Category listings always come with an article count,
// what is counted depends on the listing (visible articles
// for the public, everything for admins).
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryWithCount {
  pub category: Category,
  pub articles_count: i64
}

// The bits of the category and the author we join on 
// every article select.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
  pub id: i64,
  pub name: String,
  pub slug: String,
  pub color: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
  pub id: i64,
  pub name: String
}

// Stored as JSON text in the meta_tags column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaTags {
  #[serde(default)]
  pub keywords: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>
}

#[derive(Debug, Clone, PartialEq)]
pub struct Article {
  pub id: i64,
  pub title: String,
  pub slug: String,
  pub summary: String,
  pub content: String,
  pub featured_image: Option<String>,
  pub status: ArticleStatus,
  pub published_at: Option<i64>,
  pub views_count: i64,
  pub meta_tags: Option<MetaTags>,
  pub created_at: i64,
  pub updated_at: i64,
  pub category: CategoryRef,
  pub author: Author
}

// What gets written on insert. Slug and published_at have
// already been derived by the editorial module.
#[derive(Debug, Clone)]
pub struct ArticleRow {
  pub title: String,
  pub slug: String,
  pub summary: String,
  pub content: String,
  pub featured_image: Option<String>,
  pub status: ArticleStatus,
  pub published_at: Option<i64>,
  pub category_id: i64,
  pub author_id: i64,
  pub meta_tags: Option<MetaTags>
}

#[derive(Debug, Clone)]
pub struct CategoryRow {
  pub name: String,
  pub slug: String,
  pub description: Option<String>,
  pub color: String,
  pub is_active: bool
}

// Same as ArticleRow minus the author, which an update
// can't change.
#[derive(Debug, Clone)]
pub struct ArticleUpdate {
  pub title: String,
  pub slug: String,
  pub summary: String,
  pub content: String,
  pub featured_image: Option<String>,
  pub status: ArticleStatus,
  pub published_at: Option<i64>,
  pub category_id: i64,
  pub meta_tags: Option<MetaTags>
}

// Deleting a category is refused (not failed) while 
// articles still point to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CategoryDeletion {
  Deleted,
  HasArticles(i64)
}
