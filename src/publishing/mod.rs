/*
 * Publishing rules for articles. There is no transition table,
 * an administrator can move an article from any status to any
 * other. What we do derive is the published_at timestamp and
 * whether the public is allowed to see the article.
 *
 * Everything in here is pure, "now" is always passed in so
 * that the rules can be tested without a clock.
 */

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
  #[display(fmt = "draft")]
  Draft,
  #[display(fmt = "published")]
  Published,
  #[display(fmt = "archived")]
  Archived
}

impl ArticleStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      ArticleStatus::Draft => "draft",
      ArticleStatus::Published => "published",
      ArticleStatus::Archived => "archived"
    }
  }

  pub fn is_published(&self) -> bool {
    *self == ArticleStatus::Published
  }
}

impl Default for ArticleStatus {
  fn default() -> Self {
    ArticleStatus::Draft
  }
}

#[derive(Debug, Display, PartialEq)]
#[display(fmt = "Unknown article status: {}", _0)]
pub struct UnknownStatus(pub String);

impl std::error::Error for UnknownStatus {}

impl FromStr for ArticleStatus {
  type Err = UnknownStatus;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "draft" => Ok(ArticleStatus::Draft),
      "published" => Ok(ArticleStatus::Published),
      "archived" => Ok(ArticleStatus::Archived),
      other => Err(UnknownStatus(other.to_string()))
    }
  }
}

/// published_at for a brand new article.
///
/// A published article keeps an explicitly supplied date (the
/// seeder and imports backdate articles) or gets stamped with
/// `now`. Any other status starts without a publish date.
pub fn published_at_on_create(
  status: ArticleStatus,
  requested: Option<i64>,
  now: i64
) -> Option<i64> {
  if status.is_published() {
    Some(requested.unwrap_or(now))
  } else {
    None
  }
}

/// published_at after an administrator update.
///
/// Re-saving a published article keeps its original date,
/// moving away from published forgets it. Coming back to 
/// published (from draft or archived) stamps a new one.
pub fn published_at_on_update(
  new_status: ArticleStatus,
  current: Option<i64>,
  now: i64
) -> Option<i64> {
  if new_status.is_published() {
    Some(current.unwrap_or(now))
  } else {
    None
  }
}

/// The one rule deciding what the public gets to see.
/// The SQL version of it lives in db::queries.
pub fn is_publicly_visible(status: ArticleStatus, published_at: Option<i64>) -> bool {
  status.is_published() && published_at.is_some()
}
