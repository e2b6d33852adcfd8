// Temporary on-disk databases for the tests. In-memory
// SQLite would give every pooled connection its own 
// empty database.

use tempfile::TempDir;
use super::entities::*;
use super::{Pool, open_pool, init_schema, insert_user, insert_category, insert_article, article_by_id, category_by_id};
use crate::publishing::ArticleStatus;
use crate::utils::text_utils::slugify;

pub struct TestDb {
  // Declared first so the pool is dropped before the directory.
  pub pool: Pool,
  _dir: TempDir
}

impl TestDb {
  pub fn new() -> Self {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("newsdesk-test.sqlite");
    let pool = open_pool(path.to_str().unwrap(), 4).unwrap();
    init_schema(&pool).unwrap();
    Self { pool, _dir: dir }
  }

  pub fn author(&self) -> User {
    let count = super::all_users(&self.pool).unwrap().len();
    insert_user(
      &self.pool, 
      &format!("Author {}", count + 1), 
      &format!("author{}@newsdesk.test", count + 1), 
      1
    ).unwrap()
  }

  fn make_category(&self, name: &str, is_active: bool) -> Category {
    let row = CategoryRow {
      name: name.to_string(),
      slug: slugify(name),
      description: None,
      color: "#3b82f6".to_string(),
      is_active
    };
    let id = insert_category(&self.pool, &row, 1).unwrap();
    category_by_id(&self.pool, id).unwrap().unwrap()
  }

  pub fn category(&self, name: &str) -> Category {
    self.make_category(name, true)
  }

  pub fn inactive_category(&self, name: &str) -> Category {
    self.make_category(name, false)
  }

  // Raw row, bypasses the publishing rules on purpose so 
  // tests can build any state (published without date...).
  pub fn article_row(
    title: &str,
    category: &Category,
    author: &User,
    status: ArticleStatus,
    published_at: Option<i64>
  ) -> ArticleRow {
    ArticleRow {
      title: title.to_string(),
      slug: slugify(title),
      summary: format!("Summary of {}", title),
      content: format!("Content of {}", title),
      featured_image: None,
      status,
      published_at,
      category_id: category.id,
      author_id: author.id,
      meta_tags: None
    }
  }

  pub fn article(
    &self,
    title: &str,
    category: &Category,
    author: &User,
    status: ArticleStatus,
    published_at: Option<i64>
  ) -> Article {
    let row = Self::article_row(title, category, author, status, published_at);
    self.insert_row(&row, published_at.unwrap_or(1))
  }

  pub fn insert_row(&self, row: &ArticleRow, created_at: i64) -> Article {
    let id = insert_article(&self.pool, row, created_at).unwrap();
    article_by_id(&self.pool, id).unwrap().unwrap()
  }
}
