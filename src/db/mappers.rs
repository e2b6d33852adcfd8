use super::entities::*;
use crate::publishing::ArticleStatus;
use rusqlite::{Row, Error};
use rusqlite::types::{
  FromSql,
  FromSqlError,
  FromSqlResult,
  ToSql,
  ToSqlOutput,
  Type,
  ValueRef
};

// Statuses are stored as their lowercase name.
impl ToSql for ArticleStatus {
  fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
    Ok(ToSqlOutput::from(self.as_str()))
  }
}

impl FromSql for ArticleStatus {
  fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
    value.as_str()?
      .parse()
      .map_err(|e| FromSqlError::Other(Box::new(e)))
  }
}

pub fn meta_tags_to_json(meta_tags: &Option<MetaTags>) -> Result<Option<String>, Error> {
  match meta_tags {
    Some(m) => serde_json::to_string(m)
      .map(Some)
      .map_err(|e| Error::ToSqlConversionFailure(Box::new(e))),
    None => Ok(None)
  }
}

fn meta_tags_from_column(row: &Row, idx: usize) -> Result<Option<MetaTags>, Error> {
  let raw: Option<String> = row.get(idx)?;
  match raw {
    Some(json) => serde_json::from_str(&json)
      .map(Some)
      .map_err(|e| Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
    None => Ok(None)
  }
}

pub fn map_user(row: &Row) -> Result<User, Error> {
  Ok(User {
    id: row.get(0)?,
    name: row.get(1)?,
    email: row.get(2)?,
    created_at: row.get(3)?
  })
}

// Column order has to match db::CATEGORY_FIELDS.
pub fn map_category(row: &Row) -> Result<Category, Error> {
  Ok(Category {
    id: row.get(0)?,
    name: row.get(1)?,
    slug: row.get(2)?,
    description: row.get(3)?,
    color: row.get(4)?,
    is_active: row.get(5)?,
    created_at: row.get(6)?,
    updated_at: row.get(7)?
  })
}

// Same columns plus the count in last position.
pub fn map_category_with_count(row: &Row) -> Result<CategoryWithCount, Error> {
  Ok(CategoryWithCount {
    category: map_category(row)?,
    articles_count: row.get(8)?
  })
}

// Column order has to match db::ARTICLE_FIELDS.
pub fn map_article(row: &Row) -> Result<Article, Error> {
  Ok(Article {
    id: row.get(0)?,
    title: row.get(1)?,
    slug: row.get(2)?,
    summary: row.get(3)?,
    content: row.get(4)?,
    featured_image: row.get(5)?,
    status: row.get(6)?,
    published_at: row.get(7)?,
    views_count: row.get(8)?,
    meta_tags: meta_tags_from_column(row, 9)?,
    created_at: row.get(10)?,
    updated_at: row.get(11)?,
    category: CategoryRef {
      id: row.get(12)?,
      name: row.get(13)?,
      slug: row.get(14)?,
      color: row.get(15)?
    },
    author: Author {
      id: row.get(16)?,
      name: row.get(17)?
    }
  })
}
