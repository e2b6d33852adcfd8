// Query building for the article listings. Every listing
// is described by an ArticleCriteria, which gets composed
// into a Predicate (WHERE clauses + bound values). The 
// Query builder then stitches it into the SELECT or 
// the count(*) statement.

use std::fmt;
use rusqlite::types::Value;
use crate::publishing::ArticleStatus;
use crate::utils::text_utils;

pub enum Order {
  Asc,
  Desc
}

pub struct OrderBy {
  pub order: Order,
  pub field: String
}

impl OrderBy {
  pub fn new(order: Order, field: &str) -> Self {
    OrderBy {
      order,
      field: field.to_string()
    }
  }
}

impl fmt::Display for OrderBy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.order {
      Order::Asc => write!(f, "{} ASC", self.field),
      Order::Desc => write!(f, "{} DESC", self.field)
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Visibility {
  // status = published and published_at is set
  Public,
  // Admin screens see every status
  Any
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArticleSort {
  PublishedDesc,
  CreatedDesc
}

impl ArticleSort {
  // The id tie-break keeps pages stable when timestamps
  // (seconds) collide.
  pub fn order_by(&self) -> Vec<OrderBy> {
    match self {
      ArticleSort::PublishedDesc => vec![
        OrderBy::new(Order::Desc, "articles.published_at"),
        OrderBy::new(Order::Desc, "articles.id")
      ],
      ArticleSort::CreatedDesc => vec![
        OrderBy::new(Order::Desc, "articles.created_at"),
        OrderBy::new(Order::Desc, "articles.id")
      ]
    }
  }
}

/// Everything a listing can filter articles on. Optional
/// fields that are None don't constrain anything.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleCriteria {
  pub visibility: Visibility,
  pub category_id: Option<i64>,
  pub search: Option<String>,
  pub exclude_id: Option<i64>
}

impl ArticleCriteria {
  pub fn public() -> Self {
    Self {
      visibility: Visibility::Public,
      category_id: None,
      search: None,
      exclude_id: None
    }
  }

  pub fn any_status() -> Self {
    Self {
      visibility: Visibility::Any,
      ..Self::public()
    }
  }

  pub fn in_category(mut self, category_id: Option<i64>) -> Self {
    self.category_id = category_id;
    self
  }

  // Blank search text is the same as no search at all.
  pub fn matching(mut self, search: Option<&str>) -> Self {
    self.search = search
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(String::from);
    self
  }

  pub fn excluding(mut self, article_id: i64) -> Self {
    self.exclude_id = Some(article_id);
    self
  }
}

#[derive(Debug, Default, PartialEq)]
pub struct Predicate {
  pub clauses: Vec<String>,
  pub params: Vec<Value>
}

impl Predicate {
  fn push(&mut self, clause: &str, params: Vec<Value>) {
    self.clauses.push(clause.to_string());
    self.params.extend(params);
  }
}

/// Visibility rule in SQL form, see publishing::is_publicly_visible.
pub const VISIBLE_CLAUSE: &str =
  "articles.status = ? AND articles.published_at IS NOT NULL";

pub fn visible_params() -> Vec<Value> {
  vec![Value::Text(ArticleStatus::Published.as_str().to_string())]
}

// lower_unicode() is registered on every connection by
// db::open_pool, the pattern is already folded.
const SEARCH_CLAUSE: &str =
  "(lower_unicode(articles.title) LIKE ? ESCAPE '\\' \
  OR lower_unicode(articles.summary) LIKE ? ESCAPE '\\' \
  OR lower_unicode(articles.content) LIKE ? ESCAPE '\\')";

/// Turn listing criteria into WHERE clauses. Clauses are 
/// glued with AND by the Query builder, the search clause 
/// carries its own ORs.
pub fn compose(criteria: &ArticleCriteria) -> Predicate {
  let mut predicate = Predicate::default();
  if criteria.visibility == Visibility::Public {
    predicate.push(VISIBLE_CLAUSE, visible_params());
  }
  if let Some(category_id) = criteria.category_id {
    predicate.push("articles.category_id = ?", vec![Value::Integer(category_id)]);
  }
  if let Some(search) = &criteria.search {
    let pattern = text_utils::contains_pattern(search);
    predicate.push(
      SEARCH_CLAUSE, 
      vec![
        Value::Text(pattern.clone()), 
        Value::Text(pattern.clone()), 
        Value::Text(pattern)
      ]
    );
  }
  if let Some(id) = criteria.exclude_id {
    predicate.push("articles.id != ?", vec![Value::Integer(id)]);
  }
  predicate
}

// Builder for the SELECT statements. The "q_" prefix is
// there because "where" is a reserved keyword.
pub struct Query {
  q_fields: Vec<String>,
  q_from: String,
  q_where: Vec<String>,
  q_order: Vec<OrderBy>,
  limit: Option<i64>,
  offset: Option<i64>
}

impl Query {

  pub fn select(fields: &[&str], from: &str) -> Self {
    Query {
      q_fields: fields.iter().map(|f| f.to_string()).collect(),
      q_from: from.to_string(),
      q_where: Vec::new(),
      q_order: Vec::new(),
      limit: None,
      offset: None
    }
  }

  pub fn count(from: &str) -> Self {
    Self::select(&["count(*)"], from)
  }

  pub fn where_and(mut self, clauses: &[String]) -> Self {
    self.q_where.extend(clauses.iter().cloned());
    self
  }

  pub fn order(mut self, order: Vec<OrderBy>) -> Self {
    self.q_order = order;
    self
  }

  pub fn limit(mut self, limit: i64) -> Self {
    self.limit = Some(limit);
    self
  }

  pub fn offset(mut self, offset: i64) -> Self {
    self.offset = Some(offset);
    self
  }

}

// Creating the query string is done by implementing 
// Display, which gives us to_string().
impl fmt::Display for Query {

  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "SELECT {} FROM {}", self.q_fields.join(","), self.q_from)?;
    if !self.q_where.is_empty() {
      write!(f, " WHERE {}", self.q_where.join(" AND "))?;
    }
    if !self.q_order.is_empty() {
      let order: Vec<String> = self.q_order.iter()
        .map(|o| o.to_string())
        .collect();
      write!(f, " ORDER BY {}", order.join(","))?;
    }
    if let Some(lim) = self.limit {
      write!(f, " LIMIT {}", lim)?;
      if let Some(off) = self.offset {
        write!(f, " OFFSET {}", off)?;
      }
    }
    Ok(())
  }

}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn generate_simple_select() {
    let query = Query::select(&["my_table.name", "my_table.value"], "my_table");
    let expected = "SELECT my_table.name,my_table.value FROM my_table";
    assert_eq!(query.to_string(), expected);
  }

  #[test]
  fn generate_full_select() {
    let query = Query::select(&["t1.name", "t2.value"], "t1 JOIN t2 ON t2.id = t1.t2_id")
      .where_and(&["t1.id = ?".to_string(), "t2.value > ?".to_string()])
      .order(vec![OrderBy::new(Order::Desc, "t1.name"), OrderBy::new(Order::Asc, "t1.id")])
      .limit(10)
      .offset(20);
    let expected = "SELECT t1.name,t2.value FROM t1 JOIN t2 ON t2.id = t1.t2_id \
      WHERE t1.id = ? AND t2.value > ? ORDER BY t1.name DESC,t1.id ASC LIMIT 10 OFFSET 20";
    assert_eq!(query.to_string(), expected);
  }

  #[test]
  fn generate_count() {
    let query = Query::count("articles").where_and(&["articles.id = ?".to_string()]);
    assert_eq!(query.to_string(), "SELECT count(*) FROM articles WHERE articles.id = ?");
  }

  #[test]
  fn admin_criteria_has_no_clause() {
    assert_eq!(Predicate::default(), compose(&ArticleCriteria::any_status()));
  }

  #[test]
  fn public_criteria_always_filters_visibility() {
    let predicate = compose(&ArticleCriteria::public());
    assert_eq!(vec![VISIBLE_CLAUSE.to_string()], predicate.clauses);
    assert_eq!(vec![Value::Text("published".to_string())], predicate.params);
  }

  #[test]
  fn full_criteria_composes_in_order() {
    let criteria = ArticleCriteria::public()
      .in_category(Some(3))
      .matching(Some("  ALPHA "))
      .excluding(9);
    let predicate = compose(&criteria);
    assert_eq!(4, predicate.clauses.len());
    assert_eq!("articles.category_id = ?", predicate.clauses[1]);
    assert!(predicate.clauses[2].contains("lower_unicode(articles.content) LIKE ?"));
    assert_eq!("articles.id != ?", predicate.clauses[3]);
    assert_eq!(
      vec![
        Value::Text("published".to_string()),
        Value::Integer(3),
        Value::Text("%alpha%".to_string()),
        Value::Text("%alpha%".to_string()),
        Value::Text("%alpha%".to_string()),
        Value::Integer(9)
      ],
      predicate.params
    );
  }

  #[test]
  fn blank_search_is_ignored() {
    let criteria = ArticleCriteria::public().matching(Some("   "));
    assert_eq!(None, criteria.search);
    assert_eq!(1, compose(&criteria).clauses.len());
  }

  #[test]
  fn sort_orders() {
    let published: Vec<String> = ArticleSort::PublishedDesc.order_by()
      .iter().map(|o| o.to_string()).collect();
    assert_eq!(vec!["articles.published_at DESC", "articles.id DESC"], published);
    let created: Vec<String> = ArticleSort::CreatedDesc.order_by()
      .iter().map(|o| o.to_string()).collect();
    assert_eq!(vec!["articles.created_at DESC", "articles.id DESC"], created);
  }
}
