use serde::{Deserialize, Serialize};
use chrono::DateTime;
use derive_more::Display;
use crate::db::entities::*;
use crate::editorial::{ArticleChanges, CategoryInput, NewArticle};
use crate::listing::{ArticleDetail, CategorySection, HomeFeed, ListingFilters};
use crate::listing::pagination::{parse_page, Page};
use crate::publishing::{self, ArticleStatus};
use crate::utils::{serde_utils, text_utils, time_utils};

// Entities get converted to DTOs with From, mostly to
// turn timestamps into dates and to hide what the 
// public doesn't need.

// These two are already exactly what we send.
pub use crate::db::entities::CategoryRef as CategoryRefDto;
pub use crate::db::entities::Author as AuthorDto;

const MAX_TITLE_LENGTH: usize = 255;
const MAX_SUMMARY_LENGTH: usize = 500;
const MAX_IMAGE_LENGTH: usize = 255;
const MAX_META_DESCRIPTION_LENGTH: usize = 160;
const MAX_CATEGORY_NAME_LENGTH: usize = 255;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDto {
  pub id: i64,
  pub title: String,
  pub slug: String,
  pub summary: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub content: Option<String>,
  pub featured_image: Option<String>,
  pub status: ArticleStatus,
  pub published_at: Option<String>,
  pub is_public: bool,
  pub views_count: i64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub meta_tags: Option<MetaTags>,
  pub category: CategoryRefDto,
  pub author: AuthorDto,
  pub created_at: String,
  pub updated_at: String
}

impl From<Article> for ArticleDto {
  fn from(article: Article) -> Self {
    Self {
      is_public: publishing::is_publicly_visible(article.status, article.published_at),
      id: article.id,
      title: article.title,
      slug: article.slug,
      summary: article.summary,
      content: Some(article.content),
      featured_image: article.featured_image,
      status: article.status,
      published_at: time_utils::option_timestamp_to_rfc3339(article.published_at),
      views_count: article.views_count,
      meta_tags: article.meta_tags,
      category: article.category,
      author: article.author,
      created_at: time_utils::timestamp_to_rfc3339(article.created_at),
      updated_at: time_utils::timestamp_to_rfc3339(article.updated_at)
    }
  }
}

// Listings don't send the full article body.
impl ArticleDto {
  pub fn without_content(mut self) -> Self {
    self.content = None;
    self
  }
}

pub fn article_card(article: Article) -> ArticleDto {
  ArticleDto::from(article).without_content()
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
  pub id: i64,
  pub name: String,
  pub slug: String,
  pub description: Option<String>,
  pub color: String,
  pub is_active: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub articles_count: Option<i64>,
  pub created_at: String,
  pub updated_at: String
}

impl From<Category> for CategoryDto {
  fn from(category: Category) -> Self {
    Self {
      id: category.id,
      name: category.name,
      slug: category.slug,
      description: category.description,
      color: category.color,
      is_active: category.is_active,
      articles_count: None,
      created_at: time_utils::timestamp_to_rfc3339(category.created_at),
      updated_at: time_utils::timestamp_to_rfc3339(category.updated_at)
    }
  }
}

impl From<CategoryWithCount> for CategoryDto {
  fn from(counted: CategoryWithCount) -> Self {
    let mut dto = CategoryDto::from(counted.category);
    dto.articles_count = Some(counted.articles_count);
    dto
  }
}

fn category_dtos<T: Into<CategoryDto>>(categories: Vec<T>) -> Vec<CategoryDto> {
  categories.into_iter().map(Into::into).collect()
}

#[derive(Debug, Serialize)]
pub struct ArticleFiltersDto {
  pub category: Option<String>,
  pub search: Option<String>
}

#[derive(Debug, Serialize)]
pub struct ArticleListingDto {
  pub articles: Page<ArticleDto>,
  pub categories: Vec<CategoryDto>,
  pub filters: ArticleFiltersDto
}

impl ArticleListingDto {
  pub fn new(
    articles: Page<Article>, 
    categories: Vec<CategoryWithCount>, 
    filters: ListingFilters
  ) -> Self {
    Self {
      articles: articles.map(article_card),
      categories: category_dtos(categories),
      filters: ArticleFiltersDto {
        category: filters.category,
        search: filters.search
      }
    }
  }
}

#[derive(Debug, Serialize)]
pub struct SearchFilterDto {
  pub search: Option<String>
}

#[derive(Debug, Serialize)]
pub struct CategoryListingDto {
  pub category: CategoryDto,
  pub articles: Page<ArticleDto>,
  pub filters: SearchFilterDto
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDetailDto {
  pub article: ArticleDto,
  pub related_articles: Vec<ArticleDto>
}

impl From<ArticleDetail> for ArticleDetailDto {
  fn from(detail: ArticleDetail) -> Self {
    Self {
      article: detail.article.into(),
      related_articles: detail.related.into_iter().map(article_card).collect()
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySectionDto {
  pub category: CategoryDto,
  pub latest_articles: Vec<ArticleDto>
}

impl From<CategorySection> for CategorySectionDto {
  fn from(section: CategorySection) -> Self {
    Self {
      category: section.category.into(),
      latest_articles: section.latest.into_iter().map(article_card).collect()
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeDto {
  pub featured_articles: Vec<ArticleDto>,
  pub categories: Vec<CategoryDto>,
  pub sections: Vec<CategorySectionDto>
}

impl From<HomeFeed> for HomeDto {
  fn from(feed: HomeFeed) -> Self {
    Self {
      featured_articles: feed.featured.into_iter().map(article_card).collect(),
      categories: category_dtos(feed.categories),
      sections: feed.sections.into_iter().map(Into::into).collect()
    }
  }
}

#[derive(Debug, Serialize)]
pub struct HealthDto {
  pub status: String,
  pub timestamp: String
}

/* --- Query strings --- */

// The page is kept as a string so that garbage falls 
// back to the first page instead of a 400.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
  pub search: Option<String>,
  pub category: Option<String>,
  pub page: Option<String>
}

impl From<ListingQuery> for ListingFilters {
  fn from(query: ListingQuery) -> Self {
    Self {
      page: parse_page(query.page.as_deref()),
      search: serde_utils::empty_string_to_none(query.search),
      category: serde_utils::empty_string_to_none(query.category)
    }
  }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
  pub page: Option<String>
}

impl PageQuery {
  pub fn page(&self) -> Option<u32> {
    parse_page(self.page.as_deref())
  }
}

/* --- Admin forms --- */

// Everything is optional at the serde level so that a 
// missing field gives a readable message from validate()
// instead of a generic JSON error.
#[derive(Debug, Default, Deserialize)]
pub struct ArticleForm {
  pub title: Option<String>,
  pub summary: Option<String>,
  pub content: Option<String>,
  pub featured_image: Option<String>,
  pub status: Option<ArticleStatus>,
  pub category_id: Option<i64>,
  // Only read on creation. Authentication is handled in
  // front of this service, which passes the author along.
  pub author_id: Option<i64>,
  pub published_at: Option<String>,
  pub meta_tags: Option<MetaTags>
}

fn trimmed(value: &Option<String>) -> &str {
  value.as_deref().map(str::trim).unwrap_or("")
}

impl ArticleForm {

  /// Field checks that don't need the database. Existence
  /// of the category and author is checked by the handler.
  pub fn validate(&self, creating: bool) -> Vec<String> {
    let mut errors = Vec::new();
    let title = trimmed(&self.title);
    if title.is_empty() {
      errors.push("Article title is required.".to_string());
    } else if text_utils::char_count(title) > MAX_TITLE_LENGTH {
      errors.push("Article title cannot exceed 255 characters.".to_string());
    } else if text_utils::slugify(title).is_empty() {
      // The slug is the only public way to reach the article.
      errors.push("Article title must contain letters or numbers.".to_string());
    }
    let summary = trimmed(&self.summary);
    if summary.is_empty() {
      errors.push("Article summary is required.".to_string());
    } else if text_utils::char_count(summary) > MAX_SUMMARY_LENGTH {
      errors.push("Article summary cannot exceed 500 characters.".to_string());
    }
    if trimmed(&self.content).is_empty() {
      errors.push("Article content is required.".to_string());
    }
    if text_utils::char_count(trimmed(&self.featured_image)) > MAX_IMAGE_LENGTH {
      errors.push("Featured image cannot exceed 255 characters.".to_string());
    }
    if self.status.is_none() {
      errors.push("Article status is required.".to_string());
    }
    if self.category_id.is_none() {
      errors.push("Please select a category.".to_string());
    }
    if let Some(description) = self.meta_tags.as_ref().and_then(|m| m.description.as_ref()) {
      if text_utils::char_count(description) > MAX_META_DESCRIPTION_LENGTH {
        errors.push("Meta description cannot exceed 160 characters.".to_string());
      }
    }
    if creating {
      if self.author_id.is_none() {
        errors.push("An author is required.".to_string());
      }
      if self.published_timestamp().is_err() {
        errors.push("Publish date must be an RFC 3339 date.".to_string());
      }
    }
    errors
  }

  pub fn published_timestamp(&self) -> Result<Option<i64>, chrono::ParseError> {
    match trimmed(&self.published_at) {
      "" => Ok(None),
      date => DateTime::parse_from_rfc3339(date).map(|d| Some(d.timestamp()))
    }
  }

  // Should only be called on a validated form, missing
  // fields fall back to empty values.
  pub fn into_changes(self) -> ArticleChanges {
    ArticleChanges {
      title: trimmed(&self.title).to_string(),
      summary: trimmed(&self.summary).to_string(),
      featured_image: serde_utils::empty_string_to_none(
        self.featured_image.map(|i| i.trim().to_string())
      ),
      status: self.status.unwrap_or_default(),
      category_id: self.category_id.unwrap_or_default(),
      meta_tags: self.meta_tags,
      content: self.content.unwrap_or_default()
    }
  }

  pub fn into_new_article(self) -> NewArticle {
    let author_id = self.author_id.unwrap_or_default();
    let published_at = self.published_timestamp().ok().flatten();
    let changes = self.into_changes();
    NewArticle {
      title: changes.title,
      summary: changes.summary,
      content: changes.content,
      featured_image: changes.featured_image,
      status: changes.status,
      category_id: changes.category_id,
      author_id,
      meta_tags: changes.meta_tags,
      published_at
    }
  }
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryForm {
  pub name: Option<String>,
  pub description: Option<String>,
  pub color: Option<String>,
  pub is_active: Option<bool>
}

impl CategoryForm {
  pub fn validate(&self) -> Vec<String> {
    let mut errors = Vec::new();
    let name = trimmed(&self.name);
    if name.is_empty() {
      errors.push("Category name is required.".to_string());
    } else if text_utils::char_count(name) > MAX_CATEGORY_NAME_LENGTH {
      errors.push("Category name cannot exceed 255 characters.".to_string());
    } else if text_utils::slugify(name).is_empty() {
      errors.push("Category name must contain letters or numbers.".to_string());
    }
    if let Some(color) = &self.color {
      if !text_utils::is_hex_color(color.trim()) {
        errors.push("Category color must be a hex color like #3b82f6.".to_string());
      }
    }
    errors
  }
}

impl From<CategoryForm> for CategoryInput {
  fn from(form: CategoryForm) -> Self {
    Self {
      name: trimmed(&form.name).to_string(),
      description: serde_utils::empty_string_to_none(form.description),
      color: form.color.map(|c| c.trim().to_lowercase()),
      is_active: form.is_active
    }
  }
}

/* --- Status responses --- */

#[derive(Debug, Deserialize, Serialize)]
pub struct JsonStatus {
  pub status: String,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub errors: Option<Vec<String>>
}

#[derive(Debug, Display)]
pub enum JsonStatusType {
  #[display(fmt = "success")]
  Success,
  #[display(fmt = "error")]
  Error
}

impl JsonStatus {
  pub fn new(status: JsonStatusType, message: &str) -> Self {
    Self {
      status: status.to_string(),
      message: String::from(message),
      id: None,
      errors: None
    }
  }

  pub fn new_with_id(
    status: JsonStatusType, 
    message: &str, 
    id: i64
  ) -> Self {
    Self {
      id: Some(id),
      ..Self::new(status, message)
    }
  }

  pub fn with_errors(message: &str, errors: Vec<String>) -> Self {
    Self {
      errors: Some(errors),
      ..Self::new(JsonStatusType::Error, message)
    }
  }
}
