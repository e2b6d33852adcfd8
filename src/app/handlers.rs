use actix_web::{web, HttpResponse, Result};
use log::info;
use crate::db::{self, Pool};
use crate::db::entities::CategoryDeletion;
use crate::editorial;
use crate::listing::{self, ListingFilters};
use crate::utils::time_utils;
use super::dtos::*;
use super::error::{Error, map_db_error};
use super::AppState;

// Module with all the API handler functions. Public 
// endpoints first, then the admin ones. Admin routes
// expect authentication to happen upstream.

const CATEGORY_HAS_ARTICLES: &str = "Cannot delete category that has articles.";

// Checks that need the database on top of ArticleForm::validate.
fn validate_article_form(
  pool: &Pool, 
  form: &ArticleForm, 
  creating: bool
) -> Result<(), Error> {
  let mut errors = form.validate(creating);
  if let Some(category_id) = form.category_id {
    if !db::category_exists(pool, category_id).map_err(map_db_error)? {
      errors.push("Selected category does not exist.".to_string());
    }
  }
  if creating {
    if let Some(author_id) = form.author_id {
      if !db::user_exists(pool, author_id).map_err(map_db_error)? {
        errors.push("Selected author does not exist.".to_string());
      }
    }
  }
  if errors.is_empty() {
    Ok(())
  } else {
    Err(Error::BadRequest(errors))
  }
}

fn validate_category_form(form: &CategoryForm) -> Result<(), Error> {
  let errors = form.validate();
  if errors.is_empty() { Ok(()) } else { Err(Error::BadRequest(errors)) }
}

pub async fn health_check() -> HttpResponse {
  HttpResponse::Ok().json(HealthDto {
    status: "ok".to_string(),
    timestamp: time_utils::timestamp_to_rfc3339(time_utils::current_timestamp())
  })
}

// Default response when no route matched the request:
pub async fn not_found() -> Result<HttpResponse, Error> {
  Err(Error::NotFound(String::from("Endpoint doesn't exist")))
}

pub async fn home(
  app_state: web::Data<AppState>
) -> Result<HttpResponse, Error> {
  let feed = listing::home(&app_state.pool).map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(HomeDto::from(feed)))
}

pub async fn articles(
  app_state: web::Data<AppState>,
  query: web::Query<ListingQuery>
) -> Result<HttpResponse, Error> {
  let filters = ListingFilters::from(query.into_inner());
  let articles = listing::public_articles(&app_state.pool, &filters)
    .map_err(map_db_error)?;
  let categories = listing::filter_categories(&app_state.pool)
    .map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(ArticleListingDto::new(articles, categories, filters)))
}

// Path variables have to be in a tuple.
pub async fn article(
  app_state: web::Data<AppState>,
  path: web::Path<(String,)>
) -> Result<HttpResponse, Error> {
  let slug = path.into_inner().0;
  match listing::show_article(&app_state.pool, &slug).map_err(map_db_error)? {
    Some(detail) => Ok(HttpResponse::Ok().json(ArticleDetailDto::from(detail))),
    None => Err(Error::NotFound("Article does not exist".to_string()))
  }
}

pub async fn categories(
  app_state: web::Data<AppState>
) -> Result<HttpResponse, Error> {
  let categories = listing::public_categories(&app_state.pool)
    .map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(
    categories.into_iter().map(CategoryDto::from).collect::<Vec<_>>()
  ))
}

pub async fn category(
  app_state: web::Data<AppState>,
  path: web::Path<(String,)>,
  query: web::Query<ListingQuery>
) -> Result<HttpResponse, Error> {
  let slug = path.into_inner().0;
  let category = db::category_by_slug(&app_state.pool, &slug)
    .map_err(map_db_error)?
    .ok_or_else(|| Error::NotFound("Category does not exist".to_string()))?;
  // The category comes from the path, only search and page
  // are read from the query string.
  let filters = ListingFilters::from(query.into_inner());
  let articles = listing::category_articles(
    &app_state.pool, 
    &category, 
    filters.search.as_deref(), 
    filters.page
  ).map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(CategoryListingDto {
    category: category.into(),
    articles: articles.map(article_card),
    filters: SearchFilterDto { search: filters.search }
  }))
}

/* --- Admin --- */

pub async fn admin_articles(
  app_state: web::Data<AppState>,
  query: web::Query<PageQuery>
) -> Result<HttpResponse, Error> {
  let page = listing::admin_articles(&app_state.pool, query.page())
    .map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(page.map(article_card)))
}

pub async fn admin_article(
  app_state: web::Data<AppState>,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  match db::article_by_id(&app_state.pool, id).map_err(map_db_error)? {
    Some(article) => Ok(HttpResponse::Ok().json(ArticleDto::from(article))),
    None => Err(Error::NotFound("Article does not exist".to_string()))
  }
}

pub async fn create_article(
  app_state: web::Data<AppState>,
  form: web::Json<ArticleForm>
) -> Result<HttpResponse, Error> {
  let form = form.into_inner();
  validate_article_form(&app_state.pool, &form, true)?;
  let article = editorial::create_article(&app_state.pool, form.into_new_article())?;
  Ok(HttpResponse::Created().json(ArticleDto::from(article)))
}

pub async fn update_article(
  app_state: web::Data<AppState>,
  path: web::Path<(i64,)>,
  form: web::Json<ArticleForm>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  let form = form.into_inner();
  validate_article_form(&app_state.pool, &form, false)?;
  let article = editorial::update_article(&app_state.pool, id, form.into_changes())?;
  Ok(HttpResponse::Ok().json(ArticleDto::from(article)))
}

pub async fn delete_article(
  app_state: web::Data<AppState>,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  editorial::delete_article(&app_state.pool, id)?;
  Ok(HttpResponse::Ok().json(
    JsonStatus::new_with_id(JsonStatusType::Success, "Article deleted successfully.", id)
  ))
}

pub async fn category_options(
  app_state: web::Data<AppState>
) -> Result<HttpResponse, Error> {
  let categories = listing::category_options(&app_state.pool)
    .map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(
    categories.into_iter().map(CategoryDto::from).collect::<Vec<_>>()
  ))
}

pub async fn author_options(
  app_state: web::Data<AppState>
) -> Result<HttpResponse, Error> {
  let authors: Vec<AuthorDto> = listing::author_options(&app_state.pool)
    .map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(authors))
}

pub async fn admin_categories(
  app_state: web::Data<AppState>,
  query: web::Query<PageQuery>
) -> Result<HttpResponse, Error> {
  let page = listing::admin_categories(&app_state.pool, query.page())
    .map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(page.map(CategoryDto::from)))
}

pub async fn admin_category(
  app_state: web::Data<AppState>,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  match db::category_with_article_count(&app_state.pool, id).map_err(map_db_error)? {
    Some(category) => Ok(HttpResponse::Ok().json(CategoryDto::from(category))),
    None => Err(Error::NotFound("Category does not exist".to_string()))
  }
}

pub async fn create_category(
  app_state: web::Data<AppState>,
  form: web::Json<CategoryForm>
) -> Result<HttpResponse, Error> {
  let form = form.into_inner();
  validate_category_form(&form)?;
  let category = editorial::create_category(&app_state.pool, form.into())?;
  Ok(HttpResponse::Created().json(CategoryDto::from(category)))
}

pub async fn update_category(
  app_state: web::Data<AppState>,
  path: web::Path<(i64,)>,
  form: web::Json<CategoryForm>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  let form = form.into_inner();
  validate_category_form(&form)?;
  let category = editorial::update_category(&app_state.pool, id, form.into())?;
  Ok(HttpResponse::Ok().json(CategoryDto::from(category)))
}

// A category that still has articles is not an error on 
// our side, but the client gets a 409 with a message it
// can show as is.
pub async fn delete_category(
  app_state: web::Data<AppState>,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  match editorial::delete_category(&app_state.pool, id)? {
    CategoryDeletion::Deleted => Ok(HttpResponse::Ok().json(
      JsonStatus::new_with_id(JsonStatusType::Success, "Category deleted successfully.", id)
    )),
    CategoryDeletion::HasArticles(count) => {
      info!("Category {} still has {} article(s)", id, count);
      Ok(HttpResponse::Conflict().json(
        JsonStatus::new_with_id(JsonStatusType::Error, CATEGORY_HAS_ARTICLES, id)
      ))
    }
  }
}
