use actix_web::{
  error::ResponseError,
  http::StatusCode,
  HttpResponse
};
use derive_more::Display;
use eyre::Report;
use log::error;
use crate::editorial::EditorialError;
use super::dtos::{JsonStatus, JsonStatusType};

// The full error output of database failures only goes 
// to the logs, clients get a generic message.
#[derive(Debug, Display)]
pub enum Error {
  #[display(fmt = "Database Error")]
  DatabaseError,
  #[display(fmt = "Not Found: {}", _0)]
  NotFound(String),
  #[display(fmt = "Bad Request (check request params)")]
  BadRequest(Vec<String>),
  #[display(fmt = "{}", _0)]
  Conflict(String)
}

impl ResponseError for Error {
  fn status_code(&self) -> StatusCode {
    match self {
      Error::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::Conflict(_) => StatusCode::CONFLICT
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = match self {
      Error::BadRequest(messages) => JsonStatus::with_errors(
        "Validation failed", 
        messages.clone()
      ),
      _ => JsonStatus::new(JsonStatusType::Error, &self.to_string())
    };
    HttpResponse::build(self.status_code()).json(status)
  }
}

// Store functions all return eyre reports.
pub fn map_db_error(e: Report) -> Error {
  error!("Database error: {:?}", e);
  Error::DatabaseError
}

impl From<EditorialError> for Error {
  fn from(e: EditorialError) -> Self {
    match e {
      EditorialError::SlugConflict(slug) => Error::Conflict(
        format!("Another record already uses the slug \"{}\"", slug)
      ),
      EditorialError::NotFound(what) => Error::NotFound(what),
      EditorialError::Database(report) => map_db_error(report)
    }
  }
}
