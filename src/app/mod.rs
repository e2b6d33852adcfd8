use actix_web::{error::InternalError, middleware, web, App, HttpResponse, HttpServer};
use color_eyre::Result;
use eyre::WrapErr;
use log::{debug, info};
// I think we have to add crate here because
// of the other crate named "config" that we
// use as a dependency.
use crate::config::Config;
use crate::db::{self, Pool};
mod handlers;
mod dtos;
mod error;

// Declare app state struct. Requests don't share anything
// else than the connection pool.
pub struct AppState {
  pub pool: Pool
}

// Function to start the server, called from the
// #[actix_web::main] in main.rs.
pub async fn run() -> Result<()> {
  let config = Config::from_env()?;
  debug!("Current config: {:?}", config);
  let pool = db::open_pool(&config.db_path, config.db_pool_size)?;
  db::init_schema(&pool)?;

  let app_state = web::Data::new(AppState { pool });
  info!("Listening on {}", config.bind_address);

  HttpServer::new(move || {
    App::new()
      .app_data(app_state.clone())
      .wrap(middleware::Logger::default())
      .configure(endpoints_config)
      .default_service(web::route().to(handlers::not_found))
  })
  .bind(&config.bind_address)?
  .run()
  .await
  .context("Start Actix web server")
}

fn bad_request(message: String) -> HttpResponse {
  HttpResponse::BadRequest().json(
    dtos::JsonStatus::new(dtos::JsonStatusType::Error, &message)
  )
}

// Extractor settings and route configuration:
fn endpoints_config(cfg: &mut web::ServiceConfig) {
  cfg.app_data(web::PathConfig::default().error_handler(|err, _| {
      let message = format!("Invalid path arguments: {}", err);
      InternalError::from_response(err, bad_request(message)).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _| {
      let message = format!("Invalid query string arguments: {}", err);
      InternalError::from_response(err, bad_request(message)).into()
    }))
    .app_data(web::JsonConfig::default().error_handler(|err, _| {
      let message = format!("Invalid JSON body: {}", err);
      InternalError::from_response(err, bad_request(message)).into()
    }));

  cfg.route("/health-check", web::get().to(handlers::health_check))
    .route("/", web::get().to(handlers::home))
    .route("/articles", web::get().to(handlers::articles))
    .route("/articles/{slug}", web::get().to(handlers::article))
    .route("/categories", web::get().to(handlers::categories))
    .route("/categories/{slug}", web::get().to(handlers::category))
    .service(
      web::scope("/admin")
        .route("/articles", web::get().to(handlers::admin_articles))
        .route("/articles", web::post().to(handlers::create_article))
        .route("/articles/{id}", web::get().to(handlers::admin_article))
        .route("/articles/{id}", web::put().to(handlers::update_article))
        .route("/articles/{id}", web::delete().to(handlers::delete_article))
        .route("/category-options", web::get().to(handlers::category_options))
        .route("/author-options", web::get().to(handlers::author_options))
        .route("/categories", web::get().to(handlers::admin_categories))
        .route("/categories", web::post().to(handlers::create_category))
        .route("/categories/{id}", web::get().to(handlers::admin_category))
        .route("/categories/{id}", web::put().to(handlers::update_category))
        .route("/categories/{id}", web::delete().to(handlers::delete_category))
    );
}
