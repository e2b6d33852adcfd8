// Adding the context method to errors:
use eyre::WrapErr;
use color_eyre::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
  pub db_path: String,
  pub bind_address: String,
  // Max amount of pooled SQLite connections:
  pub db_pool_size: u32
}

impl Config {

  pub fn from_env() -> Result<Config> {
    // Environment variables are matched in lowercase,
    // DB_PATH in the .env file becomes db_path.
    config::Config::builder()
      .set_default("db_path", "./newsdesk.sqlite")?
      .set_default("bind_address", "127.0.0.1:8080")?
      .set_default("db_pool_size", 8)?
      .add_source(config::Environment::default().try_parsing(true))
      .build()
      .and_then(|c| c.try_deserialize())
      // The error has to be given a context for
      // color_eyre to work here:
      .context("Loading configuration from env")
  }

}
