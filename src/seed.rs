// The seeder only uses part of the modules.
#![allow(dead_code)]
mod config;
mod db;
mod editorial;
mod publishing;
mod utils;

use std::env;
use color_eyre::Result;
use eyre::{eyre, WrapErr};
use dotenv::dotenv;
use log::{info, warn};
use getopts::Options;
use crate::config::Config;
use crate::db::Pool;
use crate::db::entities::{Category, MetaTags, User};
use crate::editorial::{CategoryInput, NewArticle};
use crate::publishing::ArticleStatus;
use crate::utils::time_utils::current_timestamp;

const DEFAULT_PER_CATEGORY: usize = 6;
const DEFAULT_DRAFTS: usize = 10;
const DAY: i64 = 86400;

// name, description, color
const CATEGORIES: [(&str, &str, &str); 6] = [
  ("Technology", "Latest news and updates from the tech world", "#3b82f6"),
  ("Business", "Business news, market updates, and economic trends", "#10b981"),
  ("Sports", "Sports news, scores, and athlete updates", "#f59e0b"),
  ("Entertainment", "Movies, music, celebrities, and entertainment news", "#ef4444"),
  ("Health", "Health tips, medical breakthroughs, and wellness news", "#8b5cf6"),
  ("Politics", "Political news, government updates, and policy changes", "#6366f1")
];

const AUTHORS: [(&str, &str); 3] = [
  ("Morgan Reyes", "morgan@newsdesk.example"),
  ("Sam Okafor", "sam@newsdesk.example"),
  ("Alex Lindqvist", "alex@newsdesk.example")
];

const HEADLINES: [&str; 8] = [
  "The week in {}",
  "What to watch in {}",
  "{} roundup",
  "Inside the latest {} story",
  "{} explained",
  "Five questions about {}",
  "{}: the numbers behind the headlines",
  "Where {} goes next"
];

fn print_usage(program: &str, opts: Options) {
  let brief = format!("Usage: {} [options]", program);
  print!("{}", opts.usage(&brief));
}

// Headline n for a category, numbered once the templates
// run out so titles (and slugs) stay unique.
fn headline(category: &str, n: usize) -> String {
  let title = HEADLINES[n % HEADLINES.len()].replace("{}", category);
  match n / HEADLINES.len() {
    0 => title,
    round => format!("{} ({})", title, round + 1)
  }
}

fn sample_article(
  title: String,
  category: &Category,
  author: &User,
  status: ArticleStatus,
  published_at: Option<i64>
) -> NewArticle {
  NewArticle {
    summary: format!("A short look at {} for readers in a hurry.", title.to_lowercase()),
    content: format!(
      "{}\n\nThis sample article was generated by the seeder. \
      It belongs to the {} section and exists to fill listings, \
      search results and pagination with realistic data.",
      title, category.name
    ),
    title,
    featured_image: None,
    status,
    category_id: category.id,
    author_id: author.id,
    meta_tags: Some(MetaTags {
      keywords: vec![category.slug.clone(), "news".to_string()],
      description: Some(format!("{} news from the newsdesk.", category.name))
    }),
    published_at
  }
}

fn seed(pool: &Pool, per_category: usize, drafts: usize) -> Result<()> {
  let now = current_timestamp();
  let mut authors = Vec::with_capacity(AUTHORS.len());
  for (name, email) in AUTHORS.iter() {
    authors.push(db::insert_user(pool, name, email, now)?);
  }

  let mut categories = Vec::with_capacity(CATEGORIES.len());
  for (name, description, color) in CATEGORIES.iter() {
    let category = editorial::create_category(pool, CategoryInput {
      name: name.to_string(),
      description: Some(description.to_string()),
      color: Some(color.to_string()),
      is_active: Some(true)
    }).map_err(|e| eyre!("Seeding category {}: {}", name, e))?;
    categories.push(category);
  }

  let mut created = 0;
  for (c, category) in categories.iter().enumerate() {
    for n in 0..per_category {
      let author = &authors[(c + n) % authors.len()];
      // Spread publication dates over the past weeks.
      let published_at = now - ((c * per_category + n) as i64 + 1) * DAY / 2;
      editorial::create_article(
        pool,
        sample_article(
          headline(&category.name, n), 
          category, 
          author, 
          ArticleStatus::Published, 
          Some(published_at)
        )
      ).map_err(|e| eyre!("Seeding article: {}", e))?;
      created += 1;
    }
  }

  for n in 0..drafts {
    let category = &categories[n % categories.len()];
    let author = &authors[n % authors.len()];
    editorial::create_article(
      pool,
      sample_article(
        format!("Draft {}: {}", n + 1, headline(&category.name, n)),
        category,
        author,
        ArticleStatus::Draft,
        None
      )
    ).map_err(|e| eyre!("Seeding draft: {}", e))?;
    created += 1;
  }

  info!(
    "Seeded {} authors, {} categories and {} articles", 
    authors.len(), 
    categories.len(), 
    created
  );
  Ok(())
}

/**
 * Fills an empty database with sample authors, categories
 * and articles.
 */
fn main() -> Result<()> {
  dotenv().ok();
  if env::var("RUST_LOG").is_err() {
    env::set_var("RUST_LOG", "info");
  }
  env_logger::init();
  color_eyre::install()?;

  let args: Vec<String> = env::args().collect();
  let program = args[0].clone();

  let mut opts = Options::new();
  opts.optopt("c", "per-category", "published articles per category (default 6)", "COUNT");
  opts.optopt("d", "drafts", "draft articles to add (default 10)", "COUNT");
  opts.optflag("h", "help", "print this help menu");
  let matches = opts.parse(&args[1..])
    .context("Parsing command line arguments")?;
  if matches.opt_present("h") {
    print_usage(&program, opts);
    return Ok(());
  }
  let per_category = match matches.opt_str("c") {
    Some(count) => count.parse::<usize>().context("--per-category has to be a number")?,
    None => DEFAULT_PER_CATEGORY
  };
  let drafts = match matches.opt_str("d") {
    Some(count) => count.parse::<usize>().context("--drafts has to be a number")?,
    None => DEFAULT_DRAFTS
  };

  let config = Config::from_env()?;
  let pool = db::open_pool(&config.db_path, config.db_pool_size)?;
  db::init_schema(&pool)?;

  if db::category_count(&pool)? > 0 {
    warn!("Database at {} already has categories, not seeding", config.db_path);
    return Ok(());
  }
  seed(&pool, per_category, drafts)
}
