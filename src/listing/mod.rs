/*
 * The read side: every listing the public and the admin 
 * screens show. Filters are turned into ArticleCriteria,
 * composed into a predicate and run through the store.
 */

use color_eyre::Result;
use log::debug;
use crate::db::{self, Pool, CategoryOrder};
use crate::db::entities::*;
use crate::db::queries::{self, ArticleCriteria, ArticleSort};
pub mod pagination;
use pagination::{Page, PageRequest};

pub const PUBLIC_PAGE_SIZE: u32 = 12;
pub const ADMIN_PAGE_SIZE: u32 = 15;
pub const RELATED_LIMIT: i64 = 4;
// Home page:
pub const FEATURED_LIMIT: i64 = 6;
pub const HOME_CATEGORY_LIMIT: i64 = 8;
pub const HOME_SECTION_COUNT: usize = 3;
pub const SECTION_ARTICLES_LIMIT: i64 = 4;

/// What the public article listing can be filtered with,
/// all of it straight from the query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilters {
  pub search: Option<String>,
  pub category: Option<String>,
  pub page: Option<u32>
}

#[derive(Debug)]
pub struct ArticleDetail {
  pub article: Article,
  pub related: Vec<Article>
}

#[derive(Debug)]
pub struct CategorySection {
  pub category: CategoryWithCount,
  pub latest: Vec<Article>
}

#[derive(Debug)]
pub struct HomeFeed {
  pub featured: Vec<Article>,
  pub categories: Vec<CategoryWithCount>,
  pub sections: Vec<CategorySection>
}

fn paginate(
  pool: &Pool,
  criteria: &ArticleCriteria,
  sort: ArticleSort,
  page: Option<u32>,
  per_page: u32
) -> Result<Page<Article>> {
  let request = PageRequest::new(page, per_page);
  let predicate = queries::compose(criteria);
  let total = db::article_count(pool, &predicate)?;
  // Past the last page: no need to ask for rows.
  let items = if request.offset() >= total {
    Vec::new()
  } else {
    db::articles(pool, &predicate, sort, request.limit(), request.offset())?
  };
  Ok(Page::new(items, request, total as u64))
}

// An unknown category slug drops the filter instead of
// emptying the listing.
fn resolve_category_filter(pool: &Pool, slug: Option<&str>) -> Result<Option<i64>> {
  match slug.map(str::trim).filter(|s| !s.is_empty()) {
    Some(slug) => {
      let id = db::category_id_by_slug(pool, slug)?;
      if id.is_none() {
        debug!("Ignoring unknown category filter \"{}\"", slug);
      }
      Ok(id)
    },
    None => Ok(None)
  }
}

pub fn public_articles(pool: &Pool, filters: &ListingFilters) -> Result<Page<Article>> {
  let category_id = resolve_category_filter(pool, filters.category.as_deref())?;
  let criteria = ArticleCriteria::public()
    .in_category(category_id)
    .matching(filters.search.as_deref());
  paginate(pool, &criteria, ArticleSort::PublishedDesc, filters.page, PUBLIC_PAGE_SIZE)
}

pub fn category_articles(
  pool: &Pool,
  category: &Category,
  search: Option<&str>,
  page: Option<u32>
) -> Result<Page<Article>> {
  let criteria = ArticleCriteria::public()
    .in_category(Some(category.id))
    .matching(search);
  paginate(pool, &criteria, ArticleSort::PublishedDesc, page, PUBLIC_PAGE_SIZE)
}

pub fn admin_articles(pool: &Pool, page: Option<u32>) -> Result<Page<Article>> {
  paginate(
    pool, 
    &ArticleCriteria::any_status(), 
    ArticleSort::CreatedDesc, 
    page, 
    ADMIN_PAGE_SIZE
  )
}

pub fn related_articles(pool: &Pool, article: &Article) -> Result<Vec<Article>> {
  let criteria = ArticleCriteria::public()
    .in_category(Some(article.category.id))
    .excluding(article.id);
  db::articles(
    pool, 
    &queries::compose(&criteria), 
    ArticleSort::PublishedDesc, 
    RELATED_LIMIT, 
    0
  )
}

/// Public detail page. Counts a view as a side effect.
pub fn show_article(pool: &Pool, slug: &str) -> Result<Option<ArticleDetail>> {
  match db::view_article(pool, slug)? {
    Some(article) => {
      let related = related_articles(pool, &article)?;
      Ok(Some(ArticleDetail { article, related }))
    },
    None => Ok(None)
  }
}

pub fn public_categories(pool: &Pool) -> Result<Vec<CategoryWithCount>> {
  db::active_categories_with_visible_counts(pool, CategoryOrder::ArticleCountDesc, None)
}

// Categories for the filter bar of the article listing.
pub fn filter_categories(pool: &Pool) -> Result<Vec<CategoryWithCount>> {
  db::active_categories_with_visible_counts(pool, CategoryOrder::Name, None)
}

// Choices for the article create/edit forms.
pub fn category_options(pool: &Pool) -> Result<Vec<Category>> {
  db::active_categories(pool)
}

// Authors for the same forms, by id.
pub fn author_options(pool: &Pool) -> Result<Vec<Author>> {
  Ok(
    db::all_users(pool)?
      .into_iter()
      .map(|u| Author { id: u.id, name: u.name })
      .collect()
  )
}

pub fn admin_categories(pool: &Pool, page: Option<u32>) -> Result<Page<CategoryWithCount>> {
  let request = PageRequest::new(page, ADMIN_PAGE_SIZE);
  let total = db::category_count(pool)?;
  let items = if request.offset() >= total {
    Vec::new()
  } else {
    db::categories_with_article_counts(pool, request.limit(), request.offset())?
  };
  Ok(Page::new(items, request, total as u64))
}

pub fn home(pool: &Pool) -> Result<HomeFeed> {
  let featured = db::articles(
    pool,
    &queries::compose(&ArticleCriteria::public()),
    ArticleSort::PublishedDesc,
    FEATURED_LIMIT,
    0
  )?;
  let categories = db::active_categories_with_visible_counts(
    pool, 
    CategoryOrder::ArticleCountDesc, 
    Some(HOME_CATEGORY_LIMIT)
  )?;
  // The sections are the top categories of the same ranking.
  let mut sections = Vec::with_capacity(HOME_SECTION_COUNT);
  for category in categories.iter().take(HOME_SECTION_COUNT) {
    let criteria = ArticleCriteria::public().in_category(Some(category.category.id));
    let latest = db::articles(
      pool,
      &queries::compose(&criteria),
      ArticleSort::PublishedDesc,
      SECTION_ARTICLES_LIMIT,
      0
    )?;
    sections.push(CategorySection {
      category: category.clone(),
      latest
    });
  }
  Ok(HomeFeed { featured, categories, sections })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::test_fixtures::TestDb;
  use crate::publishing::{ArticleStatus, is_publicly_visible};

  fn filters(search: Option<&str>, category: Option<&str>, page: Option<u32>) -> ListingFilters {
    ListingFilters {
      search: search.map(String::from),
      category: category.map(String::from),
      page
    }
  }

  fn titles(articles: &[Article]) -> Vec<&str> {
    articles.iter().map(|a| a.title.as_str()).collect()
  }

  #[test]
  fn pagination_of_25_visible_articles() {
    let db = TestDb::new();
    let author = db.author();
    let tech = db.category("Tech");
    for i in 0..25 {
      db.article(&format!("Story {}", i), &tech, &author, ArticleStatus::Published, Some(1000 + i));
    }

    let third = public_articles(&db.pool, &filters(None, None, Some(3))).unwrap();
    assert_eq!(1, third.items.len());
    assert_eq!("Story 0", third.items[0].title);
    assert_eq!(3, third.last_page);
    assert_eq!(25, third.total);

    let first = public_articles(&db.pool, &filters(None, None, None)).unwrap();
    assert_eq!(12, first.items.len());
    assert_eq!("Story 24", first.items[0].title);

    let beyond = public_articles(&db.pool, &filters(None, None, Some(4))).unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(3, beyond.last_page);
  }

  #[test]
  fn public_listing_never_leaks_invisible_articles() {
    let db = TestDb::new();
    let author = db.author();
    let tech = db.category("Tech");
    let sports = db.category("Sports");
    for category in [&tech, &sports].iter() {
      let prefix = &category.name;
      db.article(&format!("{} alpha published", prefix), category, &author, ArticleStatus::Published, Some(50));
      db.article(&format!("{} alpha draft", prefix), category, &author, ArticleStatus::Draft, None);
      db.article(&format!("{} alpha archived", prefix), category, &author, ArticleStatus::Archived, None);
      // Published without a date, only possible through raw rows.
      db.article(&format!("{} alpha undated", prefix), category, &author, ArticleStatus::Published, None);
    }

    let searches = [None, Some("alpha"), Some("draft"), Some("")];
    let categories = [None, Some("tech"), Some("sports"), Some("unknown")];
    for search in searches.iter() {
      for category in categories.iter() {
        let page = public_articles(&db.pool, &filters(*search, *category, None)).unwrap();
        for article in page.items.iter() {
          assert!(is_publicly_visible(article.status, article.published_at));
        }
        assert!(page.items.len() <= 2);
      }
    }
  }

  #[test]
  fn search_matches_title_summary_or_content_case_insensitively() {
    let db = TestDb::new();
    let author = db.author();
    let tech = db.category("Tech");
    db.article("Alpha Release", &tech, &author, ArticleStatus::Published, Some(30));
    let mut in_content = TestDb::article_row("Version notes", &tech, &author, ArticleStatus::Published, Some(20));
    in_content.content = "We shipped the alpha version today".to_string();
    db.insert_row(&in_content, 20);
    let mut in_summary = TestDb::article_row("Roadmap", &tech, &author, ArticleStatus::Published, Some(10));
    in_summary.summary = "Next steps after ALPHA".to_string();
    db.insert_row(&in_summary, 10);
    db.article("Beta Plans", &tech, &author, ArticleStatus::Published, Some(40));

    let page = public_articles(&db.pool, &filters(Some("alpha"), None, None)).unwrap();
    assert_eq!(vec!["Alpha Release", "Version notes", "Roadmap"], titles(&page.items));
  }

  #[test]
  fn search_folds_case_beyond_ascii() {
    let db = TestDb::new();
    let author = db.author();
    let business = db.category("Business");
    db.article("Été économique", &business, &author, ArticleStatus::Published, Some(30));
    db.article("Winter outlook", &business, &author, ArticleStatus::Published, Some(20));

    let page = public_articles(&db.pool, &filters(Some("ÉCONOMIQUE"), None, None)).unwrap();
    assert_eq!(vec!["Été économique"], titles(&page.items));
    assert_eq!(1, page.total);
    let page = public_articles(&db.pool, &filters(Some("été"), None, None)).unwrap();
    assert_eq!(vec!["Été économique"], titles(&page.items));
  }

  #[test]
  fn search_wildcards_are_literal() {
    let db = TestDb::new();
    let author = db.author();
    let tech = db.category("Tech");
    db.article("Discount 100% off", &tech, &author, ArticleStatus::Published, Some(30));
    db.article("Discount 1000 off", &tech, &author, ArticleStatus::Published, Some(20));
    let page = public_articles(&db.pool, &filters(Some("100%"), None, None)).unwrap();
    assert_eq!(vec!["Discount 100% off"], titles(&page.items));
  }

  #[test]
  fn category_filter_applies_and_unknown_slug_is_dropped() {
    let db = TestDb::new();
    let author = db.author();
    let tech = db.category("Tech");
    let sports = db.category("Sports");
    db.article("Chips", &tech, &author, ArticleStatus::Published, Some(30));
    db.article("Goals", &sports, &author, ArticleStatus::Published, Some(20));

    let tech_only = public_articles(&db.pool, &filters(None, Some("tech"), None)).unwrap();
    assert_eq!(vec!["Chips"], titles(&tech_only.items));

    let unknown = public_articles(&db.pool, &filters(None, Some("cooking"), None)).unwrap();
    assert_eq!(vec!["Chips", "Goals"], titles(&unknown.items));
  }

  #[test]
  fn category_listing_is_restricted_and_searchable() {
    let db = TestDb::new();
    let author = db.author();
    let tech = db.category("Tech");
    let sports = db.category("Sports");
    db.article("Alpha chips", &tech, &author, ArticleStatus::Published, Some(30));
    db.article("Beta chips", &tech, &author, ArticleStatus::Published, Some(40));
    db.article("Alpha goals", &sports, &author, ArticleStatus::Published, Some(20));
    db.article("Alpha draft", &tech, &author, ArticleStatus::Draft, None);

    let all = category_articles(&db.pool, &tech, None, None).unwrap();
    assert_eq!(vec!["Beta chips", "Alpha chips"], titles(&all.items));
    let searched = category_articles(&db.pool, &tech, Some("ALPHA"), None).unwrap();
    assert_eq!(vec!["Alpha chips"], titles(&searched.items));
  }

  #[test]
  fn admin_listing_shows_everything_by_creation_date() {
    let db = TestDb::new();
    let author = db.author();
    let tech = db.category("Tech");
    let statuses = [ArticleStatus::Draft, ArticleStatus::Published, ArticleStatus::Archived];
    for i in 0..16 {
      let status = statuses[i % 3];
      let published_at = if status == ArticleStatus::Published { Some(5) } else { None };
      let row = TestDb::article_row(&format!("Item {}", i), &tech, &author, status, published_at);
      db.insert_row(&row, 100 + i as i64);
    }
    let first = admin_articles(&db.pool, None).unwrap();
    assert_eq!(15, first.items.len());
    assert_eq!(2, first.last_page);
    assert_eq!("Item 15", first.items[0].title);
    let second = admin_articles(&db.pool, Some(2)).unwrap();
    assert_eq!(vec!["Item 0"], titles(&second.items));
  }

  #[test]
  fn related_articles_share_category_and_exclude_current() {
    let db = TestDb::new();
    let author = db.author();
    let tech = db.category("Tech");
    let sports = db.category("Sports");
    let current = db.article("Current", &tech, &author, ArticleStatus::Published, Some(100));
    for i in 0..5 {
      db.article(&format!("Tech {}", i), &tech, &author, ArticleStatus::Published, Some(10 + i));
    }
    db.article("Tech draft", &tech, &author, ArticleStatus::Draft, None);
    db.article("Sports one", &sports, &author, ArticleStatus::Published, Some(500));

    let related = related_articles(&db.pool, &current).unwrap();
    assert_eq!(vec!["Tech 4", "Tech 3", "Tech 2", "Tech 1"], titles(&related));
  }

  #[test]
  fn show_article_counts_views_and_hides_drafts() {
    let db = TestDb::new();
    let author = db.author();
    let tech = db.category("Tech");
    db.article("Live", &tech, &author, ArticleStatus::Published, Some(100));
    db.article("Sibling", &tech, &author, ArticleStatus::Published, Some(90));
    db.article("Secret", &tech, &author, ArticleStatus::Draft, None);

    let first = show_article(&db.pool, "live").unwrap().unwrap();
    assert_eq!(1, first.article.views_count);
    assert_eq!(vec!["Sibling"], titles(&first.related));
    let second = show_article(&db.pool, "live").unwrap().unwrap();
    assert_eq!(2, second.article.views_count);

    assert!(show_article(&db.pool, "secret").unwrap().is_none());
  }

  #[test]
  fn category_listings_with_counts() {
    let db = TestDb::new();
    let author = db.author();
    let tech = db.category("Tech");
    let arts = db.category("Arts");
    db.inactive_category("Retired");
    db.article("A1", &arts, &author, ArticleStatus::Published, Some(10));
    db.article("T1", &tech, &author, ArticleStatus::Published, Some(10));
    db.article("T2", &tech, &author, ArticleStatus::Published, Some(11));
    db.article("T3", &tech, &author, ArticleStatus::Draft, None);

    let public: Vec<(String, i64)> = public_categories(&db.pool).unwrap()
      .into_iter().map(|c| (c.category.name, c.articles_count)).collect();
    assert_eq!(vec![("Tech".to_string(), 2), ("Arts".to_string(), 1)], public);

    let by_name: Vec<String> = filter_categories(&db.pool).unwrap()
      .into_iter().map(|c| c.category.name).collect();
    assert_eq!(vec!["Arts", "Tech"], by_name);

    let options: Vec<String> = category_options(&db.pool).unwrap()
      .into_iter().map(|c| c.name).collect();
    assert_eq!(vec!["Arts", "Tech"], options);

    let admin = admin_categories(&db.pool, None).unwrap();
    assert_eq!(3, admin.total);
    let tech_admin = admin.items.iter().find(|c| c.category.id == tech.id).unwrap();
    assert_eq!(3, tech_admin.articles_count);
  }

  #[test]
  fn home_feed() {
    let db = TestDb::new();
    let author = db.author();
    let tech = db.category("Tech");
    let arts = db.category("Arts");
    for i in 0..7 {
      db.article(&format!("Tech {}", i), &tech, &author, ArticleStatus::Published, Some(100 + i));
    }
    db.article("Arts 0", &arts, &author, ArticleStatus::Published, Some(50));

    let feed = home(&db.pool).unwrap();
    assert_eq!(6, feed.featured.len());
    assert_eq!("Tech 6", feed.featured[0].title);
    assert_eq!(2, feed.categories.len());
    assert_eq!(2, feed.sections.len());
    assert_eq!(tech.id, feed.sections[0].category.category.id);
    assert_eq!(4, feed.sections[0].latest.len());
    assert_eq!(vec!["Arts 0"], titles(&feed.sections[1].latest));
  }
}
