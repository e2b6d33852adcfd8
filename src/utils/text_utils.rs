use regex::Regex;
use lazy_static::lazy_static;

lazy_static! {
  static ref HEX_COLOR: Regex = Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap();
}

/**
 * Derive the URL token used for articles (from the title)
 * and categories (from the name).
 * "Alpha Release: v2!" gives "alpha-release-v2".
 * Non-ASCII letters are transliterated first, so 
 * "Économie & Marchés" gives "economie-marches". Anything
 * left that isn't a letter or a digit becomes a separator,
 * runs of them collapse into one.
 */
pub fn slugify(source: &str) -> String {
  slug::slugify(source)
}

// The search folds case in SQL with lower_unicode(), the
// pattern has to be folded the same way.
pub fn fold_case(value: &str) -> String {
  value.to_lowercase()
}

// Search terms go into LIKE patterns as bound parameters, 
// but % and _ would still act as wildcards. The queries 
// use ESCAPE '\' so we prefix those (and the backslash).
pub fn escape_like(term: &str) -> String {
  let mut escaped = String::with_capacity(term.len() + 2);
  for c in term.chars() {
    if c == '%' || c == '_' || c == '\\' {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped
}

pub fn contains_pattern(term: &str) -> String {
  format!("%{}%", escape_like(&fold_case(term)))
}

pub fn is_hex_color(value: &str) -> bool {
  HEX_COLOR.is_match(value)
}

// Length limits in the forms are in characters, not bytes.
pub fn char_count(value: &str) -> usize {
  value.chars().count()
}
