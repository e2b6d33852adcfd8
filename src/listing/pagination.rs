use serde::Serialize;

// Amount of page links shown on each side of the current
// page once there are too many pages to list them all.
const ON_EACH_SIDE: u32 = 3;

pub const PREVIOUS_LABEL: &str = "« Previous";
pub const NEXT_LABEL: &str = "Next »";
pub const GAP_LABEL: &str = "...";

/// Page numbers come from the query string. Anything that
/// isn't a number >= 1 means the first page.
pub fn parse_page(raw: Option<&str>) -> Option<u32> {
  raw
    .and_then(|p| p.trim().parse::<u32>().ok())
    .filter(|p| *p >= 1)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRequest {
  pub page: u32,
  pub per_page: u32
}

impl PageRequest {
  pub fn new(page: Option<u32>, per_page: u32) -> Self {
    Self {
      page: page.filter(|p| *p >= 1).unwrap_or(1),
      per_page
    }
  }

  pub fn offset(&self) -> i64 {
    (i64::from(self.page) - 1) * i64::from(self.per_page)
  }

  pub fn limit(&self) -> i64 {
    i64::from(self.per_page)
  }
}

/// ceil(total / per_page), but never less than 1 so an 
/// empty listing still has a (empty) first page.
pub fn last_page(total: u64, per_page: u32) -> u32 {
  let per_page = u64::from(per_page.max(1));
  let pages = (total + per_page - 1) / per_page;
  pages.max(1) as u32
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLink {
  pub label: String,
  // None for disabled links and the "..." gaps.
  pub page: Option<u32>,
  pub active: bool
}

impl PageLink {
  fn number(page: u32, current: u32) -> Self {
    Self {
      label: page.to_string(),
      page: Some(page),
      active: page == current
    }
  }

  fn gap() -> Self {
    Self {
      label: GAP_LABEL.to_string(),
      page: None,
      active: false
    }
  }
}

fn numbers(range: std::ops::RangeInclusive<u32>, current: u32) -> Vec<PageLink> {
  range.map(|p| PageLink::number(p, current)).collect()
}

/**
 * Previous link, page numbers, next link. With 14 pages or
 * more the numbers get windowed around the current page:
 *   1 2 ... 7 8 9 [10] 11 12 13 ... 29 30
 * Close to either end, the window sticks to that end.
 */
pub fn page_links(current: u32, last: u32) -> Vec<PageLink> {
  let mut links = vec![PageLink {
    label: PREVIOUS_LABEL.to_string(),
    page: if current > 1 { Some(current - 1) } else { None },
    active: false
  }];

  if last < ON_EACH_SIDE * 2 + 8 {
    links.extend(numbers(1..=last, current));
  } else {
    let window = ON_EACH_SIDE + 4;
    if current <= window {
      links.extend(numbers(1..=(window + ON_EACH_SIDE), current));
      links.push(PageLink::gap());
      links.extend(numbers((last - 1)..=last, current));
    } else if current > last - window {
      links.extend(numbers(1..=2, current));
      links.push(PageLink::gap());
      links.extend(numbers((last - (window + ON_EACH_SIDE - 1))..=last, current));
    } else {
      links.extend(numbers(1..=2, current));
      links.push(PageLink::gap());
      links.extend(numbers((current - ON_EACH_SIDE)..=(current + ON_EACH_SIDE), current));
      links.push(PageLink::gap());
      links.extend(numbers((last - 1)..=last, current));
    }
  }

  links.push(PageLink {
    label: NEXT_LABEL.to_string(),
    page: if current < last { Some(current + 1) } else { None },
    active: false
  });
  links
}

/// One page of a listing plus what's needed to render the
/// page navigation.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
  pub items: Vec<T>,
  pub current_page: u32,
  pub last_page: u32,
  pub per_page: u32,
  pub total: u64,
  // 1-based positions of the first and last item shown.
  pub from: Option<u64>,
  pub to: Option<u64>,
  pub links: Vec<PageLink>
}

impl<T> Page<T> {
  pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
    let last = last_page(total, request.per_page);
    let offset = request.offset() as u64;
    let (from, to) = if items.is_empty() {
      (None, None)
    } else {
      (Some(offset + 1), Some(offset + items.len() as u64))
    };
    Self {
      items,
      current_page: request.page,
      last_page: last,
      per_page: request.per_page,
      total,
      from,
      to,
      links: page_links(request.page, last)
    }
  }

  pub fn map<U, F>(self, f: F) -> Page<U>
    where F: FnMut(T) -> U
  {
    Page {
      items: self.items.into_iter().map(f).collect(),
      current_page: self.current_page,
      last_page: self.last_page,
      per_page: self.per_page,
      total: self.total,
      from: self.from,
      to: self.to,
      links: self.links
    }
  }
}
