use std::fmt;
use std::str::FromStr;

use crate::constants::constants;
use crate::episode::Episode;

/// Season selection for the public catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SeasonFilter {
  #[default]
  All,
  Season(u32),
}

impl SeasonFilter {
  pub fn matches(self, ep: &Episode) -> bool {
    match self {
      SeasonFilter::All => true,
      SeasonFilter::Season(s) => ep.season == Some(s),
    }
  }
}

impl FromStr for SeasonFilter {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    if s.eq_ignore_ascii_case(&constants().all_seasons) {
      return Ok(SeasonFilter::All);
    }
    match s.parse::<u32>() {
      Ok(n) if n > 0 => Ok(SeasonFilter::Season(n)),
      _ => Err(format!("invalid season '{}': expected '{}' or a positive number", s, constants().all_seasons)),
    }
  }
}

impl fmt::Display for SeasonFilter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SeasonFilter::All => f.write_str(&constants().all_seasons),
      SeasonFilter::Season(n) => write!(f, "{}", n),
    }
  }
}

/// One page of a filtered view. Items borrow from the caller's snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
  pub items: Vec<&'a Episode>,
  /// Requested page, echoed back unclamped.
  pub page: usize,
  pub total_pages: usize,
  pub filtered_count: usize,
}

impl Page<'_> {
  pub fn is_empty(&self) -> bool {
    self.filtered_count == 0
  }

  /// Whether a pager is worth showing at all.
  pub fn is_paginated(&self) -> bool {
    self.total_pages > 1
  }
}

/// Check whether an episode matches a search term.
/// The term is trimmed and compared case-insensitively against the title plus the tag-stripped description.
pub fn matches_search(ep: &Episode, term: &str) -> bool {
  let needle = term.trim().to_lowercase();
  if needle.is_empty() {
    return true;
  }
  ep.search_text().contains(&needle)
}

/// `max(1, ceil(count / page_size))`. A zero page size counts as 1.
pub fn total_pages(filtered_count: usize, page_size: usize) -> usize {
  filtered_count.div_ceil(page_size.max(1)).max(1)
}

/// Filter by season, then by search term, then slice out `page` (1-based).
///
/// Input order is preserved. Pages outside `1..=total_pages` yield no items; callers reset to page 1 when the
/// filters change.
pub fn query<'a>(
  records: &'a [Episode],
  search_term: &str,
  season: SeasonFilter,
  page: usize,
  page_size: usize,
) -> Page<'a> {
  let page_size = page_size.max(1);
  let needle = search_term.trim().to_lowercase();

  let filtered: Vec<&Episode> = records
    .iter()
    .filter(|ep| season.matches(ep))
    .filter(|ep| needle.is_empty() || ep.search_text().contains(&needle))
    .collect();

  let filtered_count = filtered.len();
  let items = match page.checked_sub(1) {
    Some(idx) => filtered.into_iter().skip(idx.saturating_mul(page_size)).take(page_size).collect(),
    None => Vec::new(),
  };

  Page { items, page, total_pages: total_pages(filtered_count, page_size), filtered_count }
}
