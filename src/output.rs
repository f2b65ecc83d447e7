//! Plain-text rendering for the command line.

use std::fmt::Write;

use crate::backend::CatalogStats;
use crate::episode::{Episode, strip_html};
use crate::query::{Page, SeasonFilter};

fn truncate(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    return s.to_string();
  }
  let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
  out.push('…');
  out
}

/// Date and duration joined the way the catalog cards show them.
fn date_line(ep: &Episode) -> String {
  match (ep.display_pub_date(), ep.display_duration()) {
    (Some(d), Some(t)) => format!("{} • {}", d, t),
    (Some(d), None) => d,
    (None, Some(t)) => t,
    (None, None) => String::new(),
  }
}

pub fn render_page(page: &Page<'_>, search: &str, season: SeasonFilter) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "Episodes (season: {}, search: {:?})", season, search.trim());
  let _ = writeln!(out, "{}", "-".repeat(64));

  if page.is_empty() {
    let _ = writeln!(out, "No episodes match the current filters.");
    return out;
  }

  for ep in &page.items {
    let number = ep.episode_number.map_or_else(|| "-".to_string(), |n| format!("#{}", n));
    let _ = writeln!(out, "{:<6} {}", number, ep.title);
    if let Some(label) = ep.season_label() {
      let _ = writeln!(out, "       {}", label);
    }
    let meta = date_line(ep);
    if !meta.is_empty() {
      let _ = writeln!(out, "       {}", meta);
    }
    let preview = ep.default_preview();
    if !preview.trim().is_empty() {
      let _ = writeln!(out, "       {}...", preview.trim());
    }
    if let Some(link) = ep.deep_link() {
      let _ = writeln!(out, "       {}", link);
    }
  }

  if page.is_paginated() {
    let _ = writeln!(out, "{}", "-".repeat(64));
    let _ = writeln!(out, "Page {} of {} ({} episodes)", page.page, page.total_pages, page.filtered_count);
  }
  out
}

pub fn render_seasons(seasons: &[u32]) -> String {
  if seasons.is_empty() {
    return "No seasons.\n".to_string();
  }
  let mut out = String::from("all\n");
  for s in seasons {
    let _ = writeln!(out, "{}", s);
  }
  out
}

pub fn render_episode(ep: &Episode, download_url: Option<&str>) -> String {
  let mut out = String::new();
  if let (Some(s), Some(e)) = (ep.season, ep.episode) {
    let _ = writeln!(out, "Season {} · Episode {}", s, e);
  }
  let _ = writeln!(out, "{}", ep.title);
  if let Some(d) = ep.display_pub_date() {
    let _ = writeln!(out, "Published on {}", d);
  }
  if let Some(t) = ep.duration.as_deref().filter(|t| !t.is_empty()) {
    let _ = writeln!(out, "Duration: {}", t);
  }
  if let Some(audio) = &ep.audio_url {
    let _ = writeln!(out, "Audio: {}", audio);
  } else {
    let _ = writeln!(out, "Audio unavailable for this episode.");
  }
  if let Some(url) = download_url {
    let _ = writeln!(out, "Download: {}", url);
  }
  let body = strip_html(&ep.description);
  if !body.trim().is_empty() {
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", body.trim());
  }
  out
}

/// Admin view of one record, including the fields visitors never see.
pub fn render_admin_episode(ep: &Episode) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "ID:        {}", ep.id);
  let _ = writeln!(out, "GUID:      {}", ep.guid.as_deref().unwrap_or("-"));
  let _ = writeln!(out, "Title:     {}", ep.title);
  let _ = writeln!(out, "Number:    {}", ep.episode_number.map_or_else(|| "-".to_string(), |n| n.to_string()));
  let _ = writeln!(out, "Season:    {}", ep.season_label().unwrap_or_else(|| "-".to_string()));
  let _ = writeln!(out, "Published: {}", if ep.published { "yes" } else { "no" });
  if let Some(d) = ep.display_pub_date() {
    let _ = writeln!(out, "Feed date: {}", d);
  }
  if let Some(u) = ep.updated_at {
    let _ = writeln!(out, "Updated:   {}", u.format("%d/%m/%Y %H:%M:%S"));
  }
  if let Some(audio) = &ep.audio_url {
    let _ = writeln!(out, "Audio:     {}", audio);
  }
  let _ = writeln!(out);
  let _ = writeln!(out, "{}", ep.description);
  out
}

pub fn render_admin_table(episodes: &[Episode]) -> String {
  if episodes.is_empty() {
    return "No episodes found. Run `podcat admin sync` to import from the feed.\n".to_string();
  }
  let mut out = String::new();
  let _ = writeln!(out, "{:<26} {:<40} {:<12} {:<9}", "ID", "TITLE", "DATE", "PUBLISHED");
  let _ = writeln!(out, "{}", "-".repeat(90));
  for ep in episodes {
    let _ = writeln!(
      out,
      "{:<26} {:<40} {:<12} {:<9}",
      truncate(ep.id.as_str(), 26),
      truncate(&ep.title, 40),
      ep.display_pub_date().unwrap_or_else(|| "-".to_string()),
      if ep.published { "yes" } else { "no" }
    );
  }
  out
}

pub fn render_stats(stats: &CatalogStats) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "Total:     {}", stats.total);
  let _ = writeln!(out, "Published: {}", stats.published);
  let _ = writeln!(out, "Drafts:    {}", stats.draft);
  let _ = writeln!(out);
  let _ = writeln!(out, "Last edited");
  if stats.last_edited.is_empty() {
    let _ = writeln!(out, "  No edits found.");
  }
  for ep in &stats.last_edited {
    let state = if ep.published { "Published" } else { "Draft" };
    let when = ep.updated_at.map(|u| u.format("%d/%m/%Y %H:%M").to_string()).unwrap_or_default();
    let _ = writeln!(out, "  {} · {} · {} ({})", ep.title, state, when, ep.id);
  }
  out
}
