use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use crate::constants::constants;
use crate::error::{CatalogError, CatalogResult};

/// Storage-assigned identifier. Only the admin surface addresses records by it.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpisodeId(pub String);

impl EpisodeId {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for EpisodeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for EpisodeId {
  fn from(s: &str) -> Self {
    EpisodeId(s.to_string())
  }
}

/// A single episode as stored by the backend.
///
/// Carries two independent numbering schemes: the feed's native `season`/`episode` pair and the continuous
/// `episode_number` used for public deep links. Numbering fields are normalized while decoding: anything that
/// is not a positive integer decodes as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
  #[serde(rename = "_id")]
  pub id: EpisodeId,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub guid: Option<String>,
  #[serde(default, deserialize_with = "de_text")]
  pub title: String,
  #[serde(default, deserialize_with = "de_text")]
  pub description: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub audio_url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub link: Option<String>,
  #[serde(default, deserialize_with = "de_timestamp", skip_serializing_if = "Option::is_none")]
  pub pub_date: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub duration: Option<String>,
  #[serde(default, deserialize_with = "de_positive", skip_serializing_if = "Option::is_none")]
  pub season: Option<u32>,
  #[serde(default, deserialize_with = "de_positive", skip_serializing_if = "Option::is_none")]
  pub episode: Option<u32>,
  #[serde(default, deserialize_with = "de_positive", skip_serializing_if = "Option::is_none")]
  pub episode_number: Option<u32>,
  #[serde(default, deserialize_with = "de_flag")]
  pub published: bool,
  #[serde(default, deserialize_with = "de_timestamp", skip_serializing_if = "Option::is_none")]
  pub updated_at: Option<DateTime<Utc>>,
}

// --- Boundary normalization ---

fn de_positive<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
  let value = Option::<serde_json::Value>::deserialize(d)?;
  let n = value.as_ref().and_then(|v| {
    v.as_u64().or_else(|| v.as_f64().filter(|f| *f > 0.0 && f.fract() == 0.0).map(|f| f as u64))
  });
  Ok(n.filter(|n| *n > 0).and_then(|n| u32::try_from(n).ok()))
}

fn de_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
  Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn de_flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
  Ok(Option::<bool>::deserialize(d)?.unwrap_or(false))
}

fn de_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
  let raw = Option::<String>::deserialize(d)?;
  Ok(raw.and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok()).map(|dt| dt.with_timezone(&Utc)))
}

// --- Text helpers ---

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

/// Remove every `<...>` span. Plain removal: entities are left alone and no whitespace is inserted.
pub fn strip_html(html: &str) -> String {
  TAG.replace_all(html, "").into_owned()
}

/// Render a feed duration for display.
/// e.g. `01:54:38` → `1h 54min`, `45:10` → `45min`; other shapes are returned unchanged.
pub fn format_duration(raw: &str) -> String {
  let parts: Vec<&str> = raw.split(':').collect();
  let num = |s: &str| s.trim().parse::<u32>().ok();
  match parts.as_slice() {
    [h, m, _] => match (num(h), num(m)) {
      (Some(h), Some(m)) => format!("{}h {}min", h, m),
      _ => raw.to_string(),
    },
    [m, _] => match num(m) {
      Some(m) => format!("{}min", m),
      None => raw.to_string(),
    },
    _ => raw.to_string(),
  }
}

impl Episode {
  /// Lower-cased `title + " " + stripped description`, the haystack for catalog search.
  pub fn search_text(&self) -> String {
    format!("{} {}", self.title, strip_html(&self.description)).to_lowercase()
  }

  /// First `limit` characters of the stripped description.
  pub fn preview(&self, limit: usize) -> String {
    strip_html(&self.description).chars().take(limit).collect()
  }

  pub fn default_preview(&self) -> String {
    self.preview(constants().preview_chars)
  }

  /// Public deep-link path, present only for records with a continuous number.
  pub fn deep_link(&self) -> Option<String> {
    self.episode_number.map(|n| format!("{}/{}", constants().deep_link_prefix, n))
  }

  /// `T{season} · Ep. {episode}` when both halves of the feed numbering are known.
  pub fn season_label(&self) -> Option<String> {
    match (self.season, self.episode) {
      (Some(s), Some(e)) => Some(format!("T{} · Ep. {}", s, e)),
      _ => None,
    }
  }

  pub fn display_duration(&self) -> Option<String> {
    self.duration.as_deref().map(format_duration).filter(|d| !d.is_empty())
  }

  pub fn display_pub_date(&self) -> Option<String> {
    self.pub_date.map(|d| d.format("%d/%m/%Y").to_string())
  }
}

// --- Editable fields ---

/// The only fields the admin surface may change. Serialized as the update request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeEdit {
  pub title: String,
  pub description: String,
  pub published: bool,
}

impl From<&Episode> for EpisodeEdit {
  fn from(ep: &Episode) -> Self {
    EpisodeEdit { title: ep.title.clone(), description: ep.description.clone(), published: ep.published }
  }
}

impl EpisodeEdit {
  pub fn validate(&self) -> CatalogResult<()> {
    if self.title.trim().is_empty() {
      return Err(CatalogError::Validation("title must not be empty".to_string()));
    }
    Ok(())
  }

  /// Apply the edit to a copy of `ep`. Used by the in-memory backend; the real storage layer does its own merge.
  pub fn apply_to(&self, ep: &Episode) -> Episode {
    Episode { title: self.title.clone(), description: self.description.clone(), published: self.published, ..ep.clone() }
  }
}

// --- Numbering validation ---

/// A uniqueness violation found in a record collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumberingIssue {
  DuplicateGuid { guid: String, ids: Vec<EpisodeId> },
  DuplicateEpisodeNumber { number: u32, ids: Vec<EpisodeId> },
}

impl fmt::Display for NumberingIssue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let join = |ids: &[EpisodeId]| ids.iter().map(EpisodeId::as_str).collect::<Vec<_>>().join(", ");
    match self {
      NumberingIssue::DuplicateGuid { guid, ids } => write!(f, "guid {} shared by {}", guid, join(ids)),
      NumberingIssue::DuplicateEpisodeNumber { number, ids } => {
        write!(f, "episode number {} shared by {}", number, join(ids))
      }
    }
  }
}

/// Report duplicate `guid` and `episode_number` values. Records without either value are ignored.
/// Ids within an issue keep input order; issues are ordered by key.
pub fn check_numbering(records: &[Episode]) -> Vec<NumberingIssue> {
  let mut guids: BTreeMap<&str, Vec<EpisodeId>> = BTreeMap::new();
  let mut numbers: BTreeMap<u32, Vec<EpisodeId>> = BTreeMap::new();

  for ep in records {
    if let Some(guid) = ep.guid.as_deref().filter(|g| !g.is_empty()) {
      guids.entry(guid).or_default().push(ep.id.clone());
    }
    if let Some(n) = ep.episode_number {
      numbers.entry(n).or_default().push(ep.id.clone());
    }
  }

  let dup_guids = guids
    .into_iter()
    .filter(|(_, ids)| ids.len() > 1)
    .map(|(guid, ids)| NumberingIssue::DuplicateGuid { guid: guid.to_string(), ids });
  let dup_numbers = numbers
    .into_iter()
    .filter(|(_, ids)| ids.len() > 1)
    .map(|(number, ids)| NumberingIssue::DuplicateEpisodeNumber { number, ids });
  dup_guids.chain(dup_numbers).collect()
}

#[cfg(test)]
pub(crate) fn sample(id: &str, title: &str) -> Episode {
  Episode {
    id: EpisodeId::from(id),
    guid: Some(format!("guid-{}", id)),
    title: title.to_string(),
    published: true,
    ..Default::default()
  }
}
