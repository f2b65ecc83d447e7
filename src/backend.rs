use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::episode::{Episode, EpisodeEdit, EpisodeId};
use crate::error::{CatalogError, CatalogResult};

/// Counts reported by the feed synchronization endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
  pub imported: u64,
  pub updated: u64,
  pub total_feed: u64,
}

/// Admin dashboard overview.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
  pub total: u64,
  pub published: u64,
  pub draft: u64,
  #[serde(default)]
  pub last_edited: Vec<Episode>,
}

/// Operations the catalog consumes from the storage backend.
///
/// Implementations own the network; callers own the snapshots built from the results.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
  /// Every record, published or not. Admin views only.
  async fn fetch_all(&self) -> CatalogResult<Vec<Episode>>;

  /// Published records, newest `episodeNumber` first.
  async fn fetch_published(&self) -> CatalogResult<Vec<Episode>>;

  async fn fetch_by_id(&self, id: &EpisodeId) -> CatalogResult<Episode>;

  /// Public deep-link lookup.
  async fn fetch_by_number(&self, number: u32) -> CatalogResult<Episode>;

  /// Partial update of the editable fields. Returns the record as stored.
  async fn update(&self, id: &EpisodeId, edit: &EpisodeEdit) -> CatalogResult<Episode>;

  /// Set `published` on every record.
  async fn set_all_published(&self, published: bool) -> CatalogResult<()>;

  /// Ask the backend to pull the RSS feed. `None` when it answered without counts.
  async fn trigger_sync(&self) -> CatalogResult<Option<SyncReport>>;

  async fn stats(&self) -> CatalogResult<CatalogStats>;
}

// --- HTTP implementation ---

#[derive(Deserialize)]
struct ErrorBody {
  error: Option<String>,
}

/// Map a non-success response to the error taxonomy.
/// 404 is `NotFound`, 400/422 are `Validation`, everything else is `Transient`.
pub(crate) fn classify_failure(status: StatusCode, body: &str, what: &str) -> CatalogError {
  let detail = serde_json::from_str::<ErrorBody>(body).ok().and_then(|b| b.error).filter(|s| !s.trim().is_empty());
  match status {
    StatusCode::NOT_FOUND => CatalogError::NotFound(what.to_string()),
    StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
      CatalogError::Validation(detail.unwrap_or_else(|| format!("{} rejected (HTTP {})", what, status.as_u16())))
    }
    _ => match detail {
      Some(d) => CatalogError::Transient(format!("{} failed (HTTP {}): {}", what, status.as_u16(), d)),
      None => CatalogError::Transient(format!("{} failed (HTTP {})", what, status.as_u16())),
    },
  }
}

async fn check(resp: Response, what: &str) -> CatalogResult<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body = resp.text().await.unwrap_or_default();
  let err = classify_failure(status, &body, what);
  debug!(status = status.as_u16(), err = %err, "backend: request failed");
  Err(err)
}

async fn decode<T: DeserializeOwned>(resp: Response, what: &str) -> CatalogResult<T> {
  let resp = check(resp, what).await?;
  resp.json::<T>().await.map_err(|e| CatalogError::Transient(format!("unreadable {} response: {}", what, e)))
}

/// REST client for the episode backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
  client: Client,
  base: Url,
}

impl HttpBackend {
  pub fn new(api_base: &str, timeout: Duration) -> Result<Self> {
    let base = Url::parse(api_base).with_context(|| format!("Invalid API base URL '{}'", api_base))?;
    if base.cannot_be_a_base() {
      anyhow::bail!("API base URL '{}' cannot carry a path", api_base);
    }
    let client = Client::builder().timeout(timeout).build().context("Failed to build HTTP client")?;
    Ok(Self { client, base })
  }

  /// Base URL with `segments` appended as individually encoded path segments.
  pub fn endpoint(&self, segments: &[&str]) -> Url {
    let mut url = self.base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  /// Direct audio download link for an episode. Built locally, never fetched.
  pub fn download_url(&self, id: &EpisodeId) -> Url {
    self.endpoint(&["episodes", "download", id.as_str()])
  }

  async fn get<T: DeserializeOwned>(&self, segments: &[&str], what: &str) -> CatalogResult<T> {
    let url = self.endpoint(segments);
    debug!(url = %url, "backend: GET");
    let resp = self.client.get(url).send().await?;
    decode(resp, what).await
  }
}

#[async_trait]
impl CatalogBackend for HttpBackend {
  async fn fetch_all(&self) -> CatalogResult<Vec<Episode>> {
    self.get(&["episodes"], "episode list").await
  }

  async fn fetch_published(&self) -> CatalogResult<Vec<Episode>> {
    self.get(&["episodes", "published"], "published episode list").await
  }

  async fn fetch_by_id(&self, id: &EpisodeId) -> CatalogResult<Episode> {
    self.get(&["episodes", "id", id.as_str()], &format!("episode id {}", id)).await
  }

  async fn fetch_by_number(&self, number: u32) -> CatalogResult<Episode> {
    self.get(&["episodes", "by-number", &number.to_string()], &format!("episode #{}", number)).await
  }

  async fn update(&self, id: &EpisodeId, edit: &EpisodeEdit) -> CatalogResult<Episode> {
    let url = self.endpoint(&["episodes", "id", id.as_str()]);
    debug!(url = %url, "backend: PUT");
    let resp = self.client.put(url).json(edit).send().await?;
    decode(resp, &format!("episode id {}", id)).await
  }

  async fn set_all_published(&self, published: bool) -> CatalogResult<()> {
    let route = if published { "publish-all" } else { "unpublish-all" };
    let url = self.endpoint(&["episodes", route]);
    debug!(url = %url, "backend: PUT");
    let resp = self.client.put(url).send().await?;
    check(resp, route).await?;
    info!(published, "backend: bulk publication state applied");
    Ok(())
  }

  async fn trigger_sync(&self) -> CatalogResult<Option<SyncReport>> {
    let url = self.endpoint(&["episodes", "sync"]);
    debug!(url = %url, "backend: POST");
    let resp = self.client.post(url).send().await?;
    let resp = check(resp, "feed sync").await?;
    // A successful sync without a readable body still counts as done.
    let body = resp.text().await.unwrap_or_default();
    Ok(serde_json::from_str(&body).ok())
  }

  async fn stats(&self) -> CatalogResult<CatalogStats> {
    self.get(&["episodes", "stats"], "catalog stats").await
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  fn backend(base: &str) -> HttpBackend {
    HttpBackend::new(base, Duration::from_secs(1)).unwrap()
  }

  // --- URL building ---

  #[test]
  fn endpoint_joins_segments() {
    let b = backend("http://localhost:5000");
    assert_eq!(b.endpoint(&["episodes", "published"]).as_str(), "http://localhost:5000/episodes/published");
  }

  #[test]
  fn endpoint_keeps_base_path() {
    let b = backend("https://api.example.com/v1/");
    assert_eq!(b.endpoint(&["episodes", "stats"]).as_str(), "https://api.example.com/v1/episodes/stats");
  }

  #[test]
  fn endpoint_encodes_ids() {
    let b = backend("http://localhost:5000");
    let url = b.endpoint(&["episodes", "id", "a/b c"]);
    assert_eq!(url.as_str(), "http://localhost:5000/episodes/id/a%2Fb%20c");
  }

  #[test]
  fn download_url_uses_storage_id() {
    let b = backend("http://localhost:5000");
    assert_eq!(b.download_url(&EpisodeId::from("665f")).as_str(), "http://localhost:5000/episodes/download/665f");
  }

  #[test]
  fn invalid_base_is_rejected() {
    assert!(HttpBackend::new("not a url", Duration::from_secs(1)).is_err());
    assert!(HttpBackend::new("mailto:someone@example.com", Duration::from_secs(1)).is_err());
  }

  // --- status mapping ---

  #[test]
  fn not_found_maps_to_not_found() {
    let err = classify_failure(StatusCode::NOT_FOUND, "", "episode id x");
    assert_eq!(err, CatalogError::NotFound("episode id x".to_string()));
  }

  #[test]
  fn rejection_carries_backend_message() {
    let err = classify_failure(StatusCode::BAD_REQUEST, r#"{"error":"Título obrigatório"}"#, "episode id x");
    assert_eq!(err, CatalogError::Validation("Título obrigatório".to_string()));

    let err = classify_failure(StatusCode::UNPROCESSABLE_ENTITY, "garbage", "episode id x");
    assert!(matches!(err, CatalogError::Validation(m) if m.contains("422")));
  }

  #[test]
  fn server_errors_are_transient() {
    let err = classify_failure(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"db down"}"#, "feed sync");
    assert!(err.is_retryable());
    assert!(err.to_string().contains("db down"));
    assert!(classify_failure(StatusCode::BAD_GATEWAY, "", "x").is_retryable());
  }

  // --- payloads ---

  #[test]
  fn sync_report_decodes_camel_case() {
    let r: SyncReport = serde_json::from_str(r#"{"imported": 3, "updated": 2, "totalFeed": 60}"#).unwrap();
    assert_eq!(r, SyncReport { imported: 3, updated: 2, total_feed: 60 });
  }

  #[test]
  fn stats_decode_last_edited() {
    let json = r#"{"total": 2, "published": 1, "draft": 1,
      "lastEdited": [{"_id": "a", "title": "Ep", "published": true, "updatedAt": "2024-06-01T12:00:00Z"}]}"#;
    let s: CatalogStats = serde_json::from_str(json).unwrap();
    assert_eq!(s.total, 2);
    assert_eq!(s.last_edited.len(), 1);
    assert!(s.last_edited[0].published);
  }
}
