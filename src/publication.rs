use tracing::{info, warn};

use crate::backend::{CatalogBackend, CatalogStats};
use crate::catalog::CatalogIndex;
use crate::episode::Episode;
use crate::error::CatalogResult;

/// Admin-side owner of the full catalog snapshot (published and draft).
///
/// Bulk mutations never touch the snapshot directly: it only changes when a refresh succeeds, so a failed request
/// leaves the last fetched collection in place.
pub struct PublicationController<'b, B: CatalogBackend + ?Sized> {
  backend: &'b B,
  pub episodes: Vec<Episode>,
  pub index: CatalogIndex,
  pub last_error: Option<String>,
  /// Informational message, lower priority than an error.
  pub info_message: Option<String>,
}

impl<'b, B: CatalogBackend + ?Sized> PublicationController<'b, B> {
  pub fn new(backend: &'b B) -> Self {
    Self { backend, episodes: Vec::new(), index: CatalogIndex::default(), last_error: None, info_message: None }
  }

  pub fn dismiss_error(&mut self) {
    self.last_error = None;
  }

  fn record<T>(&mut self, result: CatalogResult<T>) -> CatalogResult<T> {
    if let Err(ref e) = result {
      self.last_error = Some(e.to_string());
    }
    result
  }

  /// Replace the snapshot with a fresh fetch of every record.
  pub async fn refresh(&mut self) -> CatalogResult<()> {
    let result = self.backend.fetch_all().await;
    match self.record(result) {
      Ok(episodes) => {
        self.index = CatalogIndex::build(&episodes);
        self.episodes = episodes;
        info!(count = self.episodes.len(), "admin catalog refreshed");
        Ok(())
      }
      Err(e) => {
        warn!(err = %e, "admin catalog refresh failed; keeping previous snapshot");
        Err(e)
      }
    }
  }

  pub async fn publish_all(&mut self) -> CatalogResult<()> {
    self.set_all(true).await
  }

  pub async fn unpublish_all(&mut self) -> CatalogResult<()> {
    self.set_all(false).await
  }

  async fn set_all(&mut self, published: bool) -> CatalogResult<()> {
    self.last_error = None;
    self.info_message = None;
    let result = self.backend.set_all_published(published).await;
    if let Err(e) = self.record(result) {
      warn!(published, err = %e, "bulk publication change failed");
      return Err(e);
    }
    self.info_message = Some(if published { "All episodes published." } else { "All episodes unpublished." }.to_string());
    self.refresh().await
  }

  /// Trigger feed synchronization, then refresh.
  pub async fn sync_feed(&mut self) -> CatalogResult<()> {
    self.last_error = None;
    self.info_message = None;
    let result = self.backend.trigger_sync().await;
    let report = self.record(result)?;
    self.info_message = Some(match report {
      Some(r) => {
        info!(imported = r.imported, updated = r.updated, total_feed = r.total_feed, "feed sync finished");
        format!("Sync finished. Imported: {}, updated: {}, total in feed: {}", r.imported, r.updated, r.total_feed)
      }
      None => "Sync finished.".to_string(),
    });
    self.refresh().await
  }

  pub async fn stats(&mut self) -> CatalogResult<CatalogStats> {
    let result = self.backend.stats().await;
    self.record(result)
  }

  pub fn published_count(&self) -> usize {
    self.episodes.iter().filter(|e| e.published).count()
  }
}
