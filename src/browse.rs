use tracing::{info, warn};

use crate::backend::CatalogBackend;
use crate::catalog::{self, CatalogIndex};
use crate::episode::Episode;
use crate::error::CatalogResult;
use crate::query::{self, Page, SeasonFilter};

/// Public catalog view state: the published snapshot plus the visitor's search, season and page.
pub struct PublicCatalog<'b, B: CatalogBackend + ?Sized> {
  backend: &'b B,
  episodes: Vec<Episode>,
  pub index: CatalogIndex,
  search: String,
  season: SeasonFilter,
  page: usize,
  pub page_size: usize,
  pub last_error: Option<String>,
}

impl<'b, B: CatalogBackend + ?Sized> PublicCatalog<'b, B> {
  pub fn new(backend: &'b B, page_size: usize) -> Self {
    Self {
      backend,
      episodes: Vec::new(),
      index: CatalogIndex::default(),
      search: String::new(),
      season: SeasonFilter::All,
      page: 1,
      page_size,
      last_error: None,
    }
  }

  pub fn episodes(&self) -> &[Episode] {
    &self.episodes
  }

  /// Fetch the published records. The snapshot and index are replaced only on success.
  pub async fn refresh(&mut self) -> CatalogResult<()> {
    match self.backend.fetch_published().await {
      Ok(episodes) => {
        // Public surface only ever sees the published subset, whatever the backend sent.
        let episodes: Vec<Episode> = episodes.into_iter().filter(|e| e.published).collect();
        self.index = CatalogIndex::build(&episodes);
        self.episodes = episodes;
        self.last_error = None;
        info!(count = self.episodes.len(), seasons = self.index.seasons.len(), "public catalog refreshed");
        Ok(())
      }
      Err(e) => {
        warn!(err = %e, "public catalog refresh failed");
        self.last_error = Some(e.to_string());
        Err(e)
      }
    }
  }

  pub fn search(&self) -> &str {
    &self.search
  }

  pub fn season(&self) -> SeasonFilter {
    self.season
  }

  pub fn page(&self) -> usize {
    self.page
  }

  /// Changing the search term always returns to page 1, since the filtered set may shrink.
  pub fn set_search(&mut self, term: &str) {
    self.search = term.to_string();
    self.page = 1;
  }

  pub fn set_season(&mut self, season: SeasonFilter) {
    self.season = season;
    self.page = 1;
  }

  pub fn set_page(&mut self, page: usize) {
    self.page = page;
  }

  pub fn current_page(&self) -> Page<'_> {
    query::query(&self.episodes, &self.search, self.season, self.page, self.page_size)
  }

  /// Deep-link lookup against the loaded snapshot.
  pub fn by_number(&self, number: u32) -> Option<&Episode> {
    catalog::find_by_number(&self.episodes, number)
  }

  /// Deep-link lookup straight from the backend, for visitors landing on a detail page.
  pub async fn fetch_by_number(&self, number: u32) -> CatalogResult<Episode> {
    self.backend.fetch_by_number(number).await
  }
}
