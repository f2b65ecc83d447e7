use thiserror::Error;

/// Failures surfaced by the catalog controllers and the backend.
///
/// The query engine and index builder never produce these; malformed input there is treated as absence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
  /// The requested `id` or `episodeNumber` has no matching record.
  #[error("not found: {0}")]
  NotFound(String),
  /// The storage layer (or local pre-validation) rejected a mutation payload.
  #[error("rejected: {0}")]
  Validation(String),
  /// Network or response failure; retrying later may succeed.
  #[error("backend unavailable: {0}")]
  Transient(String),
}

impl CatalogError {
  pub fn is_retryable(&self) -> bool {
    matches!(self, CatalogError::Transient(_))
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, CatalogError::NotFound(_))
  }
}

impl From<reqwest::Error> for CatalogError {
  fn from(e: reqwest::Error) -> Self {
    CatalogError::Transient(e.to_string())
  }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
