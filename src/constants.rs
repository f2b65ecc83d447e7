//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available,
//! with no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  pub default_api_base: String,

  // Public catalog
  pub page_size: usize,
  pub preview_chars: usize,
  pub deep_link_prefix: String,
  /// Season filter value that disables season filtering.
  pub all_seasons: String,

  // Backend
  pub http_timeout_secs: u64,

  // Logging
  pub log_file_prefix: String,
  pub default_log_filter: String,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // The RON file is embedded at compile time; a malformed file fails the first access in every test run.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
