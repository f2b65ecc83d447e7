//! Podcast episode catalog: season index, search and pagination over a published snapshot, plus the
//! admin-side edit and publication controllers that talk to the episode backend.
//!
//! Public pages address episodes by their continuous `episode_number`; the admin surface addresses them by
//! storage id. The two never mix.

pub mod admin;
pub mod backend;
pub mod browse;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod episode;
pub mod error;
pub mod logging;
pub mod output;
pub mod publication;
pub mod query;

pub use backend::{CatalogBackend, HttpBackend};
pub use episode::{Episode, EpisodeEdit, EpisodeId};
pub use error::{CatalogError, CatalogResult};
pub use query::{Page, SeasonFilter, query};
