use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::constants;

/// Persisted user preferences (`prefs.toml` in the platform config directory).
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct Config {
  pub api_base: Option<String>,
  pub page_size: Option<usize>,
}

fn project_dirs() -> Option<ProjectDirs> {
  ProjectDirs::from("", "", "podcat")
}

impl Config {
  pub fn path() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join("prefs.toml"))
  }

  /// Load preferences; a missing or unreadable file yields defaults.
  pub fn load() -> Self {
    if let Some(config_file) = Self::path()
      && let Ok(content) = std::fs::read_to_string(config_file)
      && let Ok(config) = toml::from_str(&content)
    {
      return config;
    }
    Self::default()
  }

  pub fn save(&self) -> Result<PathBuf> {
    let config_file = Self::path().ok_or_else(|| anyhow!("No home directory to store preferences in"))?;
    if let Some(dir) = config_file.parent() {
      std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let content = toml::to_string(self).context("Failed to serialize preferences")?;
    std::fs::write(&config_file, content).with_context(|| format!("Failed to write {}", config_file.display()))?;
    Ok(config_file)
  }

  /// Effective settings: explicit overrides first, then saved preferences, then built-in constants.
  pub fn resolve(&self, api_base: Option<String>, page_size: Option<usize>) -> Settings {
    Settings {
      api_base: api_base.or_else(|| self.api_base.clone()).unwrap_or_else(|| constants().default_api_base.clone()),
      page_size: page_size.or(self.page_size).filter(|n| *n > 0).unwrap_or(constants().page_size),
    }
  }
}

/// Settings after layering CLI flags, environment and preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
  pub api_base: String,
  pub page_size: usize,
}

/// Directory for rolling log files, if the platform has one.
pub fn log_dir() -> Option<PathBuf> {
  project_dirs().map(|d| d.data_local_dir().join("logs"))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn resolve_prefers_overrides() {
    let cfg = Config { api_base: Some("http://saved:1".to_string()), page_size: Some(24) };
    let s = cfg.resolve(Some("http://flag:2".to_string()), Some(6));
    assert_eq!(s, Settings { api_base: "http://flag:2".to_string(), page_size: 6 });
  }

  #[test]
  fn resolve_falls_back_to_saved_then_constants() {
    let cfg = Config { api_base: Some("http://saved:1".to_string()), page_size: None };
    let s = cfg.resolve(None, None);
    assert_eq!(s.api_base, "http://saved:1");
    assert_eq!(s.page_size, 12);

    let s = Config::default().resolve(None, Some(0));
    assert_eq!(s.api_base, "http://localhost:5000");
    assert_eq!(s.page_size, 12);
  }

  #[test]
  fn prefs_toml_round_trip() {
    let cfg = Config { api_base: Some("https://api.example.com".to_string()), page_size: Some(20) };
    let text = toml::to_string(&cfg).unwrap();
    assert_eq!(toml::from_str::<Config>(&text).unwrap(), cfg);
    assert_eq!(toml::from_str::<Config>("").unwrap(), Config::default());
  }
}
