use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::provider::openweather::DEFAULT_BASE_URL;

pub const DEFAULT_FORECAST_SLOTS: usize = 5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2_000;

/// Where background images are looked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "location", rename_all = "lowercase")]
pub enum ImageSource {
    /// Local directory holding the image files directly.
    Directory(PathBuf),
    /// Static host; files are fetched from `<base>/images/<file>`.
    Http(String),
}

impl Default for ImageSource {
    fn default() -> Self {
        ImageSource::Directory(PathBuf::from("images"))
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// forecast_slots = 5
/// favorites = ["Seattle", "Tokyo"]
///
/// [image_source]
/// kind = "directory"
/// location = "/usr/share/weather-explorer/images"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub probe_timeout_ms: u64,
    /// Number of forecast slots the view provides.
    pub forecast_slots: usize,
    /// Shortcut cities, addressed by their 1-based position.
    pub favorites: Vec<String>,
    /// Kept last: it serializes as a TOML table.
    pub image_source: ImageSource,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            forecast_slots: DEFAULT_FORECAST_SLOTS,
            favorites: Vec::new(),
            image_source: ImageSource::default(),
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weather-explorer", "weather-explorer")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the persisted preferences (unit, last city).
    pub fn preferences_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().join("preferences.toml"))
    }

    /// Set or replace the API key.
    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Favorite at a 1-based position.
    pub fn favorite(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|i| self.favorites.get(i))
            .map(String::as_str)
    }

    /// Append a favorite. Returns `false` for blank names and for cities
    /// already in the list (compared case-insensitively).
    pub fn add_favorite(&mut self, city: &str) -> bool {
        let city = city.trim();
        if city.is_empty() || self.favorites.iter().any(|f| f.eq_ignore_ascii_case(city)) {
            return false;
        }
        self.favorites.push(city.to_string());
        true
    }

    /// Drop a favorite by name. Returns whether anything was removed.
    pub fn remove_favorite(&mut self, city: &str) -> bool {
        let before = self.favorites.len();
        self.favorites.retain(|f| !f.eq_ignore_ascii_case(city.trim()));
        self.favorites.len() != before
    }
}
