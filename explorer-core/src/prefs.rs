//! Small key-value store for user preferences that survive restarts.

use std::{
    collections::BTreeMap,
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{Context, Result};
use tracing::warn;

use crate::units::UnitPreference;

pub const UNIT_KEY: &str = "unit";
pub const LAST_CITY_KEY: &str = "lastCity";
pub const DEFAULT_CITY: &str = "Seattle";

pub trait PreferenceStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Flat string table persisted as TOML.
///
/// The file is re-read on every access so several processes see each
/// other's writes.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read preferences: {}", self.path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse preferences: {}", self.path.display()))
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.read_table() {
            Ok(mut table) => table.remove(key),
            Err(err) => {
                warn!(error = %err, "ignoring unreadable preferences");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut table = self.read_table().unwrap_or_default();
        table.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create preferences directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string(&table).context("Failed to serialize preferences")?;
        fs::write(&self.path, toml)
            .with_context(|| format!("Failed to write preferences: {}", self.path.display()))
    }
}

/// In-process store, mainly for tests and one-off runs.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .map_err(|_| anyhow::anyhow!("preference store lock poisoned"))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preferences read at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub unit: UnitPreference,
    pub last_city: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            unit: UnitPreference::Celsius,
            last_city: DEFAULT_CITY.to_string(),
        }
    }
}

impl Preferences {
    /// Read both keys, falling back to `"C"` / `"Seattle"` when absent or
    /// unusable.
    pub fn load(store: &dyn PreferenceStore) -> Self {
        let unit = store
            .get(UNIT_KEY)
            .and_then(|u| u.parse().ok())
            .unwrap_or_default();

        let last_city = store
            .get(LAST_CITY_KEY)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CITY.to_string());

        Self { unit, last_city }
    }
}

/// Write a preference, logging instead of failing.
pub fn persist(store: &dyn PreferenceStore, key: &str, value: &str) {
    if let Err(err) = store.set(key, value) {
        warn!(key, error = %err, "failed to persist preference");
    }
}
