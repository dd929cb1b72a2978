//! Core library for the weather explorer dashboard.
//!
//! This crate defines:
//! - Unit conversion and display formatting
//! - Normalization of OpenWeather payloads
//! - Forecast day selection
//! - Condition classification and background image resolution
//! - Configuration, persisted preferences and the dashboard controller
//!
//! It is used by `explorer-cli`, but the controller is view-agnostic and
//! can drive any other front end through the [`View`] trait.

pub mod background;
pub mod classify;
pub mod config;
pub mod dashboard;
pub mod forecast;
pub mod model;
pub mod normalize;
pub mod prefs;
pub mod provider;
pub mod units;

pub use background::{Background, DirectoryProbe, HttpProbe, ImageProbe};
pub use classify::{Classification, ConditionBucket, Gradient};
pub use config::{Config, ImageSource};
pub use dashboard::{Dashboard, DashboardOptions, ForecastSource, SearchOutcome, View};
pub use model::{ForecastDay, ForecastSample, WeatherRecord};
pub use prefs::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, Preferences};
pub use provider::{FetchError, OpenWeatherProvider, WeatherProvider};
pub use units::UnitPreference;
