use serde::{Deserialize, Serialize};

/// Canonical observation in metric base units (Celsius, m/s).
///
/// Every numeric field is `None` when the provider omitted it or sent
/// something non-numeric. Renderers show a placeholder for `None`, never a
/// zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub temperature: Option<f64>,
    pub feels_like: Option<f64>,
    pub min_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub wind_speed_ms: Option<f64>,
    pub cloud_pct: Option<f64>,
    pub sunrise_epoch_sec: Option<f64>,
    pub sunset_epoch_sec: Option<f64>,
    /// Free text as sent by the provider; original casing kept for display.
    pub description: String,
    /// Provider's short category label, e.g. "Rain".
    pub condition_main: String,
}

/// One 3-hour forecast entry as delivered by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    /// Raw `"YYYY-MM-DD HH:MM:SS"` timestamp; may be empty when absent.
    pub timestamp: String,
    pub record: WeatherRecord,
}

/// A calendar day and the sample chosen to represent it.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastDay {
    /// ISO date, `YYYY-MM-DD`.
    pub date: String,
    /// Short label shown above the slot ("Mon", "Today", "Day 3", ...).
    pub label: String,
    pub representative: WeatherRecord,
}
