//! The controller behind the dashboard.
//!
//! `Dashboard` owns the application state (unit, last city, last record and
//! forecast) and drives one search end to end: current weather, forecast,
//! background. Rendering is delegated to a [`View`].

use std::{
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use chrono::NaiveDate;
use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info, warn};

use crate::{
    Config,
    background::{Background, ImageProbe, choose_background},
    classify::{ConditionBucket, classify},
    forecast::{bucketize, fill_slots, local_today, synthetic_forecast},
    model::{ForecastDay, WeatherRecord},
    normalize::{normalize_current, normalize_forecast},
    prefs::{DEFAULT_CITY, LAST_CITY_KEY, PreferenceStore, Preferences, UNIT_KEY, persist},
    provider::WeatherProvider,
    units::UnitPreference,
};

/// Where the displayed forecast came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastSource {
    Provider,
    /// Derived from the current observation after the forecast fetch failed.
    Synthetic,
}

/// Presentation surface. Implementations only write; the dashboard never
/// reads state back from a view.
pub trait View: Send + Sync {
    fn show_loading(&self, city: &str);

    fn show_error(&self, city: &str, message: &str);

    fn show_current(&self, city: &str, record: &WeatherRecord, unit: UnitPreference);

    fn show_forecast(&self, days: &[ForecastDay], source: ForecastSource, unit: UnitPreference);

    fn show_background(&self, background: &Background);
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Rendered {
        city: String,
        bucket: ConditionBucket,
        background: String,
        forecast: ForecastSource,
    },
    /// The current-weather fetch failed; the error state was shown.
    Failed { city: String, message: String },
    /// A newer search started before this one finished; nothing was shown.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub forecast_slots: usize,
    pub probe_timeout: Duration,
}

impl From<&Config> for DashboardOptions {
    fn from(config: &Config) -> Self {
        Self {
            forecast_slots: config.forecast_slots,
            probe_timeout: config.probe_timeout(),
        }
    }
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

#[derive(Debug, Clone)]
struct LastForecast {
    days: Vec<ForecastDay>,
    source: ForecastSource,
}

#[derive(Debug)]
struct AppState {
    unit: UnitPreference,
    last_city: String,
    last_record: Option<WeatherRecord>,
    last_forecast: Option<LastForecast>,
    request_seq: u64,
}

pub struct Dashboard {
    provider: Box<dyn WeatherProvider>,
    probe: Box<dyn ImageProbe>,
    view: Box<dyn View>,
    store: Box<dyn PreferenceStore>,
    options: DashboardOptions,
    today: fn() -> NaiveDate,
    rng: Mutex<StdRng>,
    state: Mutex<AppState>,
}

impl Dashboard {
    /// Build a dashboard, restoring unit and last city from `store`.
    pub fn new(
        provider: Box<dyn WeatherProvider>,
        probe: Box<dyn ImageProbe>,
        view: Box<dyn View>,
        store: Box<dyn PreferenceStore>,
        options: DashboardOptions,
    ) -> Self {
        let prefs = Preferences::load(store.as_ref());

        Self {
            provider,
            probe,
            view,
            store,
            options,
            today: local_today,
            rng: Mutex::new(StdRng::from_entropy()),
            state: Mutex::new(AppState {
                unit: prefs.unit,
                last_city: prefs.last_city,
                last_record: None,
                last_forecast: None,
                request_seq: 0,
            }),
        }
    }

    /// Replace the source of "today" used to drop past forecast days.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Seed the generator behind the synthetic forecast.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    fn state(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn unit(&self) -> UnitPreference {
        self.state().unit
    }

    pub fn last_city(&self) -> String {
        self.state().last_city.clone()
    }

    pub fn last_record(&self) -> Option<WeatherRecord> {
        self.state().last_record.clone()
    }

    /// City a search would target: explicit argument, then the raw input
    /// field, then the last city, then the built-in default.
    pub fn target_city(&self, explicit: Option<&str>, input: &str) -> String {
        let trimmed = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());

        explicit
            .and_then(trimmed)
            .or_else(|| trimmed(input))
            .or_else(|| trimmed(&self.state().last_city))
            .unwrap_or_else(|| DEFAULT_CITY.to_string())
    }

    /// Run `apply` against the state only if `ticket` is still the newest
    /// request. Returns whether it ran.
    fn commit(&self, ticket: u64, apply: impl FnOnce(&mut AppState)) -> bool {
        let mut state = self.state();
        if state.request_seq != ticket {
            return false;
        }
        apply(&mut state);
        true
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.commit(ticket, |_| {})
    }

    /// Fetch and render weather for a city.
    ///
    /// A failed current-weather fetch ends the request with an error state.
    /// A failed forecast fetch falls back to a synthetic forecast. If a
    /// newer search starts while this one is in flight, this one stops
    /// rendering at its next checkpoint.
    pub async fn search(&self, explicit: Option<&str>, input: &str) -> SearchOutcome {
        let city = self.target_city(explicit, input);

        let ticket = {
            let mut state = self.state();
            state.request_seq += 1;
            state.last_city = city.clone();
            state.request_seq
        };
        persist(self.store.as_ref(), LAST_CITY_KEY, &city);

        self.view.show_loading(&city);
        info!(city = %city, "fetching weather");

        let raw = match self.provider.current(&city).await {
            Ok(raw) => raw,
            Err(err) => {
                if !self.is_current(ticket) {
                    return SearchOutcome::Superseded;
                }
                warn!(city = %city, error = %err, "current weather fetch failed");
                let message = err.to_string();
                self.view.show_error(&city, &message);
                return SearchOutcome::Failed { city, message };
            }
        };

        let current = normalize_current(&raw);
        let mut unit = UnitPreference::default();
        if !self.commit(ticket, |s| {
            s.last_record = Some(current.clone());
            unit = s.unit;
        }) {
            return SearchOutcome::Superseded;
        }
        self.view.show_current(&city, &current, unit);

        let (days, source) = match self.provider.forecast(&city).await {
            Ok(raw) => {
                let samples = normalize_forecast(&raw);
                let days = bucketize(&samples, (self.today)());
                let days = fill_slots(&days, self.options.forecast_slots).to_vec();
                (days, ForecastSource::Provider)
            }
            Err(err) => {
                warn!(city = %city, error = %err, "forecast fetch failed, using synthetic forecast");
                (self.synthetic(Some(&current)), ForecastSource::Synthetic)
            }
        };

        if days.is_empty() {
            // Nothing usable: the slots keep whatever they showed before.
            if !self.is_current(ticket) {
                return SearchOutcome::Superseded;
            }
            debug!(city = %city, "forecast has no upcoming days, leaving slots untouched");
        } else {
            let last = LastForecast {
                days: days.clone(),
                source,
            };
            if !self.commit(ticket, |s| {
                s.last_forecast = Some(last);
                unit = s.unit;
            }) {
                return SearchOutcome::Superseded;
            }
            self.view.show_forecast(&days, source, unit);
        }

        let classification = classify(&current);
        let background =
            choose_background(&classification, self.probe.as_ref(), self.options.probe_timeout)
                .await;

        if !self.is_current(ticket) {
            return SearchOutcome::Superseded;
        }
        self.view.show_background(&background);
        info!(
            city = %city,
            condition = %background.bucket,
            chosen = %background.file,
            "background updated"
        );

        SearchOutcome::Rendered {
            city,
            bucket: background.bucket,
            background: background.file,
            forecast: source,
        }
    }

    fn synthetic(&self, current: Option<&WeatherRecord>) -> Vec<ForecastDay> {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        synthetic_forecast(current, self.options.forecast_slots, &mut *rng)
    }

    /// Switch the display unit and redraw from the last known data.
    ///
    /// Stored records are not touched. Without a previous search only the
    /// preference changes.
    pub fn set_unit(&self, unit: UnitPreference) {
        let (city, record, forecast) = {
            let mut state = self.state();
            state.unit = unit;
            (
                state.last_city.clone(),
                state.last_record.clone(),
                state.last_forecast.clone(),
            )
        };
        persist(self.store.as_ref(), UNIT_KEY, unit.as_str());

        if let Some(record) = record {
            self.view.show_current(&city, &record, unit);
        }
        if let Some(forecast) = forecast {
            self.view.show_forecast(&forecast.days, forecast.source, unit);
        }
    }
}
