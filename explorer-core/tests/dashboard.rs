use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::NaiveDate;
use explorer_core::{
    Background, ConditionBucket, Dashboard, DashboardOptions, FetchError, FilePreferenceStore,
    ForecastDay, ForecastSource, ImageProbe, MemoryPreferenceStore, PreferenceStore,
    SearchOutcome, UnitPreference, View, WeatherProvider, WeatherRecord,
    background::FALLBACK_IMAGE,
    prefs::{LAST_CITY_KEY, UNIT_KEY},
    units::format_temperature,
};
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Loading(String),
    Error(String, String),
    Current { city: String, temperature: String },
    Forecast { dates: Vec<String>, labels: Vec<String>, source: ForecastSource },
    Background(String, ConditionBucket),
}

#[derive(Clone, Default)]
struct RecordingView {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingView {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl View for RecordingView {
    fn show_loading(&self, city: &str) {
        self.push(Event::Loading(city.to_string()));
    }

    fn show_error(&self, city: &str, message: &str) {
        self.push(Event::Error(city.to_string(), message.to_string()));
    }

    fn show_current(&self, city: &str, record: &WeatherRecord, unit: UnitPreference) {
        self.push(Event::Current {
            city: city.to_string(),
            temperature: format_temperature(record.temperature, unit),
        });
    }

    fn show_forecast(&self, days: &[ForecastDay], source: ForecastSource, _unit: UnitPreference) {
        self.push(Event::Forecast {
            dates: days.iter().map(|d| d.date.clone()).collect(),
            labels: days.iter().map(|d| d.label.clone()).collect(),
            source,
        });
    }

    fn show_background(&self, background: &Background) {
        self.push(Event::Background(background.file.clone(), background.bucket));
    }
}

#[derive(Debug, Clone)]
struct CityData {
    current: Option<Value>,
    forecast: Option<Value>,
    delay: Duration,
}

#[derive(Debug, Default)]
struct FakeProvider {
    cities: HashMap<String, CityData>,
}

impl FakeProvider {
    fn with(mut self, city: &str, current: Option<Value>, forecast: Option<Value>) -> Self {
        self.cities.insert(
            city.to_string(),
            CityData {
                current,
                forecast,
                delay: Duration::ZERO,
            },
        );
        self
    }

    fn delayed(mut self, city: &str, delay: Duration) -> Self {
        if let Some(data) = self.cities.get_mut(city) {
            data.delay = delay;
        }
        self
    }

    fn not_found(endpoint: &'static str) -> FetchError {
        FetchError::Status {
            endpoint,
            status: reqwest::StatusCode::NOT_FOUND,
            body: "{\"cod\":\"404\",\"message\":\"city not found\"}".into(),
        }
    }
}

#[async_trait]
impl WeatherProvider for FakeProvider {
    async fn current(&self, city: &str) -> Result<Value, FetchError> {
        let data = self.cities.get(city).cloned();
        if let Some(data) = &data {
            tokio::time::sleep(data.delay).await;
        }
        data.and_then(|d| d.current)
            .ok_or_else(|| Self::not_found("current weather"))
    }

    async fn forecast(&self, city: &str) -> Result<Value, FetchError> {
        self.cities
            .get(city)
            .and_then(|d| d.forecast.clone())
            .ok_or_else(|| Self::not_found("forecast"))
    }
}

#[derive(Debug, Default)]
struct FakeImages {
    existing: Vec<&'static str>,
}

#[async_trait]
impl ImageProbe for FakeImages {
    async fn probe(&self, file: &str) -> bool {
        self.existing.iter().any(|f| *f == file)
    }
}

fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
}

fn seattle_current() -> Value {
    json!({
        "weather": [{"main": "Rain", "description": "light rain"}],
        "main": {"temp": 15, "feels_like": 14, "humidity": 70},
        "wind": {"speed": 3.6},
        "name": "Seattle"
    })
}

fn week_forecast() -> Value {
    let list: Vec<Value> = (1..=8)
        .flat_map(|day| {
            ["09:00:00", "12:00:00", "15:00:00"].map(|time| {
                json!({
                    "dt_txt": format!("2024-01-0{day} {time}"),
                    "main": {"temp": day, "humidity": 60},
                    "weather": [{"description": "overcast clouds"}]
                })
            })
        })
        .collect();
    json!({ "list": list })
}

fn build(
    provider: FakeProvider,
    images: FakeImages,
    store: Box<dyn PreferenceStore>,
) -> (Dashboard, RecordingView) {
    let view = RecordingView::default();
    let dashboard = Dashboard::new(
        Box::new(provider),
        Box::new(images),
        Box::new(view.clone()),
        store,
        DashboardOptions {
            forecast_slots: 5,
            probe_timeout: Duration::from_secs(1),
        },
    )
    .with_clock(fixed_today)
    .with_seed(42);

    (dashboard, view)
}

#[tokio::test]
async fn seattle_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let prefs_path = dir.path().join("preferences.toml");

    let provider = FakeProvider::default().with("Seattle", Some(seattle_current()), Some(week_forecast()));
    let images = FakeImages {
        existing: vec!["rain.jpg", "default.jpg"],
    };
    let (dashboard, view) = build(provider, images, Box::new(FilePreferenceStore::new(&prefs_path)));

    let outcome = dashboard.search(None, "").await;

    assert_eq!(
        outcome,
        SearchOutcome::Rendered {
            city: "Seattle".into(),
            bucket: ConditionBucket::Rain,
            background: "rain.jpg".into(),
            forecast: ForecastSource::Provider,
        }
    );

    let events = view.events();
    assert_eq!(events[0], Event::Loading("Seattle".into()));
    assert_eq!(
        events[1],
        Event::Current {
            city: "Seattle".into(),
            temperature: "15°".into()
        }
    );
    assert_eq!(
        events[2],
        Event::Forecast {
            dates: ["2024-01-02", "2024-01-03", "2024-01-04", "2024-01-05", "2024-01-06"]
                .map(String::from)
                .to_vec(),
            labels: ["Tue", "Wed", "Thu", "Fri", "Sat"].map(String::from).to_vec(),
            source: ForecastSource::Provider,
        }
    );
    assert_eq!(events[3], Event::Background("rain.jpg".into(), ConditionBucket::Rain));

    dashboard.set_unit(UnitPreference::Fahrenheit);

    let events = view.events();
    assert_eq!(
        events[4],
        Event::Current {
            city: "Seattle".into(),
            temperature: "59°".into()
        }
    );
    assert!(matches!(events[5], Event::Forecast { source: ForecastSource::Provider, .. }));

    // The record itself stays metric.
    assert_eq!(dashboard.last_record().unwrap().temperature, Some(15.0));

    let store = FilePreferenceStore::new(&prefs_path);
    assert_eq!(store.get(UNIT_KEY).as_deref(), Some("F"));
    assert_eq!(store.get(LAST_CITY_KEY).as_deref(), Some("Seattle"));
}

#[tokio::test]
async fn current_failure_shows_error_and_stops() {
    let (dashboard, view) = build(
        FakeProvider::default(),
        FakeImages::default(),
        Box::new(MemoryPreferenceStore::default()),
    );

    let outcome = dashboard.search(Some("Atlantis"), "").await;

    let SearchOutcome::Failed { city, message } = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(city, "Atlantis");
    assert!(message.contains("404"));

    let events = view.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[1], Event::Error(c, m) if c == "Atlantis" && m.contains("city not found")));
    assert!(dashboard.last_record().is_none());
    // The city is remembered even though the request failed.
    assert_eq!(dashboard.last_city(), "Atlantis");
}

#[tokio::test]
async fn forecast_failure_falls_back_to_synthetic() {
    let provider = FakeProvider::default().with("Seattle", Some(seattle_current()), None);
    let (dashboard, view) = build(
        provider,
        FakeImages::default(),
        Box::new(MemoryPreferenceStore::default()),
    );

    let outcome = dashboard.search(Some("Seattle"), "").await;

    assert!(matches!(
        outcome,
        SearchOutcome::Rendered {
            forecast: ForecastSource::Synthetic,
            ..
        }
    ));
    let forecast = view
        .events()
        .into_iter()
        .find(|e| matches!(e, Event::Forecast { .. }))
        .unwrap();
    let Event::Forecast { labels, source, .. } = forecast else {
        unreachable!()
    };
    assert_eq!(source, ForecastSource::Synthetic);
    assert_eq!(labels, ["Today", "Tomorrow", "Day 3", "Day 4", "Day 5"]);
}

#[tokio::test]
async fn missing_images_fall_back_to_default() {
    let provider = FakeProvider::default().with("Seattle", Some(seattle_current()), Some(json!({})));
    let (dashboard, view) = build(
        provider,
        FakeImages::default(),
        Box::new(MemoryPreferenceStore::default()),
    );

    dashboard.search(Some("Seattle"), "").await;

    assert!(view
        .events()
        .contains(&Event::Background(FALLBACK_IMAGE.into(), ConditionBucket::Rain)));
    // An empty forecast payload leaves the slots alone.
    assert!(!view.events().iter().any(|e| matches!(e, Event::Forecast { .. })));
}

#[tokio::test]
async fn empty_forecast_keeps_previous_days() {
    let provider = FakeProvider::default()
        .with("Seattle", Some(seattle_current()), Some(week_forecast()))
        .with("Nowhere", Some(seattle_current()), Some(json!({"list": []})));
    let (dashboard, view) = build(
        provider,
        FakeImages::default(),
        Box::new(MemoryPreferenceStore::default()),
    );

    dashboard.search(Some("Seattle"), "").await;
    let outcome = dashboard.search(Some("Nowhere"), "").await;

    assert!(matches!(outcome, SearchOutcome::Rendered { ref city, .. } if city == "Nowhere"));
    let forecasts = |events: &[Event]| {
        events
            .iter()
            .filter(|e| matches!(e, Event::Forecast { .. }))
            .count()
    };
    assert_eq!(forecasts(&view.events()), 1);

    // A unit switch redraws the days that are still on screen.
    dashboard.set_unit(UnitPreference::Fahrenheit);
    let events = view.events();
    assert_eq!(forecasts(&events), 2);
    let Some(Event::Forecast { dates, .. }) = events.last() else {
        panic!("expected a forecast redraw, got {events:?}");
    };
    assert_eq!(dates[0], "2024-01-02");
}

#[tokio::test(start_paused = true)]
async fn stale_response_is_discarded() {
    let provider = FakeProvider::default()
        .with("Slowtown", Some(seattle_current()), Some(week_forecast()))
        .with("Fastville", Some(seattle_current()), Some(week_forecast()))
        .delayed("Slowtown", Duration::from_millis(500));
    let (dashboard, view) = build(
        provider,
        FakeImages::default(),
        Box::new(MemoryPreferenceStore::default()),
    );

    let (slow, fast) = tokio::join!(dashboard.search(Some("Slowtown"), ""), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        dashboard.search(Some("Fastville"), "").await
    });

    assert_eq!(slow, SearchOutcome::Superseded);
    assert!(matches!(fast, SearchOutcome::Rendered { ref city, .. } if city == "Fastville"));

    let events = view.events();
    assert!(events.contains(&Event::Loading("Slowtown".into())));
    assert!(!events
        .iter()
        .any(|e| matches!(e, Event::Current { city, .. } if city == "Slowtown")));
    assert_eq!(dashboard.last_city(), "Fastville");
}
