//! Maps raw OpenWeather payloads onto [`WeatherRecord`].
//!
//! Payloads are walked as `serde_json::Value` rather than typed structs so a
//! missing object or an oddly typed field degrades to `None` instead of
//! failing the whole parse.

use serde_json::Value;

use crate::model::{ForecastSample, WeatherRecord};

/// Numeric coercion used for every payload field.
///
/// Numbers pass through; strings are accepted when they parse to a finite
/// float after trimming. Everything else, including `null`, booleans and
/// the empty string, becomes `None`.
pub fn to_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn field<'a>(obj: &'a Value, key: &str) -> &'a Value {
    obj.get(key).unwrap_or(&Value::Null)
}

fn number_at(obj: &Value, key: &str) -> Option<f64> {
    to_number(field(obj, key))
}

fn text_at(obj: &Value, key: &str) -> String {
    field(obj, key).as_str().unwrap_or_default().to_string()
}

/// Normalize a single observation (current weather or one forecast entry).
pub fn normalize_current(raw: &Value) -> WeatherRecord {
    let main = field(raw, "main");
    let wind = field(raw, "wind");
    let clouds = field(raw, "clouds");
    let sys = field(raw, "sys");
    let weather0 = field(raw, "weather").get(0).unwrap_or(&Value::Null);

    WeatherRecord {
        temperature: number_at(main, "temp"),
        feels_like: number_at(main, "feels_like"),
        min_temperature: number_at(main, "temp_min"),
        max_temperature: number_at(main, "temp_max"),
        humidity_pct: number_at(main, "humidity"),
        wind_speed_ms: number_at(wind, "speed"),
        cloud_pct: number_at(clouds, "all"),
        sunrise_epoch_sec: number_at(sys, "sunrise"),
        sunset_epoch_sec: number_at(sys, "sunset"),
        description: text_at(weather0, "description"),
        condition_main: text_at(weather0, "main"),
    }
}

/// Normalize the `list` array of a 5-day/3-hour forecast payload.
pub fn normalize_forecast(raw: &Value) -> Vec<ForecastSample> {
    let Some(list) = field(raw, "list").as_array() else {
        return Vec::new();
    };

    list.iter()
        .map(|item| ForecastSample {
            timestamp: text_at(item, "dt_txt"),
            record: normalize_current(item),
        })
        .collect()
}
