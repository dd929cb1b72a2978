//! Reduces the provider's 3-hour forecast to one entry per calendar day.

use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use rand::Rng;

use crate::model::{ForecastDay, ForecastSample, WeatherRecord};

const MIDDAY_HOUR: i32 = 12;
const SYNTHETIC_BASE_TEMPERATURE: f64 = 20.0;
const SYNTHETIC_BASE_HUMIDITY: f64 = 60.0;
const SYNTHETIC_LABELS: [&str; 5] = ["Today", "Tomorrow", "Day 3", "Day 4", "Day 5"];

/// Split `"YYYY-MM-DD HH:MM:SS"` into its date and hour.
///
/// Returns `None` when either half is missing, the date is not a valid
/// `YYYY-MM-DD`, or the time does not start with an hour in `0..=23`.
fn split_timestamp(timestamp: &str) -> Option<(&str, i32)> {
    let mut parts = timestamp.split(' ');
    let date = parts.next().filter(|d| !d.is_empty())?;
    let time = parts.next().filter(|t| !t.is_empty())?;

    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let hour = time
        .get(..2)
        .and_then(|h| h.parse::<i32>().ok())
        .filter(|h| (0..=23).contains(h))?;

    Some((date, hour))
}

/// Pick one representative sample per date, keep dates on or after
/// `today`, and order them chronologically.
///
/// Within a date the sample closest to 12:00 wins. The comparison is
/// strict, so of two samples equally far from midday the earlier one in
/// input order is kept.
pub fn bucketize(samples: &[ForecastSample], today: NaiveDate) -> Vec<ForecastDay> {
    let mut best: HashMap<&str, (i32, &ForecastSample)> = HashMap::new();

    for sample in samples {
        let Some((date, hour)) = split_timestamp(&sample.timestamp) else {
            continue;
        };
        let score = (hour - MIDDAY_HOUR).abs();

        if best.get(date).is_none_or(|(current, _)| score < *current) {
            best.insert(date, (score, sample));
        }
    }

    let today = today.format("%Y-%m-%d").to_string();

    let mut days: Vec<ForecastDay> = best
        .into_iter()
        .filter(|(date, _)| *date >= today.as_str())
        .map(|(date, (_, sample))| ForecastDay {
            date: date.to_string(),
            label: weekday_label(date),
            representative: sample.record.clone(),
        })
        .collect();

    days.sort_by(|a, b| a.date.cmp(&b.date));
    days
}

/// The local calendar date at the moment of the call.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Short weekday name for an ISO date, or `"Day"` when it does not parse.
pub fn weekday_label(date: &str) -> String {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%a").to_string())
        .unwrap_or_else(|_| "Day".to_string())
}

/// Map ordered days onto a fixed number of display slots.
///
/// Extra days are dropped; with fewer days than slots the tail slots are
/// simply not produced.
pub fn fill_slots(days: &[ForecastDay], slots: usize) -> &[ForecastDay] {
    &days[..days.len().min(slots)]
}

/// Stand-in forecast derived from the current observation, used when the
/// forecast endpoint is unavailable.
///
/// Each slot varies temperature by up to ±4 °C and humidity by up to ±10 %
/// (clamped to 0..=100) around the current values, or around 20 °C / 60 %
/// when those are unknown.
pub fn synthetic_forecast<R: Rng + ?Sized>(
    current: Option<&WeatherRecord>,
    slots: usize,
    rng: &mut R,
) -> Vec<ForecastDay> {
    let base_temp = current
        .and_then(|r| r.temperature)
        .unwrap_or(SYNTHETIC_BASE_TEMPERATURE);
    let base_humidity = current
        .and_then(|r| r.humidity_pct)
        .unwrap_or(SYNTHETIC_BASE_HUMIDITY);

    (0..slots)
        .map(|index| {
            let temp_variation = (rng.r#gen::<f64>() - 0.5) * 8.0;
            let humidity_variation = (rng.r#gen::<f64>() - 0.5) * 20.0;

            let label = SYNTHETIC_LABELS
                .get(index)
                .map(|l| l.to_string())
                .unwrap_or_else(|| format!("Day {}", index + 1));

            ForecastDay {
                date: String::new(),
                label,
                representative: WeatherRecord {
                    temperature: Some(base_temp + temp_variation),
                    humidity_pct: Some((base_humidity + humidity_variation).clamp(0.0, 100.0)),
                    ..WeatherRecord::default()
                },
            }
        })
        .collect()
}
