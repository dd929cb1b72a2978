//! Display-side unit handling.
//!
//! Stored records are always metric; these helpers only produce strings.
//! Rounding is `f64::round`, i.e. halves round away from zero
//! (`2.5 -> 3`, `-2.5 -> -3`).

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub const TEMPERATURE_PLACEHOLDER: &str = "--°";
pub const PLACEHOLDER: &str = "--";

const MPS_TO_MPH: f64 = 2.23694;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnitPreference {
    #[default]
    #[serde(rename = "C")]
    Celsius,
    #[serde(rename = "F")]
    Fahrenheit,
}

impl UnitPreference {
    /// Persisted form: `"C"` or `"F"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitPreference::Celsius => "C",
            UnitPreference::Fahrenheit => "F",
        }
    }
}

impl fmt::Display for UnitPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown unit '{0}'. Expected one of: C, F, celsius, fahrenheit.")]
pub struct UnitParseError(String);

impl FromStr for UnitPreference {
    type Err = UnitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "c" | "celsius" => Ok(UnitPreference::Celsius),
            "f" | "fahrenheit" => Ok(UnitPreference::Fahrenheit),
            _ => Err(UnitParseError(s.to_string())),
        }
    }
}

pub fn to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Rounded temperature with a degree marker, e.g. `"15°"`.
pub fn format_temperature(celsius: Option<f64>, unit: UnitPreference) -> String {
    let Some(c) = finite(celsius) else {
        return TEMPERATURE_PLACEHOLDER.to_string();
    };

    let value = match unit {
        UnitPreference::Celsius => c,
        UnitPreference::Fahrenheit => to_fahrenheit(c),
    };

    format!("{}°", value.round() as i64)
}

/// Wind speed in the unit paired with the temperature preference.
pub fn format_wind(speed_ms: Option<f64>, unit: UnitPreference) -> String {
    let Some(speed) = finite(speed_ms) else {
        return PLACEHOLDER.to_string();
    };

    match unit {
        UnitPreference::Fahrenheit => format!("{} mph", (speed * MPS_TO_MPH).round() as i64),
        UnitPreference::Celsius => format!("{} m/s", speed.round() as i64),
    }
}

/// Percentages are shown as delivered, without rounding.
pub fn format_percent(value: Option<f64>) -> String {
    match finite(value) {
        Some(v) => format!("{v}%"),
        None => format!("{PLACEHOLDER}%"),
    }
}

/// Local wall-clock time for a unix timestamp, 12-hour with AM/PM.
pub fn format_clock_time(epoch_secs: Option<f64>) -> String {
    finite(epoch_secs)
        .and_then(|secs| Local.timestamp_opt(secs as i64, 0).single())
        .map(|dt| dt.format("%I:%M %p").to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fahrenheit_is_affine() {
        assert_eq!(to_fahrenheit(0.0), 32.0);
        assert_eq!(to_fahrenheit(100.0), 212.0);
        assert_eq!(to_fahrenheit(-40.0), -40.0);
        assert!((to_fahrenheit(15.0) - (1.8 * 15.0 + 32.0)).abs() < 1e-9);
    }

    #[test]
    fn celsius_fahrenheit_roundtrip() {
        for c in [-30.5, -1.0, 0.0, 12.3, 36.6, 48.0] {
            assert!((to_celsius(to_fahrenheit(c)) - c).abs() < 1e-9);
        }
    }

    #[test]
    fn temperature_placeholder_for_missing_or_nan() {
        assert_eq!(format_temperature(None, UnitPreference::Celsius), "--°");
        assert_eq!(format_temperature(Some(f64::NAN), UnitPreference::Fahrenheit), "--°");
        assert_eq!(format_temperature(Some(f64::INFINITY), UnitPreference::Celsius), "--°");
    }

    #[test]
    fn temperature_in_both_units() {
        assert_eq!(format_temperature(Some(15.0), UnitPreference::Celsius), "15°");
        assert_eq!(format_temperature(Some(15.0), UnitPreference::Fahrenheit), "59°");
        assert_eq!(format_temperature(Some(-3.4), UnitPreference::Celsius), "-3°");
        assert_eq!(format_temperature(Some(-0.4), UnitPreference::Celsius), "0°");
    }

    #[test]
    fn halves_round_away_from_zero() {
        assert_eq!(format_temperature(Some(2.5), UnitPreference::Celsius), "3°");
        assert_eq!(format_temperature(Some(-2.5), UnitPreference::Celsius), "-3°");
    }

    #[test]
    fn wind_formats_per_unit() {
        assert_eq!(format_wind(Some(4.2), UnitPreference::Celsius), "4 m/s");
        // 10 m/s * 2.23694 = 22.3694
        assert_eq!(format_wind(Some(10.0), UnitPreference::Fahrenheit), "22 mph");
        assert_eq!(format_wind(None, UnitPreference::Fahrenheit), "--");
    }

    #[test]
    fn percent_placeholder() {
        assert_eq!(format_percent(Some(70.0)), "70%");
        assert_eq!(format_percent(None), "--%");
    }

    #[test]
    fn clock_time_placeholder() {
        assert_eq!(format_clock_time(None), "--");
        let formatted = format_clock_time(Some(1_700_000_000.0));
        assert!(formatted.ends_with("AM") || formatted.ends_with("PM"));
    }

    #[test]
    fn unit_parsing() {
        assert_eq!("c".parse::<UnitPreference>().unwrap(), UnitPreference::Celsius);
        assert_eq!("F".parse::<UnitPreference>().unwrap(), UnitPreference::Fahrenheit);
        assert_eq!(" Fahrenheit ".parse::<UnitPreference>().unwrap(), UnitPreference::Fahrenheit);

        let err = "kelvin".parse::<UnitPreference>().unwrap_err();
        assert!(err.to_string().contains("Unknown unit 'kelvin'"));
    }

    #[test]
    fn unit_persisted_form_roundtrip() {
        for unit in [UnitPreference::Celsius, UnitPreference::Fahrenheit] {
            assert_eq!(unit.as_str().parse::<UnitPreference>().unwrap(), unit);
        }
    }
}
