use explorer_core::{
    Background, ForecastDay, ForecastSource, UnitPreference, View, WeatherRecord,
    classify::weather_icon,
    units::{format_clock_time, format_percent, format_temperature, format_wind},
};

/// Writes the dashboard to stdout, one block per update.
#[derive(Debug, Default)]
pub struct TerminalView;

/// Uppercase the first character, leave the rest as is.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One-line summary: description, feels-like, humidity and wind.
pub fn summary_line(record: &WeatherRecord, unit: UnitPreference) -> String {
    let mut parts = Vec::new();
    if !record.description.is_empty() {
        parts.push(capitalize(&record.description));
    }
    parts.push(format!(
        "Feels like: {}{unit}",
        format_temperature(record.feels_like, unit)
    ));
    parts.push(format!("Humidity: {}", format_percent(record.humidity_pct)));
    parts.push(format!("Wind: {}", format_wind(record.wind_speed_ms, unit)));
    parts.join(" • ")
}

pub fn forecast_cell(day: &ForecastDay, unit: UnitPreference) -> String {
    let r = &day.representative;
    format!(
        "{:<9} {} {}{unit}",
        day.label,
        weather_icon(r.temperature, r.humidity_pct, &r.description),
        format_temperature(r.temperature, unit),
    )
}

impl View for TerminalView {
    fn show_loading(&self, city: &str) {
        println!("Loading weather for {city}...");
    }

    fn show_error(&self, city: &str, message: &str) {
        println!();
        println!("❌ {city}");
        println!("Error: Failed to load data: {message}");
    }

    fn show_current(&self, city: &str, record: &WeatherRecord, unit: UnitPreference) {
        println!();
        println!(
            "{} {}",
            weather_icon(record.temperature, record.humidity_pct, &record.description),
            capitalize(city)
        );
        println!("{}{unit}", format_temperature(record.temperature, unit));
        println!("{}", summary_line(record, unit));

        if record.min_temperature.is_some() || record.max_temperature.is_some() {
            println!(
                "Min: {}{unit}  Max: {}{unit}",
                format_temperature(record.min_temperature, unit),
                format_temperature(record.max_temperature, unit),
            );
        }
        println!("Clouds: {}", format_percent(record.cloud_pct));
        if record.sunrise_epoch_sec.is_some() || record.sunset_epoch_sec.is_some() {
            println!(
                "Sunrise: {}  Sunset: {}",
                format_clock_time(record.sunrise_epoch_sec),
                format_clock_time(record.sunset_epoch_sec),
            );
        }
        println!("Last updated: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    }

    fn show_forecast(&self, days: &[ForecastDay], source: ForecastSource, unit: UnitPreference) {
        println!();
        match source {
            ForecastSource::Provider => println!("Forecast"),
            ForecastSource::Synthetic => println!("Forecast (estimated)"),
        }
        for day in days {
            println!("  {}", forecast_cell(day, unit));
        }
    }

    fn show_background(&self, background: &Background) {
        println!();
        println!(
            "Background: images/{} over {} ({})",
            background.file,
            background.gradient.to_css(),
            background.bucket,
        );
    }
}
