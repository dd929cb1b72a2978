use crate::Config;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// Failure to obtain a payload from the weather provider.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to reach {endpoint} endpoint: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to parse {endpoint} JSON: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Source of raw weather payloads, queried by city name in metric units.
///
/// Payloads are returned untyped and mapped by [`crate::normalize`], so a
/// provider only has to worry about transport.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, city: &str) -> Result<Value, FetchError>;

    async fn forecast(&self, city: &str) -> Result<Value, FetchError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<OpenWeatherProvider> {
    let api_key = config.api_key.as_deref().filter(|k| !k.trim().is_empty()).ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
                 Hint: run `weather-explorer configure` or set OPENWEATHER_API_KEY."
        )
    })?;

    OpenWeatherProvider::builder(api_key)
        .base_url(&config.api_base_url)
        .timeout(config.request_timeout())
        .build()
}
