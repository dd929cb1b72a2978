use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{FetchError, WeatherProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

const CURRENT_ENDPOINT: &str = "current weather";
const FORECAST_ENDPOINT: &str = "forecast";

/// OpenWeather 2.5 API: `/weather` for the current observation and
/// `/forecast` for 5 days in 3-hour steps. Always requests metric units;
/// conversion happens at display time.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

#[derive(Debug)]
pub struct OpenWeatherBuilder {
    api_key: String,
    base_url: String,
    timeout: Option<Duration>,
}

impl OpenWeatherBuilder {
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> anyhow::Result<OpenWeatherProvider> {
        let mut http = Client::builder();
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        let http = http.build().context("Failed to build HTTP client")?;

        Ok(OpenWeatherProvider {
            api_key: self.api_key,
            base_url: self.base_url,
            http,
        })
    }
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn builder(api_key: &str) -> OpenWeatherBuilder {
        OpenWeatherBuilder {
            api_key: api_key.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    /// Shared client, reused for image probes against the same host setup.
    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn fetch(&self, path: &str, endpoint: &'static str, city: &str) -> Result<Value, FetchError> {
        debug!(city, endpoint, "requesting OpenWeather");

        let res = self
            .http
            .get(self.endpoint_url(path))
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|source| FetchError::Transport { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| FetchError::Transport { endpoint, source })?;

        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint,
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| FetchError::Decode { endpoint, source })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, city: &str) -> Result<Value, FetchError> {
        self.fetch("weather", CURRENT_ENDPOINT, city).await
    }

    async fn forecast(&self, city: &str) -> Result<Value, FetchError> {
        self.fetch("forecast", FORECAST_ENDPOINT, city).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
