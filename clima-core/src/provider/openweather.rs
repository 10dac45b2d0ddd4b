use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    Config,
    error::WeatherError,
    model::{QueryTarget, WeatherQuery, WeatherRecord},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_base_url(config.base_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch(&self, query: &WeatherQuery) -> Result<WeatherRecord, WeatherError> {
        match &query.target {
            QueryTarget::Coordinate(c) => {
                info!(lat = c.latitude, lon = c.longitude, "fetching weather")
            }
            QueryTarget::City(city) => info!(%city, "fetching weather"),
        }

        let res = self
            .http
            .get(&self.base_url)
            .query(&query.query_params())
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        // Error bodies are JSON without `main`, so they fall through to the
        // parse failure below.
        if !status.is_success() {
            warn!(
                %status,
                body = %truncate_body(&body),
                "OpenWeather request was not successful"
            );
        }

        parse_current(&body)
    }
}

/// Decode a current-weather body.
///
/// Only `main.temp` is required; `name` and `weather[0].id` degrade to
/// empty and zero.
pub fn parse_current(body: &str) -> Result<WeatherRecord, WeatherError> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| WeatherError::Parse(format!("response is not JSON: {e}")))?;

    let temperature_kelvin = json
        .pointer("/main/temp")
        .and_then(Value::as_f64)
        .ok_or_else(|| WeatherError::Parse("response has no numeric main.temp".to_string()))?;

    let city_name = json.get("name").and_then(Value::as_str).unwrap_or_default();
    if city_name.is_empty() {
        debug!("response has no city name");
    }

    let condition_code = json
        .pointer("/weather/0/id")
        .and_then(|id| id.as_i64().or_else(|| id.as_f64().map(|f| f as i64)))
        .unwrap_or_else(|| {
            debug!("response has no condition code");
            0
        });

    Ok(WeatherRecord::new(temperature_kelvin, city_name, condition_code))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
