use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::icon::{WeatherIcon, icon_for};

/// A captured position. Never changed after it has been read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// What a single fetch asks the provider for.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryTarget {
    Coordinate(Coordinate),
    City(String),
}

/// One weather request, built fresh for every fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherQuery {
    pub target: QueryTarget,
    pub api_key: String,
}

impl WeatherQuery {
    pub fn by_coordinate(coordinate: Coordinate, api_key: impl Into<String>) -> Self {
        Self {
            target: QueryTarget::Coordinate(coordinate),
            api_key: api_key.into(),
        }
    }

    pub fn by_city(city: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            target: QueryTarget::City(city.into()),
            api_key: api_key.into(),
        }
    }

    /// Query-string pairs in the order they are sent.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = match &self.target {
            QueryTarget::Coordinate(c) => vec![
                ("lat", c.latitude.to_string()),
                ("lon", c.longitude.to_string()),
            ],
            QueryTarget::City(city) => vec![("q", city.clone())],
        };
        params.push(("appid", self.api_key.clone()));
        params
    }
}

/// Temperature display unit. Values are always kept in Kelvin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Kelvin,
}

impl TemperatureUnit {
    pub fn toggle(self) -> Self {
        match self {
            Self::Celsius => Self::Kelvin,
            Self::Kelvin => Self::Celsius,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Celsius => "celsius",
            Self::Kelvin => "kelvin",
        }
    }
}

impl std::fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TemperatureUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "celsius" | "c" => Ok(Self::Celsius),
            "kelvin" | "k" => Ok(Self::Kelvin),
            _ => Err(anyhow::anyhow!(
                "Unknown temperature unit '{value}'. Supported units: celsius, kelvin."
            )),
        }
    }
}

/// The currently displayed weather.
///
/// The icon is derived from `condition_code` on demand, so the two cannot
/// drift apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    /// Raw provider reading in Kelvin, unrounded.
    pub temperature_kelvin: f64,
    /// Empty when the provider omitted it.
    pub city_name: String,
    /// Zero when the provider omitted it.
    pub condition_code: i64,
    pub fetched_at: DateTime<Utc>,
}

impl WeatherRecord {
    pub fn new(temperature_kelvin: f64, city_name: impl Into<String>, condition_code: i64) -> Self {
        Self {
            temperature_kelvin,
            city_name: city_name.into(),
            condition_code,
            fetched_at: Utc::now(),
        }
    }

    pub fn icon(&self) -> WeatherIcon {
        icon_for(self.condition_code)
    }
}
