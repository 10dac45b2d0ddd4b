use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Condition icons shown next to the temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherIcon {
    Storm,
    Drizzle,
    Rain,
    Snow,
    Fog,
    Clear,
    Clouds,
}

/// Icon used for any condition code outside the known groups.
pub const DEFAULT_ICON: WeatherIcon = WeatherIcon::Clear;

/// OpenWeatherMap condition-code groups, inclusive on both ends.
/// See: https://openweathermap.org/weather-conditions
const ICON_RANGES: &[(RangeInclusive<i64>, WeatherIcon)] = &[
    (200..=232, WeatherIcon::Storm),
    (300..=321, WeatherIcon::Drizzle),
    (500..=531, WeatherIcon::Rain),
    (600..=622, WeatherIcon::Snow),
    (701..=781, WeatherIcon::Fog),
    (800..=800, WeatherIcon::Clear),
    (801..=804, WeatherIcon::Clouds),
];

/// Map a provider condition code to an icon. Never fails.
pub fn icon_for(condition_code: i64) -> WeatherIcon {
    ICON_RANGES
        .iter()
        .find(|(range, _)| range.contains(&condition_code))
        .map(|(_, icon)| *icon)
        .unwrap_or(DEFAULT_ICON)
}

impl WeatherIcon {
    /// Stable asset name, also used in JSON output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Storm => "storm",
            Self::Drizzle => "drizzle",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Fog => "fog",
            Self::Clear => "clear",
            Self::Clouds => "clouds",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Storm => "Thunderstorm",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Fog => "Fog",
            Self::Clear => "Clear",
            Self::Clouds => "Clouds",
        }
    }

    /// Single-glyph rendering for terminals.
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Storm => "⛈",
            Self::Drizzle => "🌦",
            Self::Rain => "🌧",
            Self::Snow => "❄",
            Self::Fog => "🌫",
            Self::Clear => "☀",
            Self::Clouds => "☁",
        }
    }
}

impl std::fmt::Display for WeatherIcon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
