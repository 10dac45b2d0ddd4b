//! Turns the current record into the strings shown on screen.

use serde::Serialize;

use crate::{
    error::Failure,
    icon::WeatherIcon,
    model::{TemperatureUnit, WeatherRecord},
};

const KELVIN_OFFSET: f64 = 273.15;

/// Everything the screen displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub city: String,
    pub temperature: Option<String>,
    pub icon: Option<WeatherIcon>,
}

impl View {
    /// Screen before any record has been fetched.
    pub fn placeholder(failure: Option<Failure>) -> Self {
        Self {
            city: failure
                .unwrap_or(Failure::WeatherUnavailable)
                .label()
                .to_string(),
            temperature: None,
            icon: None,
        }
    }

    /// Replace the city text with a failure label, keeping the rest.
    pub fn with_failure(mut self, failure: Failure) -> Self {
        self.city = failure.label().to_string();
        self
    }
}

/// Format a Kelvin reading in the requested unit.
///
/// Celsius subtracts first and rounds once: 300 K is "27°".
pub fn format_temperature(kelvin: f64, unit: TemperatureUnit) -> String {
    match unit {
        TemperatureUnit::Celsius => format!("{}°", (kelvin - KELVIN_OFFSET).round() as i64),
        TemperatureUnit::Kelvin => format!("{} K", kelvin.round() as i64),
    }
}

pub fn render(record: &WeatherRecord, unit: TemperatureUnit) -> View {
    View {
        city: record.city_name.clone(),
        temperature: Some(format_temperature(record.temperature_kelvin, unit)),
        icon: Some(record.icon()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn celsius_rounds_after_subtracting() {
        assert_eq!(format_temperature(300.0, TemperatureUnit::Celsius), "27°");
        assert_eq!(format_temperature(290.0, TemperatureUnit::Celsius), "17°");
        assert_eq!(format_temperature(273.15, TemperatureUnit::Celsius), "0°");
    }

    #[test]
    fn celsius_below_zero() {
        assert_eq!(format_temperature(263.0, TemperatureUnit::Celsius), "-10°");
        // -0.35 rounds to zero without a sign
        assert_eq!(format_temperature(272.8, TemperatureUnit::Celsius), "0°");
    }

    #[test]
    fn kelvin_shows_integer_with_suffix() {
        assert_eq!(format_temperature(300.0, TemperatureUnit::Kelvin), "300 K");
        assert_eq!(format_temperature(289.6, TemperatureUnit::Kelvin), "290 K");
    }

    #[test]
    fn render_uses_city_and_icon() {
        let record = WeatherRecord::new(290.0, "Paris", 800);
        let view = render(&record, TemperatureUnit::Celsius);

        assert_eq!(view.city, "Paris");
        assert_eq!(view.temperature.as_deref(), Some("17°"));
        assert_eq!(view.icon, Some(WeatherIcon::Clear));
    }

    #[test]
    fn degraded_record_renders_with_defaults() {
        let record = WeatherRecord::new(300.0, "", 0);
        let view = render(&record, TemperatureUnit::Kelvin);

        assert_eq!(view.city, "");
        assert_eq!(view.temperature.as_deref(), Some("300 K"));
        assert_eq!(view.icon, Some(WeatherIcon::Clear));
    }

    #[test]
    fn placeholder_defaults_to_weather_unavailable() {
        let view = View::placeholder(None);
        assert_eq!(view.city, "Weather unavailable");
        assert!(view.temperature.is_none());
        assert!(view.icon.is_none());

        let view = View::placeholder(Some(Failure::LocationUnavailable));
        assert_eq!(view.city, "Location unavailable");
    }

    #[test]
    fn failure_label_keeps_last_temperature() {
        let record = WeatherRecord::new(300.0, "Berlin", 500);
        let view = render(&record, TemperatureUnit::Celsius);
        let view = view.with_failure(Failure::ConnectionIssues);

        assert_eq!(view.city, "Connection issues");
        assert_eq!(view.temperature.as_deref(), Some("27°"));
        assert_eq!(view.icon, Some(WeatherIcon::Rain));
    }

    #[test]
    fn view_serializes_for_json_output() {
        let record = WeatherRecord::new(290.0, "Paris", 803);
        let view = render(&record, TemperatureUnit::Celsius);
        let json = serde_json::to_value(view).unwrap();

        assert_eq!(json["city"], "Paris");
        assert_eq!(json["temperature"], "17°");
        assert_eq!(json["icon"], "clouds");
    }
}
