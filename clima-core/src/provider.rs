use crate::{
    Config, WeatherQuery, WeatherRecord, error::WeatherError,
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Issue exactly one request for `query`.
    async fn fetch(&self, query: &WeatherQuery) -> Result<WeatherRecord, WeatherError>;
}

/// Construct the provider described by config.
pub fn provider_from_config(config: &Config) -> Box<dyn WeatherProvider> {
    Box::new(OpenWeatherProvider::from_config(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::openweather::DEFAULT_BASE_URL;

    #[test]
    fn default_config_points_at_openweathermap() {
        let provider = OpenWeatherProvider::from_config(&Config::default());
        assert_eq!(provider.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn configured_base_url_is_used() {
        let cfg = Config {
            base_url: "http://localhost:1/weather".into(),
            ..Config::default()
        };

        let provider = OpenWeatherProvider::from_config(&cfg);
        assert_eq!(provider.base_url(), "http://localhost:1/weather");
    }
}
