//! Error types for location and weather requests.
//!
//! Every request failure is terminal for that request and ends up as one of
//! the [`Failure`] labels on screen; none of them is retried.

use thiserror::Error;

/// Location acquisition errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

/// Weather fetch errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeatherError {
    /// Transport failure: no connectivity, DNS, timeout, truncated body.
    #[error("Network error: {0}")]
    Network(String),

    /// The body was not JSON or had no numeric `main.temp`.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WeatherError::Network(format!("request timed out: {err}"))
        } else {
            WeatherError::Network(err.to_string())
        }
    }
}

/// What the screen shows in place of the city name after a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    LocationUnavailable,
    ConnectionIssues,
    WeatherUnavailable,
}

impl Failure {
    pub fn label(&self) -> &'static str {
        match self {
            Failure::LocationUnavailable => "Location unavailable",
            Failure::ConnectionIssues => "Connection issues",
            Failure::WeatherUnavailable => "Weather unavailable",
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl From<&LocationError> for Failure {
    fn from(_: &LocationError) -> Self {
        Failure::LocationUnavailable
    }
}

impl From<&WeatherError> for Failure {
    fn from(err: &WeatherError) -> Self {
        match err {
            WeatherError::Network(_) => Failure::ConnectionIssues,
            WeatherError::Parse(_) => Failure::WeatherUnavailable,
        }
    }
}
