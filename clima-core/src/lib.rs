//! Core library for the `clima` weather tool.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - One-shot location acquisition
//! - The OpenWeatherMap provider and response decoding
//! - Condition icons and display formatting
//! - The application state machine tying them together
//!
//! It is used by `clima-cli`, but can also be reused by other front ends.

pub mod app;
pub mod config;
pub mod error;
pub mod icon;
pub mod location;
pub mod model;
pub mod presenter;
pub mod provider;

pub use app::{App, AppEvent, AppHandle, AppState, CityInputDelegate, Phase};
pub use config::Config;
pub use error::{Failure, LocationError, WeatherError};
pub use icon::{WeatherIcon, icon_for};
pub use location::{GeoLocator, LocationSource};
pub use model::{Coordinate, TemperatureUnit, WeatherQuery, WeatherRecord};
pub use presenter::View;
pub use provider::WeatherProvider;
