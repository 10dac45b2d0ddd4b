use std::{
    sync::{Arc, mpsc},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clima_core::{
    App, AppEvent, AppHandle, AppState, CityInputDelegate, Config, Coordinate, GeoLocator,
    LocationSource, TemperatureUnit, View,
    app::fetch_once,
    location::{IpLocationSource, StaticLocationSource},
    provider::provider_from_config,
};
use inquire::{Confirm, InquireError, Select, Text};

use crate::output;

/// Longest wait for a location fix or a weather response before the city
/// prompt comes back.
const REQUEST_WAIT: Duration = Duration::from_secs(15);

/// A unit toggle re-renders straight away, or not at all when nothing is
/// displayed yet.
const TOGGLE_WAIT: Duration = Duration::from_millis(200);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "clima",
    version,
    about = "Current weather for where you are, or any city"
)]
pub struct Cli {
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key, default unit and location preferences.
    Configure,

    /// Fetch and print the current weather once.
    Show {
        /// City name; when absent, your location is used.
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        city: Option<String>,

        /// Latitude to use instead of detecting the location.
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude to use instead of detecting the location.
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Temperature unit: celsius or kelvin.
        #[arg(long, value_parser = parse_unit)]
        unit: Option<TemperatureUnit>,

        /// Print the rendered view as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Locate once, then keep asking for city names.
    Interactive {
        /// Temperature unit to start with: celsius or kelvin.
        #[arg(long, value_parser = parse_unit)]
        unit: Option<TemperatureUnit>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show {
                city,
                lat,
                lon,
                unit,
                json,
            } => {
                let coordinate = lat.zip(lon).map(|(lat, lon)| Coordinate::new(lat, lon));
                show(city, coordinate, unit, json).await
            }
            Command::Interactive { unit } => interactive(unit).await,
        }
    }
}

fn parse_unit(value: &str) -> Result<TemperatureUnit, String> {
    TemperatureUnit::try_from(value).map_err(|e| e.to_string())
}

/// Parse "lat,lon" as typed on the configure prompt.
fn parse_coordinate(value: &str) -> Result<Coordinate> {
    let (lat, lon) = value
        .split_once(',')
        .with_context(|| format!("Expected 'latitude,longitude', got '{value}'"))?;

    let lat: f64 = lat
        .trim()
        .parse()
        .with_context(|| format!("Invalid latitude '{lat}'"))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .with_context(|| format!("Invalid longitude '{lon}'"))?;

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        anyhow::bail!("Coordinate {lat},{lon} is out of range");
    }

    Ok(Coordinate::new(lat, lon))
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let mut key_prompt = Text::new("OpenWeatherMap API key:");
    if let Some(existing) = config.api_key.as_deref() {
        key_prompt = key_prompt.with_default(existing);
    }
    let api_key = key_prompt.prompt()?;
    config.set_api_key(api_key);

    let units = vec![TemperatureUnit::Celsius, TemperatureUnit::Kelvin];
    let start = units.iter().position(|u| *u == config.unit).unwrap_or(0);
    config.unit = Select::new("Default unit:", units)
        .with_starting_cursor(start)
        .prompt()?;

    let current = config
        .location
        .map(|c| format!("{},{}", c.latitude, c.longitude));
    let mut location_prompt = Text::new("Fixed location (latitude,longitude), empty to detect:")
        .with_validator(|input: &str| {
            if input.trim().is_empty() {
                return Ok(inquire::validator::Validation::Valid);
            }
            Ok(match parse_coordinate(input) {
                Ok(_) => inquire::validator::Validation::Valid,
                Err(e) => inquire::validator::Validation::Invalid(e.to_string().into()),
            })
        });
    if let Some(current) = current.as_deref() {
        location_prompt = location_prompt.with_default(current);
    }
    let location = location_prompt.prompt()?;
    config.location = if location.trim().is_empty() {
        None
    } else {
        Some(parse_coordinate(&location)?)
    };

    if config.location.is_none() {
        config.allow_ip_location = Some(ask_location_permission()?);
    }

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

fn ask_location_permission() -> Result<bool> {
    Confirm::new("Allow clima to look up your approximate location from your IP address?")
        .with_default(true)
        .prompt()
        .context("Failed to read location permission")
}

/// Pick the location source: explicit coordinate, configured coordinate, or
/// IP lookup. The IP permission is asked once and remembered.
fn locator(
    config: &mut Config,
    coordinate: Option<Coordinate>,
) -> Result<GeoLocator<Box<dyn LocationSource>>> {
    let source: Box<dyn LocationSource> = match coordinate.or(config.location) {
        Some(coordinate) => Box::new(StaticLocationSource::new(coordinate)),
        None => {
            if config.allow_ip_location.is_none() {
                config.allow_ip_location = Some(ask_location_permission()?);
                config.save()?;
            }
            Box::new(IpLocationSource::new(config.ip_location_permission()))
        }
    };

    let accuracy = config.desired_accuracy_m;
    Ok(GeoLocator::new(source).with_desired_accuracy(accuracy))
}

async fn show(
    city: Option<String>,
    coordinate: Option<Coordinate>,
    unit: Option<TemperatureUnit>,
    json: bool,
) -> Result<()> {
    let mut config = Config::load()?;
    let api_key = config.api_key()?;
    let provider = provider_from_config(&config);
    let mut state = AppState::new(api_key, unit.unwrap_or(config.unit));

    let event = match city {
        Some(city) => AppEvent::CityEntered(city),
        None => {
            let mut locator = locator(&mut config, coordinate)?;
            state.begin_locating();
            AppEvent::LocationResolved(locator.request_once().await)
        }
    };

    let view = fetch_once(&mut state, &*provider, event).await;
    output::print_view(&view, state.current(), json)
}

async fn interactive(unit: Option<TemperatureUnit>) -> Result<()> {
    let mut config = Config::load()?;
    let api_key = config.api_key()?;
    let locator = locator(&mut config, None)?;

    let app = App::new(
        AppState::new(api_key, unit.unwrap_or(config.unit)),
        Arc::from(provider_from_config(&config)),
    );
    let handle = app.handle();

    // Views are printed by the prompt thread, between prompts, so they never
    // land in the middle of a line being edited.
    let (views_tx, views_rx) = mpsc::channel();
    let prompt = tokio::task::spawn_blocking(move || city_prompt(handle, views_rx));
    app.run(Some(locator), move |view| {
        let _ = views_tx.send(view.clone());
    })
    .await;
    prompt.await.context("City prompt task failed")?;

    Ok(())
}

/// The city-entry screen. Runs on a blocking thread, reports back through
/// the handle and prints whatever the app renders in reply.
fn city_prompt(handle: AppHandle, views: mpsc::Receiver<View>) {
    // The initial view, then the one rendered once locating settles.
    if print_pending(&views, REQUEST_WAIT) < 2 {
        print_pending(&views, REQUEST_WAIT);
    }

    loop {
        print_pending(&views, Duration::ZERO);

        let input = Text::new("City:")
            .with_help_message("/unit toggles °/K, /quit exits")
            .prompt();

        match input {
            Ok(line) => match line.trim() {
                "/quit" => break,
                "/unit" => {
                    handle.toggle_unit();
                    print_pending(&views, TOGGLE_WAIT);
                }
                "" => continue,
                city => {
                    handle.on_city_entered(city.to_string());
                    print_pending(&views, REQUEST_WAIT);
                }
            },
            Err(InquireError::OperationCanceled) => break,
            Err(InquireError::OperationInterrupted) => break,
            Err(e) => {
                tracing::warn!(error = %e, "city prompt failed");
                break;
            }
        }
    }

    handle.shutdown();
}

/// Print the views rendered so far, waiting up to `wait` for the first one.
/// Returns how many were printed.
fn print_pending(views: &mpsc::Receiver<View>, wait: Duration) -> usize {
    let Ok(first) = views.recv_timeout(wait) else {
        return 0;
    };

    let mut printed = 0;
    for view in std::iter::once(first).chain(views.try_iter()) {
        output::print_view_line(&view);
        printed += 1;
    }
    printed
}
