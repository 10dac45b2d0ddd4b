//! Application state machine.
//!
//! `AppState` holds the single current record and decides, for every
//! [`AppEvent`], whether a fetch has to be issued. [`App`] drives it from a
//! channel: location results, city submissions and fetch completions all
//! arrive as messages, and the view is re-rendered whenever it changes.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::{
    error::{Failure, LocationError, WeatherError},
    location::{GeoLocator, LocationSource},
    model::{Coordinate, TemperatureUnit, WeatherQuery, WeatherRecord},
    presenter::{View, render},
    provider::WeatherProvider,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    LocatingGps,
    Fetching,
    Displaying,
    ErrorDisplayed(Failure),
}

impl Phase {
    /// Whether no request is outstanding.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Phase::LocatingGps | Phase::Fetching)
    }
}

#[derive(Debug)]
pub enum AppEvent {
    LocationResolved(Result<Option<Coordinate>, LocationError>),
    CityEntered(String),
    FetchCompleted {
        request_id: u64,
        result: Result<WeatherRecord, WeatherError>,
    },
    ToggleUnit,
    Shutdown,
}

/// Side effects requested by the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Fetch {
        request_id: u64,
        query: WeatherQuery,
    },
}

#[derive(Debug, Clone)]
pub struct AppState {
    api_key: String,
    unit: TemperatureUnit,
    phase: Phase,
    current: Option<WeatherRecord>,
    latest_request: u64,
    pending_city: Option<String>,
    location_consumed: bool,
}

impl AppState {
    pub fn new(api_key: impl Into<String>, unit: TemperatureUnit) -> Self {
        Self {
            api_key: api_key.into(),
            unit,
            phase: Phase::Idle,
            current: None,
            latest_request: 0,
            pending_city: None,
            location_consumed: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    pub fn current(&self) -> Option<&WeatherRecord> {
        self.current.as_ref()
    }

    pub fn begin_locating(&mut self) {
        if self.phase == Phase::Idle {
            self.phase = Phase::LocatingGps;
        }
    }

    pub fn handle(&mut self, event: AppEvent) -> Option<Command> {
        match event {
            AppEvent::LocationResolved(result) => self.on_location(result),
            AppEvent::CityEntered(city) => self.on_city(city),
            AppEvent::FetchCompleted { request_id, result } => {
                self.on_fetch_completed(request_id, result);
                None
            }
            AppEvent::ToggleUnit => {
                self.unit = self.unit.toggle();
                debug!(unit = %self.unit, "temperature unit toggled");
                None
            }
            AppEvent::Shutdown => None,
        }
    }

    /// What the screen shows right now.
    pub fn view(&self) -> View {
        let failure = match self.phase {
            Phase::ErrorDisplayed(failure) => Some(failure),
            _ => None,
        };

        match (&self.current, failure) {
            (Some(record), Some(failure)) => render(record, self.unit).with_failure(failure),
            (Some(record), None) => render(record, self.unit),
            (None, failure) => View::placeholder(failure),
        }
    }

    fn on_location(
        &mut self,
        result: Result<Option<Coordinate>, LocationError>,
    ) -> Option<Command> {
        if self.location_consumed {
            debug!("ignoring location result after the first fix");
            return None;
        }

        match result {
            Ok(Some(coordinate)) => {
                self.location_consumed = true;
                let query = WeatherQuery::by_coordinate(coordinate, self.api_key.clone());
                Some(self.issue(query, None))
            }
            Ok(None) => {
                if self.phase == Phase::LocatingGps {
                    self.phase = Phase::Idle;
                }
                None
            }
            Err(err) => {
                debug!(error = %err, "location unavailable");
                if self.phase != Phase::Fetching {
                    self.phase = Phase::ErrorDisplayed(Failure::from(&err));
                }
                None
            }
        }
    }

    fn on_city(&mut self, city: String) -> Option<Command> {
        let city = city.trim().to_string();
        if city.is_empty() {
            return None;
        }

        if self.phase == Phase::Fetching && self.pending_city.as_deref() == Some(city.as_str()) {
            debug!(%city, "ignoring repeated submission while the same city is in flight");
            return None;
        }

        let query = WeatherQuery::by_city(city.clone(), self.api_key.clone());
        Some(self.issue(query, Some(city)))
    }

    fn issue(&mut self, query: WeatherQuery, city: Option<String>) -> Command {
        self.latest_request += 1;
        self.pending_city = city;
        self.phase = Phase::Fetching;
        Command::Fetch {
            request_id: self.latest_request,
            query,
        }
    }

    fn on_fetch_completed(&mut self, request_id: u64, result: Result<WeatherRecord, WeatherError>) {
        if request_id != self.latest_request {
            debug!(
                request_id,
                latest = self.latest_request,
                "discarding stale weather result"
            );
            return;
        }

        self.pending_city = None;
        match result {
            Ok(record) => {
                self.current = Some(record);
                self.phase = Phase::Displaying;
            }
            Err(err) => {
                info!(error = %err, "weather request failed");
                self.phase = Phase::ErrorDisplayed(Failure::from(&err));
            }
        }
    }
}

/// Receives city names typed on the city-entry prompt.
pub trait CityInputDelegate {
    fn on_city_entered(&self, city: String);
}

/// Cloneable sender into a running [`App`].
#[derive(Debug, Clone)]
pub struct AppHandle {
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl AppHandle {
    pub fn toggle_unit(&self) {
        let _ = self.tx.send(AppEvent::ToggleUnit);
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(AppEvent::Shutdown);
    }
}

impl CityInputDelegate for AppHandle {
    fn on_city_entered(&self, city: String) {
        let _ = self.tx.send(AppEvent::CityEntered(city));
    }
}

pub struct App {
    state: AppState,
    provider: Arc<dyn WeatherProvider>,
    tx: mpsc::UnboundedSender<AppEvent>,
    rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    pub fn new(state: AppState, provider: Arc<dyn WeatherProvider>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state,
            provider,
            tx,
            rx,
        }
    }

    pub fn handle(&self) -> AppHandle {
        AppHandle {
            tx: self.tx.clone(),
        }
    }

    /// Run until [`AppHandle::shutdown`] is called.
    ///
    /// When a locator is given it is asked for a single fix in the
    /// background. `on_render` sees the initial view, every change, and the
    /// view again whenever a request settles, so callers can tell a finished
    /// request from one still in flight.
    pub async fn run<S, R>(mut self, locator: Option<GeoLocator<S>>, mut on_render: R) -> AppState
    where
        S: LocationSource + 'static,
        R: FnMut(&View),
    {
        if let Some(mut locator) = locator {
            self.state.begin_locating();
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let result = locator.request_once().await;
                let _ = tx.send(AppEvent::LocationResolved(result));
            });
        }

        let mut last_view = self.state.view();
        let mut last_phase = self.state.phase();
        on_render(&last_view);

        while let Some(event) = self.rx.recv().await {
            if matches!(event, AppEvent::Shutdown) {
                break;
            }

            if let Some(command) = self.state.handle(event) {
                self.execute(command);
            }

            let phase = self.state.phase();
            let view = self.state.view();
            let settled = phase != last_phase && phase.is_settled();
            if view != last_view || settled {
                on_render(&view);
                last_view = view;
            }
            last_phase = phase;
        }

        self.state
    }

    fn execute(&self, command: Command) {
        match command {
            Command::Fetch { request_id, query } => {
                let provider = Arc::clone(&self.provider);
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = provider.fetch(&query).await;
                    let _ = tx.send(AppEvent::FetchCompleted { request_id, result });
                });
            }
        }
    }
}

/// Feed one event through the state machine, performing the fetch it asks
/// for inline.
pub async fn fetch_once(
    state: &mut AppState,
    provider: &dyn WeatherProvider,
    event: AppEvent,
) -> View {
    if let Some(Command::Fetch { request_id, query }) = state.handle(event) {
        let result = provider.fetch(&query).await;
        state.handle(AppEvent::FetchCompleted { request_id, result });
    }
    state.view()
}
