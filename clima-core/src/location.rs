//! One-shot location acquisition.
//!
//! A [`LocationSource`] pushes [`LocationEvent`]s over a channel once updates
//! are started. [`GeoLocator::request_once`] consumes them until it sees one
//! usable fix, then stops the source.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{error::LocationError, model::Coordinate};

/// Best-effort accuracy asked of the source, in meters.
pub const DEFAULT_DESIRED_ACCURACY_M: f64 = 100.0;

const IP_API_URL: &str = "http://ip-api.com/json/";

/// IP geolocation is city-level at best.
const IP_ACCURACY_M: f64 = 5_000.0;

/// A single reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub coordinate: Coordinate,
    /// Radius of uncertainty in meters. Non-positive means invalid.
    pub horizontal_accuracy: f64,
}

impl Fix {
    pub fn new(coordinate: Coordinate, horizontal_accuracy: f64) -> Self {
        Self {
            coordinate,
            horizontal_accuracy,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.horizontal_accuracy > 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    /// One or more fixes, oldest first.
    Updated(Vec<Fix>),
    Failed(LocationError),
}

/// Answer to the "allow location" question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

impl From<bool> for Permission {
    fn from(allowed: bool) -> Self {
        if allowed {
            Permission::Granted
        } else {
            Permission::Denied
        }
    }
}

#[async_trait]
pub trait LocationSource: Send {
    async fn request_authorization(&mut self) -> Result<(), LocationError>;

    /// Begin delivering events. The channel closes when the source has
    /// nothing more to say.
    fn start_updates(&mut self, desired_accuracy_m: f64) -> mpsc::UnboundedReceiver<LocationEvent>;

    fn stop_updates(&mut self);
}

#[async_trait]
impl<S: LocationSource + ?Sized> LocationSource for Box<S> {
    async fn request_authorization(&mut self) -> Result<(), LocationError> {
        (**self).request_authorization().await
    }

    fn start_updates(&mut self, desired_accuracy_m: f64) -> mpsc::UnboundedReceiver<LocationEvent> {
        (**self).start_updates(desired_accuracy_m)
    }

    fn stop_updates(&mut self) {
        (**self).stop_updates()
    }
}

#[derive(Debug)]
pub struct GeoLocator<S> {
    source: S,
    desired_accuracy_m: f64,
}

impl<S: LocationSource> GeoLocator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            desired_accuracy_m: DEFAULT_DESIRED_ACCURACY_M,
        }
    }

    pub fn with_desired_accuracy(mut self, meters: f64) -> Self {
        self.desired_accuracy_m = meters;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Wait for the first valid fix.
    ///
    /// Returns `Ok(None)` when the source runs dry without one.
    pub async fn request_once(&mut self) -> Result<Option<Coordinate>, LocationError> {
        self.source.request_authorization().await?;

        let mut rx = self.source.start_updates(self.desired_accuracy_m);

        while let Some(first) = rx.recv().await {
            // Anything already queued is newer than `first`.
            let mut latest = first;
            while let Ok(next) = rx.try_recv() {
                debug!("superseding queued location event");
                latest = next;
            }

            match latest {
                LocationEvent::Updated(fixes) => {
                    let Some(fix) = fixes.last() else {
                        continue;
                    };

                    if !fix.is_valid() {
                        debug!(
                            accuracy = fix.horizontal_accuracy,
                            "discarding fix with non-positive accuracy"
                        );
                        continue;
                    }

                    self.source.stop_updates();
                    info!(
                        lat = fix.coordinate.latitude,
                        lon = fix.coordinate.longitude,
                        accuracy = fix.horizontal_accuracy,
                        "location fix accepted"
                    );
                    return Ok(Some(fix.coordinate));
                }
                LocationEvent::Failed(err) => {
                    self.source.stop_updates();
                    warn!(error = %err, "location request failed");
                    return Err(err);
                }
            }
        }

        debug!("location source closed without a valid fix");
        Ok(None)
    }
}

/// Reports one fixed coordinate, e.g. from config or the command line.
#[derive(Debug, Clone)]
pub struct StaticLocationSource {
    fix: Fix,
    stopped: bool,
}

impl StaticLocationSource {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            fix: Fix::new(coordinate, 1.0),
            stopped: false,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

#[async_trait]
impl LocationSource for StaticLocationSource {
    async fn request_authorization(&mut self) -> Result<(), LocationError> {
        Ok(())
    }

    fn start_updates(&mut self, _: f64) -> mpsc::UnboundedReceiver<LocationEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(LocationEvent::Updated(vec![self.fix]));
        rx
    }

    fn stop_updates(&mut self) {
        self.stopped = true;
    }
}

/// Approximate location from the public IP address.
#[derive(Debug)]
pub struct IpLocationSource {
    http: Client,
    url: String,
    permission: Permission,
    task: Option<JoinHandle<()>>,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpLocationSource {
    pub fn new(permission: Permission) -> Self {
        Self::with_url(IP_API_URL, permission)
    }

    pub fn with_url(url: impl Into<String>, permission: Permission) -> Self {
        Self {
            http: Client::new(),
            url: url.into(),
            permission,
            task: None,
        }
    }
}

async fn lookup_ip_location(http: Client, url: String) -> LocationEvent {
    let res = match http
        .get(&url)
        .query(&[("fields", "status,message,lat,lon")])
        .send()
        .await
    {
        Ok(res) => res,
        Err(e) => return LocationEvent::Failed(LocationError::Unavailable(e.to_string())),
    };

    let parsed: IpApiResponse = match res.json().await {
        Ok(parsed) => parsed,
        Err(e) => {
            return LocationEvent::Failed(LocationError::Unavailable(format!(
                "unreadable geolocation response: {e}"
            )));
        }
    };

    match parsed {
        IpApiResponse {
            status,
            lat: Some(lat),
            lon: Some(lon),
            ..
        } if status == "success" => {
            let fix = Fix::new(Coordinate::new(lat, lon), IP_ACCURACY_M);
            LocationEvent::Updated(vec![fix])
        }
        IpApiResponse { message, .. } => {
            let reason = message.unwrap_or_else(|| "geolocation lookup failed".to_string());
            LocationEvent::Failed(LocationError::Unavailable(reason))
        }
    }
}

#[async_trait]
impl LocationSource for IpLocationSource {
    async fn request_authorization(&mut self) -> Result<(), LocationError> {
        match self.permission {
            Permission::Granted => Ok(()),
            Permission::Denied => Err(LocationError::PermissionDenied),
        }
    }

    fn start_updates(&mut self, desired_accuracy_m: f64) -> mpsc::UnboundedReceiver<LocationEvent> {
        if desired_accuracy_m < IP_ACCURACY_M {
            debug!(
                desired_accuracy_m,
                "IP geolocation cannot meet desired accuracy; using it anyway"
            );
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let http = self.http.clone();
        let url = self.url.clone();

        self.task = Some(tokio::spawn(async move {
            let event = lookup_ip_location(http, url).await;
            let _ = tx.send(event);
        }));

        rx
    }

    fn stop_updates(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
