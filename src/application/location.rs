use crate::domain::models::{
    ActiveZone, CUSTOM_COORDINATE_NAME, Coordinates, LocationState, NamedFix,
};
use crate::infrastructure::error::LocationError;
use crate::infrastructure::geocoding_client::GeocodingClient;
use crate::infrastructure::location_provider::{
    AuthorizationStatus, DeviceLocationProvider, LocationObserver,
};
use crate::infrastructure::logging::{EventSink, NullSink};
use crate::infrastructure::manual_location_repository::{
    ManualLocationRecord, ManualLocationRepository,
};
use crate::infrastructure::timezone_locator::TimeZoneLocator;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq)]
pub enum LocationStatus {
    Initializing,
    Resolving,
    PermissionNeeded,
    Denied,
    Unavailable,
    Ready { name: String },
}

impl LocationStatus {
    pub fn message(&self) -> String {
        match self {
            LocationStatus::Initializing => "Preparing prayer schedule...".to_string(),
            LocationStatus::Resolving => "Fetching location...".to_string(),
            LocationStatus::PermissionNeeded => "Location access needed.".to_string(),
            LocationStatus::Denied => "Location access denied.".to_string(),
            LocationStatus::Unavailable => "Unable to determine location.".to_string(),
            LocationStatus::Ready { name } => name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationSnapshot {
    pub status: LocationStatus,
    pub fix: Option<NamedFix>,
    pub zone: ActiveZone,
}

impl Default for LocationSnapshot {
    fn default() -> Self {
        Self {
            status: LocationStatus::Initializing,
            fix: None,
            zone: ActiveZone::Local,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Automatic,
    Manual,
}

#[derive(Debug)]
struct ResolverState {
    source: Source,
    automatic_cache: Option<NamedFix>,
    manual_fix: Option<NamedFix>,
}

fn placeholder_name(coordinates: Coordinates) -> String {
    format!(
        "Coord: {:.2}, {:.2}",
        coordinates.latitude, coordinates.longitude
    )
}

// Owns the active location source. Only this component mutates location
// state; everything downstream consumes snapshots from the watch channel.
pub struct LocationResolver<G, R, Z, P>
where
    G: GeocodingClient + 'static,
    R: ManualLocationRepository + 'static,
    Z: TimeZoneLocator,
    P: DeviceLocationProvider,
{
    geocoder: Arc<G>,
    repository: Arc<R>,
    zone_locator: Arc<Z>,
    provider: Arc<P>,
    event_sink: Arc<dyn EventSink>,
    state: Arc<Mutex<ResolverState>>,
    updates: Arc<watch::Sender<LocationSnapshot>>,
}

impl<G, R, Z, P> LocationResolver<G, R, Z, P>
where
    G: GeocodingClient + 'static,
    R: ManualLocationRepository + 'static,
    Z: TimeZoneLocator,
    P: DeviceLocationProvider,
{
    pub fn new(
        geocoder: Arc<G>,
        repository: Arc<R>,
        zone_locator: Arc<Z>,
        provider: Arc<P>,
    ) -> Self {
        Self {
            geocoder,
            repository,
            zone_locator,
            provider,
            event_sink: Arc::new(NullSink),
            state: Arc::new(Mutex::new(ResolverState {
                source: Source::Automatic,
                automatic_cache: None,
                manual_fix: None,
            })),
            updates: Arc::new(watch::Sender::new(LocationSnapshot::default())),
        }
    }

    pub fn with_event_sink(mut self, event_sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<LocationSnapshot> {
        self.updates.subscribe()
    }

    pub fn current_time_zone(&self) -> ActiveZone {
        self.updates.borrow().zone
    }

    pub fn location_state(&self) -> LocationState {
        let state = self.lock_state();
        match state.source {
            Source::Automatic => LocationState::Automatic {
                cache: state.automatic_cache.clone(),
            },
            Source::Manual => match state.manual_fix.clone() {
                Some(fix) => LocationState::Manual { fix },
                None => LocationState::Automatic {
                    cache: state.automatic_cache.clone(),
                },
            },
        }
    }

    pub fn start(&self) {
        match self.repository.load() {
            Ok(Some(record)) => self.enter_manual(record),
            Ok(None) => self.resolve_automatically(),
            Err(error) => {
                // A malformed record falls back to automatic resolution.
                self.event_sink.error("location", &error.to_string());
                self.resolve_automatically();
            }
        }
    }

    pub fn use_automatic(&self) {
        if let Err(error) = self.repository.clear() {
            self.event_sink.error("location", &error.to_string());
        }
        self.resolve_automatically();
    }

    pub fn use_manual(&self) {
        match self.repository.load() {
            Ok(Some(record)) => self.enter_manual(record),
            // No stored record: stay on the automatic source.
            Ok(None) => {}
            Err(error) => {
                self.event_sink.error("location", &error.to_string());
            }
        }
    }

    pub fn set_manual(&self, name: &str, coordinates: Coordinates) {
        let name = name.trim();
        let name = if name.is_empty() {
            placeholder_name(coordinates)
        } else {
            name.to_string()
        };

        let record = ManualLocationRecord {
            name: name.clone(),
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
        };
        if let Err(error) = self.repository.save(&record) {
            self.event_sink.error("location", &error.to_string());
        }

        let fix = NamedFix {
            name: name.clone(),
            coordinates,
        };
        {
            let mut state = self.lock_state();
            state.source = Source::Manual;
            state.manual_fix = Some(fix.clone());
        }
        let zone = self.zone_for(coordinates);
        self.publish(LocationStatus::Ready { name: name.clone() }, Some(fix), zone);

        if name == CUSTOM_COORDINATE_NAME {
            self.spawn_manual_rename(coordinates);
        }
    }

    pub fn request_permission(&self) {
        if self.provider.authorization_status() == AuthorizationStatus::NotDetermined {
            self.provider.request_permission();
        }
    }

    fn enter_manual(&self, record: ManualLocationRecord) {
        let fix = NamedFix {
            name: record.name.clone(),
            coordinates: record.coordinates(),
        };
        {
            let mut state = self.lock_state();
            state.source = Source::Manual;
            state.manual_fix = Some(fix.clone());
        }
        let zone = self.zone_for(fix.coordinates);
        self.publish(
            LocationStatus::Ready { name: record.name },
            Some(fix),
            zone,
        );
    }

    fn resolve_automatically(&self) {
        let cache = {
            let mut state = self.lock_state();
            state.source = Source::Automatic;
            state.automatic_cache.clone()
        };
        match cache {
            Some(fix) => {
                // Cache hit restores the last automatic fix without touching
                // the device.
                let zone = self.zone_for(fix.coordinates);
                self.publish(
                    LocationStatus::Ready {
                        name: fix.name.clone(),
                    },
                    Some(fix),
                    zone,
                );
            }
            None => self.handle_authorization(self.provider.authorization_status()),
        }
    }

    fn handle_authorization(&self, status: AuthorizationStatus) {
        match status {
            AuthorizationStatus::Authorized => {
                self.updates.send_modify(|snapshot| {
                    snapshot.status = LocationStatus::Resolving;
                });
                self.provider.request_fix();
            }
            AuthorizationStatus::Denied | AuthorizationStatus::Restricted => {
                // Denied clears the displayed schedule downstream.
                self.event_sink
                    .error("location", &LocationError::PermissionDenied.to_string());
                self.publish(LocationStatus::Denied, None, ActiveZone::Local);
            }
            AuthorizationStatus::NotDetermined => {
                self.publish(LocationStatus::PermissionNeeded, None, ActiveZone::Local);
            }
        }
    }

    fn zone_for(&self, coordinates: Coordinates) -> ActiveZone {
        self.zone_locator
            .zone_for(coordinates)
            .map(ActiveZone::Named)
            .unwrap_or(ActiveZone::Local)
    }

    fn publish(&self, status: LocationStatus, fix: Option<NamedFix>, zone: ActiveZone) {
        self.updates
            .send_replace(LocationSnapshot { status, fix, zone });
    }

    fn lock_state(&self) -> MutexGuard<'_, ResolverState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // Best-effort naming of a committed coordinate pair. Updates the stored
    // record and the displayed name only; the coordinates are unchanged, so
    // downstream recomputation is not re-triggered.
    fn spawn_manual_rename(&self, coordinates: Coordinates) {
        let geocoder = Arc::clone(&self.geocoder);
        let repository = Arc::clone(&self.repository);
        let state = Arc::clone(&self.state);
        let updates = Arc::clone(&self.updates);
        let event_sink = Arc::clone(&self.event_sink);

        tokio::spawn(async move {
            let resolved = match geocoder.reverse(coordinates).await {
                Ok(Some(name)) => name,
                Ok(None) => {
                    // The placeholder name stays; the commit itself already
                    // went through.
                    event_sink.info(
                        "location",
                        &LocationError::ReverseGeocodeMiss.to_string(),
                    );
                    return;
                }
                Err(error) => {
                    event_sink.error("location", &error.to_string());
                    return;
                }
            };

            {
                let mut state = state
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                let still_current = state.source == Source::Manual
                    && state.manual_fix.as_ref().is_some_and(|fix| {
                        fix.coordinates.rounded_key() == coordinates.rounded_key()
                    });
                if !still_current {
                    return;
                }
                state.manual_fix = Some(NamedFix {
                    name: resolved.clone(),
                    coordinates,
                });
            }

            let record = ManualLocationRecord {
                name: resolved.clone(),
                latitude: coordinates.latitude,
                longitude: coordinates.longitude,
            };
            if let Err(error) = repository.save(&record) {
                event_sink.error("location", &error.to_string());
            }
            updates.send_modify(|snapshot| {
                if let Some(fix) = snapshot.fix.as_mut() {
                    fix.name = resolved.clone();
                }
                snapshot.status = LocationStatus::Ready { name: resolved };
            });
        });
    }

    fn spawn_fix_naming(&self, coordinates: Coordinates) {
        let geocoder = Arc::clone(&self.geocoder);
        let state = Arc::clone(&self.state);
        let updates = Arc::clone(&self.updates);
        let event_sink = Arc::clone(&self.event_sink);

        tokio::spawn(async move {
            let resolved = match geocoder.reverse(coordinates).await {
                Ok(Some(name)) => name,
                Ok(None) => return,
                Err(error) => {
                    event_sink.error("location", &error.to_string());
                    return;
                }
            };

            let still_automatic = {
                let mut state = state
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                let cached = state.automatic_cache.as_ref().is_some_and(|fix| {
                    fix.coordinates.rounded_key() == coordinates.rounded_key()
                });
                if cached {
                    state.automatic_cache = Some(NamedFix {
                        name: resolved.clone(),
                        coordinates,
                    });
                }
                cached && state.source == Source::Automatic
            };

            if still_automatic {
                updates.send_modify(|snapshot| {
                    if let Some(fix) = snapshot.fix.as_mut() {
                        fix.name = resolved.clone();
                    }
                    snapshot.status = LocationStatus::Ready { name: resolved };
                });
            }
        });
    }
}

impl<G, R, Z, P> LocationObserver for LocationResolver<G, R, Z, P>
where
    G: GeocodingClient + 'static,
    R: ManualLocationRepository + 'static,
    Z: TimeZoneLocator,
    P: DeviceLocationProvider,
{
    fn on_fix(&self, coordinates: Coordinates) {
        let fix = NamedFix {
            name: placeholder_name(coordinates),
            coordinates,
        };
        let in_automatic = {
            let mut state = self.lock_state();
            state.automatic_cache = Some(fix.clone());
            state.source == Source::Automatic
        };

        if in_automatic {
            let zone = self.zone_for(coordinates);
            self.publish(
                LocationStatus::Ready {
                    name: fix.name.clone(),
                },
                Some(fix),
                zone,
            );
        }
        self.spawn_fix_naming(coordinates);
    }

    fn on_failure(&self, reason: &str) {
        self.event_sink.error(
            "location",
            &LocationError::Unavailable(reason.to_string()).to_string(),
        );
        self.updates.send_modify(|snapshot| {
            snapshot.status = LocationStatus::Unavailable;
        });
    }

    fn on_authorization_changed(&self, status: AuthorizationStatus) {
        // Authorization churn is irrelevant while a manual location is active.
        if self.lock_state().source == Source::Manual {
            return;
        }
        self.handle_authorization(status);
    }
}
