use crate::domain::models::Coordinates;
use chrono_tz::Tz;

pub trait TimeZoneLocator: Send + Sync {
    fn zone_for(&self, coordinates: Coordinates) -> Option<Tz>;
}

// Resolves nothing, so every lookup falls back to the machine's local zone.
#[derive(Debug, Default)]
pub struct LocalFallbackLocator;

impl TimeZoneLocator for LocalFallbackLocator {
    fn zone_for(&self, _coordinates: Coordinates) -> Option<Tz> {
        None
    }
}
