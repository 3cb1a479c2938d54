use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location fix unavailable: {0}")]
    Unavailable(String),
    #[error("reverse geocode returned no usable place")]
    ReverseGeocodeMiss,
}

#[derive(Debug, Error)]
pub enum ComputationError {
    #[error("prayer times unresolvable at latitude {latitude:.4} on {date}")]
    Unresolvable {
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
    },
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("network error while searching places: {0}")]
    Http(String),
    #[error("invalid geocoder payload: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("invalid stored record: {0}")]
    InvalidRecord(String),
}
