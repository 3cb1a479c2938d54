use crate::domain::models::{CalculationMethod, Coordinates, Madhhab};
use crate::infrastructure::error::ComputationError;
use chrono::{DateTime, NaiveDate, Utc};

// Base times for one civil date, before per-prayer corrections. Sunrise is not
// a prayer; it is carried only as the anchor for the Dhuha offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPrayerTimes {
    pub fajr: DateTime<Utc>,
    pub sunrise: DateTime<Utc>,
    pub dhuhr: DateTime<Utc>,
    pub asr: DateTime<Utc>,
    pub maghrib: DateTime<Utc>,
    pub isha: DateTime<Utc>,
}

pub trait AstronomicalCalculator: Send + Sync {
    fn compute(
        &self,
        coordinates: Coordinates,
        date: NaiveDate,
        method: CalculationMethod,
        madhhab: Madhhab,
    ) -> Result<RawPrayerTimes, ComputationError>;
}
