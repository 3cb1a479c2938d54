use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

pub const CUSTOM_COORDINATE_NAME: &str = "Custom Coordinate";

const DEDUP_COORDINATE_SCALE: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err("coordinates.latitude must be within [-90, 90]".to_string());
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err("coordinates.longitude must be within [-180, 180]".to_string());
        }
        Ok(())
    }

    pub fn rounded_key(&self) -> (i64, i64) {
        (
            (self.latitude * DEDUP_COORDINATE_SCALE).round() as i64,
            (self.longitude * DEDUP_COORDINATE_SCALE).round() as i64,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prayer {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
    Tahajud,
    Dhuha,
}

impl Prayer {
    pub const MANDATORY: [Prayer; 5] = [
        Prayer::Fajr,
        Prayer::Dhuhr,
        Prayer::Asr,
        Prayer::Maghrib,
        Prayer::Isha,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Prayer::Fajr => "Fajr",
            Prayer::Dhuhr => "Dhuhr",
            Prayer::Asr => "Asr",
            Prayer::Maghrib => "Maghrib",
            Prayer::Isha => "Isha",
            Prayer::Tahajud => "Tahajud",
            Prayer::Dhuha => "Dhuha",
        }
    }

    pub fn is_supplementary(self) -> bool {
        matches!(self, Prayer::Tahajud | Prayer::Dhuha)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    #[default]
    MuslimWorldLeague,
    Egyptian,
    Karachi,
    UmmAlQura,
    Dubai,
    MoonsightingCommittee,
    NorthAmerica,
    Kuwait,
    Qatar,
    Singapore,
    Tehran,
    Turkey,
}

impl CalculationMethod {
    pub fn name(self) -> &'static str {
        match self {
            CalculationMethod::MuslimWorldLeague => "Muslim World League",
            CalculationMethod::Egyptian => "Egyptian General Authority",
            CalculationMethod::Karachi => "University of Islamic Sciences, Karachi",
            CalculationMethod::UmmAlQura => "Umm al-Qura University, Makkah",
            CalculationMethod::Dubai => "Dubai",
            CalculationMethod::MoonsightingCommittee => "Moonsighting Committee",
            CalculationMethod::NorthAmerica => "Islamic Society of North America",
            CalculationMethod::Kuwait => "Kuwait",
            CalculationMethod::Qatar => "Qatar",
            CalculationMethod::Singapore => "Singapore",
            CalculationMethod::Tehran => "Institute of Geophysics, Tehran",
            CalculationMethod::Turkey => "Diyanet, Turkey",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Madhhab {
    #[default]
    Shafi,
    Hanafi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CorrectionOffsets {
    pub fajr: i64,
    pub dhuhr: i64,
    pub asr: i64,
    pub maghrib: i64,
    pub isha: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CalculationParameters {
    pub method: CalculationMethod,
    pub madhhab: Madhhab,
    pub corrections: CorrectionOffsets,
    pub show_sunnah: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundPolicy {
    Silent,
    #[default]
    Default,
    Custom(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPrayerAlertSettings {
    pub enabled: bool,
    pub duration_minutes: u32,
}

impl Default for PostPrayerAlertSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            duration_minutes: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub parameters: CalculationParameters,
    pub notifications_enabled: bool,
    pub sound: SoundPolicy,
    pub post_prayer_alert: PostPrayerAlertSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            parameters: CalculationParameters::default(),
            notifications_enabled: true,
            sound: SoundPolicy::default(),
            post_prayer_alert: PostPrayerAlertSettings::default(),
        }
    }
}

// Civil-time arithmetic runs in the zone of the active location: an IANA zone
// resolved from coordinates, or the machine's local zone when no resolution is
// available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveZone {
    Named(Tz),
    #[default]
    Local,
}

impl ActiveZone {
    pub fn civil_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            ActiveZone::Named(zone) => instant.with_timezone(zone).date_naive(),
            ActiveZone::Local => instant.with_timezone(&chrono::Local).date_naive(),
        }
    }

    pub fn civil_date_time(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            ActiveZone::Named(zone) => instant.with_timezone(zone).naive_local(),
            ActiveZone::Local => instant.with_timezone(&chrono::Local).naive_local(),
        }
    }

    pub fn same_civil_day(&self, first: DateTime<Utc>, second: DateTime<Utc>) -> bool {
        self.civil_date(first) == self.civil_date(second)
    }

    pub fn identifier(&self) -> String {
        match self {
            ActiveZone::Named(zone) => zone.name().to_string(),
            ActiveZone::Local => "local".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrayerSchedule {
    pub times: Vec<(Prayer, DateTime<Utc>)>,
    pub tomorrow_fajr: DateTime<Utc>,
    pub computed_at: DateTime<Utc>,
    pub zone: ActiveZone,
}

impl PrayerSchedule {
    pub fn time_of(&self, prayer: Prayer) -> Option<DateTime<Utc>> {
        self.times
            .iter()
            .find(|(candidate, _)| *candidate == prayer)
            .map(|(_, at)| *at)
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut previous: Option<(Prayer, DateTime<Utc>)> = None;
        for prayer in Prayer::MANDATORY {
            let Some(at) = self.time_of(prayer) else {
                return Err(format!("schedule is missing {}", prayer.name()));
            };
            if let Some((earlier, earlier_at)) = previous {
                if at <= earlier_at {
                    return Err(format!(
                        "schedule times out of order: {} must be after {}",
                        prayer.name(),
                        earlier.name()
                    ));
                }
            }
            previous = Some((prayer, at));
        }
        let Some(isha) = self.time_of(Prayer::Isha) else {
            return Err("schedule is missing Isha".to_string());
        };
        if self.tomorrow_fajr <= isha {
            return Err("tomorrow's Fajr must be after today's Isha".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub name: String,
    pub country: String,
    pub coordinates: Coordinates,
}

impl SearchResult {
    pub fn identity(&self) -> (String, String, i64, i64) {
        let (latitude_key, longitude_key) = self.coordinates.rounded_key();
        (
            self.name.clone(),
            self.country.clone(),
            latitude_key,
            longitude_key,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedFix {
    pub name: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocationState {
    Automatic { cache: Option<NamedFix> },
    Manual { fix: NamedFix },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSound {
    Silent,
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRequest {
    pub prayer: Prayer,
    pub fire_at: DateTime<Utc>,
    pub civil_trigger: NaiveDateTime,
    pub sound: NotificationSound,
    pub body: String,
}
