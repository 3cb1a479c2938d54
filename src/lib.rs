pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::engine::{EngineSnapshot, ScheduleEngine, TICK_INTERVAL, day_rolled_over};
pub use application::location::{LocationResolver, LocationSnapshot, LocationStatus};
pub use application::next_prayer::{
    NextPrayer, NextPrayerTracker, TickOutcome, countdown_label, is_imminent, next_prayer,
};
pub use application::notifications::NotificationScheduler;
pub use application::post_prayer_alert::{PostPrayerAlertTimer, alert_delay};
pub use application::schedule_calculator::PrayerScheduleCalculator;
pub use application::search::{GeocodeSearchPipeline, SearchState, parse_coordinate_query};
pub use domain::models::{
    ActiveZone, CalculationMethod, CalculationParameters, Coordinates, CorrectionOffsets,
    LocationState, Madhhab, NamedFix, NotificationRequest, Prayer, PrayerSchedule, SearchResult,
    Settings, SoundPolicy,
};
pub use infrastructure::geocoding_client::{GeocodingClient, ReqwestNominatimClient};
