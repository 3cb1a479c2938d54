use chrono::{DateTime, Utc};
use std::sync::Arc;

pub mod engine;
pub mod location;
pub mod next_prayer;
pub mod notifications;
pub mod post_prayer_alert;
pub mod schedule_calculator;
pub mod search;

pub type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;
