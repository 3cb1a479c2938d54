use crate::application::NowProvider;
use crate::domain::models::{PostPrayerAlertSettings, PrayerSchedule};
use crate::infrastructure::alerts::AlertPresenter;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

// Delay until the alert for the prayer that most recently elapsed, or None
// when the feature is off, nothing has elapsed yet, or the window has already
// passed.
pub fn alert_delay(
    schedule: &PrayerSchedule,
    settings: &PostPrayerAlertSettings,
    now: DateTime<Utc>,
) -> Option<Duration> {
    if !settings.enabled {
        return None;
    }
    let last_elapsed = schedule
        .times
        .iter()
        .map(|(_, at)| *at)
        .filter(|at| *at < now)
        .max()?;
    let fire_at = last_elapsed + Duration::minutes(i64::from(settings.duration_minutes));
    if fire_at <= now {
        return None;
    }
    Some(fire_at - now)
}

// Singleton one-shot: re-arming always invalidates the previous pending timer
// first, whether or not a new one gets armed.
pub struct PostPrayerAlertTimer<P>
where
    P: AlertPresenter + 'static,
{
    presenter: Arc<P>,
    now_provider: NowProvider,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<P> PostPrayerAlertTimer<P>
where
    P: AlertPresenter + 'static,
{
    pub fn new(presenter: Arc<P>) -> Self {
        Self {
            presenter,
            now_provider: Arc::new(Utc::now),
            pending: Mutex::new(None),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub fn rearm(&self, schedule: Option<&PrayerSchedule>, settings: &PostPrayerAlertSettings) {
        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = pending.take() {
            handle.abort();
        }

        let Some(schedule) = schedule else {
            return;
        };
        let Some(delay) = alert_delay(schedule, settings, (self.now_provider)()) else {
            return;
        };

        let sleep_for = delay.to_std().unwrap_or_default();
        let presenter = Arc::clone(&self.presenter);
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(sleep_for).await;
            presenter.present();
        }));
    }

    pub fn is_armed(&self) -> bool {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        pending.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}
