use crate::application::NowProvider;
use crate::domain::models::{
    NotificationRequest, NotificationSound, Prayer, PrayerSchedule, Settings, SoundPolicy,
};
use crate::infrastructure::notification_gateway::NotificationGateway;
use chrono::Utc;
use std::sync::Arc;

// The five mandatory prayers always qualify; Tahajud and Dhuha qualify only
// when the sunnah setting is on and the schedule actually carries them.
pub fn eligible_prayers(settings: &Settings, schedule: &PrayerSchedule) -> Vec<Prayer> {
    let mut eligible = Prayer::MANDATORY.to_vec();
    if settings.parameters.show_sunnah {
        for prayer in [Prayer::Tahajud, Prayer::Dhuha] {
            if schedule.time_of(prayer).is_some() {
                eligible.push(prayer);
            }
        }
    }
    eligible
}

pub struct NotificationScheduler<G>
where
    G: NotificationGateway,
{
    gateway: Arc<G>,
    now_provider: NowProvider,
}

impl<G> NotificationScheduler<G>
where
    G: NotificationGateway,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            now_provider: Arc::new(Utc::now),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    // Cancel-then-reschedule, unconditionally: calling this twice in a row
    // leaves exactly one pending request per eligible prayer.
    pub fn reschedule(&self, schedule: Option<&PrayerSchedule>, settings: &Settings) {
        self.gateway.cancel_all();

        if !settings.notifications_enabled {
            return;
        }
        let Some(schedule) = schedule else {
            return;
        };

        let now = (self.now_provider)();
        let sound = match settings.sound {
            SoundPolicy::Default => NotificationSound::Default,
            // Custom audio is played at the zero-crossing by the host, so the
            // payload itself stays silent.
            SoundPolicy::Silent | SoundPolicy::Custom(_) => NotificationSound::Silent,
        };

        for prayer in eligible_prayers(settings, schedule) {
            let Some(fire_at) = schedule.time_of(prayer) else {
                continue;
            };
            if fire_at <= now {
                continue;
            }
            self.gateway.schedule(&NotificationRequest {
                prayer,
                fire_at,
                civil_trigger: schedule.zone.civil_date_time(fire_at),
                sound,
                body: format!("It's time for the {} prayer.", prayer.name()),
            });
        }
    }
}
