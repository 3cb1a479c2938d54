use crate::application::NowProvider;
use crate::application::location::{LocationSnapshot, LocationStatus};
use crate::application::next_prayer::{
    IDLE_COUNTDOWN, NOW_LABEL, NextPrayer, NextPrayerTracker, TickOutcome,
};
use crate::application::notifications::NotificationScheduler;
use crate::application::post_prayer_alert::PostPrayerAlertTimer;
use crate::application::schedule_calculator::PrayerScheduleCalculator;
use crate::domain::models::{ActiveZone, NamedFix, PrayerSchedule, Settings, SoundPolicy};
use crate::infrastructure::alerts::{AdhanPlayer, AlertPresenter};
use crate::infrastructure::astronomy::AstronomicalCalculator;
use crate::infrastructure::logging::{EventSink, NullSink};
use crate::infrastructure::notification_gateway::NotificationGateway;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

// Rollover compares civil days in the zone the schedule was computed for,
// never in UTC.
pub fn day_rolled_over(
    computed_at: DateTime<Utc>,
    now: DateTime<Utc>,
    zone: ActiveZone,
) -> bool {
    !zone.same_civil_day(computed_at, now)
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSnapshot {
    pub schedule: Option<PrayerSchedule>,
    pub next: Option<NextPrayer>,
    pub countdown: String,
    pub imminent: bool,
    pub location_status: LocationStatus,
    pub location: Option<NamedFix>,
    pub computation_error: Option<String>,
}

impl Default for EngineSnapshot {
    fn default() -> Self {
        Self {
            schedule: None,
            next: None,
            countdown: IDLE_COUNTDOWN.to_string(),
            imminent: false,
            location_status: LocationStatus::Initializing,
            location: None,
            computation_error: None,
        }
    }
}

// The single designated execution context: every schedule mutation happens
// here, driven by the 1 Hz tick and by location snapshots. Downstream
// consumers read the published snapshot.
pub struct ScheduleEngine<A, N, P, S>
where
    A: AstronomicalCalculator,
    N: NotificationGateway,
    P: AlertPresenter + 'static,
    S: AdhanPlayer,
{
    calculator: PrayerScheduleCalculator<A>,
    notifications: NotificationScheduler<N>,
    alert_timer: PostPrayerAlertTimer<P>,
    player: Arc<S>,
    event_sink: Arc<dyn EventSink>,
    now_provider: NowProvider,
    settings: Settings,
    tracker: NextPrayerTracker,
    schedule: Option<PrayerSchedule>,
    location: LocationSnapshot,
    computation_error: Option<String>,
    stale: bool,
    snapshot: Arc<watch::Sender<EngineSnapshot>>,
}

impl<A, N, P, S> ScheduleEngine<A, N, P, S>
where
    A: AstronomicalCalculator,
    N: NotificationGateway,
    P: AlertPresenter + 'static,
    S: AdhanPlayer,
{
    pub fn new(
        calculator: PrayerScheduleCalculator<A>,
        notifications: NotificationScheduler<N>,
        alert_timer: PostPrayerAlertTimer<P>,
        player: Arc<S>,
    ) -> Self {
        Self {
            calculator,
            notifications,
            alert_timer,
            player,
            event_sink: Arc::new(NullSink),
            now_provider: Arc::new(Utc::now),
            settings: Settings::default(),
            tracker: NextPrayerTracker::default(),
            schedule: None,
            location: LocationSnapshot::default(),
            computation_error: None,
            stale: false,
            snapshot: Arc::new(watch::Sender::new(EngineSnapshot::default())),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub fn with_event_sink(mut self, event_sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // Any settings change recomputes the schedule and reschedules both the
    // notifications and the alert timer.
    pub fn update_settings(&mut self, mutate: impl FnOnce(&mut Settings)) {
        mutate(&mut self.settings);
        if self.location.fix.is_some() {
            self.recompute((self.now_provider)());
        } else {
            self.reconcile_downstream();
            self.refresh_display((self.now_provider)());
        }
    }

    pub fn apply_location(&mut self, snapshot: LocationSnapshot) {
        let previous_coordinates = self.location.fix.as_ref().map(|fix| fix.coordinates);
        let previous_zone = self.location.zone;
        self.location = snapshot;

        if self.location.status == LocationStatus::Denied {
            self.schedule = None;
            self.tracker.reset();
            self.stale = false;
            self.reconcile_downstream();
            self.refresh_display((self.now_provider)());
            return;
        }

        let Some(fix) = self.location.fix.clone() else {
            self.refresh_display((self.now_provider)());
            return;
        };

        // A renamed fix keeps its coordinates; only a genuine move or zone
        // change triggers recomputation.
        let moved = previous_coordinates != Some(fix.coordinates)
            || previous_zone != self.location.zone
            || self.schedule.is_none();
        if moved {
            self.recompute((self.now_provider)());
        } else {
            self.refresh_display((self.now_provider)());
        }
    }

    pub fn tick(&mut self) {
        let now = (self.now_provider)();
        if self.stale {
            self.recompute(now);
            return;
        }
        let rolled = self
            .schedule
            .as_ref()
            .is_some_and(|schedule| day_rolled_over(schedule.computed_at, now, schedule.zone));
        if rolled {
            self.recompute(now);
        } else {
            self.refresh_display(now);
        }
    }

    pub async fn run(mut self, mut location_rx: watch::Receiver<LocationSnapshot>) {
        self.apply_location(location_rx.borrow_and_update().clone());

        let mut ticker = tokio::time::interval(TICK_INTERVAL);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick(),
                changed = location_rx.changed() => match changed {
                    Ok(()) => {
                        let snapshot = location_rx.borrow_and_update().clone();
                        self.apply_location(snapshot);
                    }
                    Err(_) => break,
                },
            }
        }
    }

    fn recompute(&mut self, now: DateTime<Utc>) {
        let Some(fix) = self.location.fix.clone() else {
            self.refresh_display(now);
            return;
        };

        match self
            .calculator
            .recompute(fix.coordinates, self.location.zone, &self.settings.parameters)
        {
            Ok(schedule) => {
                self.schedule = Some(schedule);
                self.tracker.reset();
                self.stale = false;
                self.computation_error = None;
                self.reconcile_downstream();
            }
            Err(error) => {
                // The last-known-good schedule stays in place; the failure is
                // surfaced as status only. The rollover check keeps retrying.
                self.computation_error = Some(error.to_string());
                self.stale = false;
                self.event_sink.error("engine", &error.to_string());
            }
        }
        self.refresh_display(now);
    }

    fn reconcile_downstream(&self) {
        self.notifications
            .reschedule(self.schedule.as_ref(), &self.settings);
        self.alert_timer
            .rearm(self.schedule.as_ref(), &self.settings.post_prayer_alert);
    }

    fn refresh_display(&mut self, now: DateTime<Utc>) {
        let (next, countdown, imminent) = match &self.schedule {
            None => (None, IDLE_COUNTDOWN.to_string(), false),
            Some(schedule) => {
                match self
                    .tracker
                    .tick(schedule, now, self.settings.parameters.show_sunnah)
                {
                    TickOutcome::Countdown {
                        next,
                        label,
                        imminent,
                    } => (Some(next), label, imminent),
                    TickOutcome::ZeroCrossing { next } => {
                        if let SoundPolicy::Custom(path) = &self.settings.sound {
                            self.player.play(path);
                        }
                        (Some(next), NOW_LABEL.to_string(), false)
                    }
                    TickOutcome::ScheduleStale => {
                        // Defer one tick and recompute then.
                        self.stale = true;
                        (None, IDLE_COUNTDOWN.to_string(), false)
                    }
                }
            }
        };

        self.snapshot.send_replace(EngineSnapshot {
            schedule: self.schedule.clone(),
            next,
            countdown,
            imminent,
            location_status: self.location.status.clone(),
            location: self.location.fix.clone(),
            computation_error: self.computation_error.clone(),
        });
    }
}
