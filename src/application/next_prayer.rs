use crate::domain::models::{Prayer, PrayerSchedule};
use chrono::{DateTime, Utc};

pub const IMMINENT_WINDOW_SECONDS: i64 = 600;
pub const IDLE_COUNTDOWN: &str = "--:--";
pub const NOW_LABEL: &str = "Now";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NextPrayer {
    pub prayer: Prayer,
    pub at: DateTime<Utc>,
}

// Candidates are today's entries plus tomorrow's Fajr, which is always a
// wraparound candidate. Supplementary entries are filtered out when sunnah
// times are off, even if the schedule still carries them.
pub fn next_prayer(
    schedule: &PrayerSchedule,
    now: DateTime<Utc>,
    show_sunnah: bool,
) -> Option<NextPrayer> {
    let mut candidates: Vec<(Prayer, DateTime<Utc>)> = schedule
        .times
        .iter()
        .copied()
        .filter(|(prayer, _)| show_sunnah || !prayer.is_supplementary())
        .collect();
    candidates.push((Prayer::Fajr, schedule.tomorrow_fajr));
    candidates.sort_by_key(|(_, at)| *at);

    candidates
        .into_iter()
        .find(|(_, at)| *at > now)
        .map(|(prayer, at)| NextPrayer { prayer, at })
}

pub fn countdown_label(remaining_seconds: i64) -> String {
    if remaining_seconds <= 0 {
        return NOW_LABEL.to_string();
    }
    let hours = remaining_seconds / 3600;
    let minutes = (remaining_seconds % 3600) / 60 + 1;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

pub fn is_imminent(remaining_seconds: i64) -> bool {
    remaining_seconds > 0 && remaining_seconds <= IMMINENT_WINDOW_SECONDS
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Countdown {
        next: NextPrayer,
        label: String,
        imminent: bool,
    },
    ZeroCrossing {
        next: NextPrayer,
    },
    ScheduleStale,
}

#[derive(Debug, Default)]
pub struct NextPrayerTracker {
    current: Option<NextPrayer>,
    fired: Option<NextPrayer>,
}

impl NextPrayerTracker {
    // Called whenever the schedule is replaced; the fired marker survives so a
    // replacement at the crossing instant cannot repeat the alert.
    pub fn reset(&mut self) {
        self.current = None;
    }

    pub fn tick(
        &mut self,
        schedule: &PrayerSchedule,
        now: DateTime<Utc>,
        show_sunnah: bool,
    ) -> TickOutcome {
        if let Some(current) = self.current {
            if current.at > now {
                return countdown_outcome(current, now);
            }
            if self.fired != Some(current) {
                self.fired = Some(current);
                return TickOutcome::ZeroCrossing { next: current };
            }
            self.current = None;
        }

        match next_prayer(schedule, now, show_sunnah) {
            Some(next) => {
                self.current = Some(next);
                countdown_outcome(next, now)
            }
            None => TickOutcome::ScheduleStale,
        }
    }
}

fn countdown_outcome(next: NextPrayer, now: DateTime<Utc>) -> TickOutcome {
    let remaining = (next.at - now).num_seconds();
    TickOutcome::Countdown {
        next,
        label: countdown_label(remaining),
        imminent: is_imminent(remaining),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ActiveZone;
    use chrono::Duration;
    use proptest::prelude::*;

    fn fixed_time(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn sample_schedule(show_sunnah: bool) -> PrayerSchedule {
        let mut times = vec![
            (Prayer::Fajr, fixed_time("2026-03-10T05:00:00Z")),
            (Prayer::Dhuhr, fixed_time("2026-03-10T12:10:00Z")),
            (Prayer::Asr, fixed_time("2026-03-10T15:30:00Z")),
            (Prayer::Maghrib, fixed_time("2026-03-10T18:05:00Z")),
            (Prayer::Isha, fixed_time("2026-03-10T20:00:00Z")),
        ];
        if show_sunnah {
            times.push((Prayer::Tahajud, fixed_time("2026-03-11T02:00:00Z")));
            times.push((Prayer::Dhuha, fixed_time("2026-03-10T06:40:00Z")));
        }
        PrayerSchedule {
            times,
            tomorrow_fajr: fixed_time("2026-03-11T05:00:00Z"),
            computed_at: fixed_time("2026-03-10T00:00:05Z"),
            zone: ActiveZone::Named(chrono_tz::UTC),
        }
    }

    #[test]
    fn next_between_dhuhr_and_asr_is_asr() {
        let schedule = sample_schedule(false);
        let next = next_prayer(&schedule, fixed_time("2026-03-10T13:00:00Z"), false)
            .expect("next prayer exists");
        assert_eq!(next.prayer, Prayer::Asr);
        assert_eq!(next.at, fixed_time("2026-03-10T15:30:00Z"));
    }

    #[test]
    fn after_isha_wraps_to_tomorrow_fajr() {
        let schedule = sample_schedule(false);
        let next = next_prayer(&schedule, fixed_time("2026-03-10T21:00:00Z"), false)
            .expect("next prayer exists");
        assert_eq!(next.prayer, Prayer::Fajr);
        assert_eq!(next.at, schedule.tomorrow_fajr);
    }

    #[test]
    fn supplementary_entries_are_skipped_when_disabled() {
        // Tahajud at 02:00 sits between Isha and tomorrow's Fajr; with sunnah
        // off it must not be selected even if present in the schedule.
        let schedule = sample_schedule(true);
        let next = next_prayer(&schedule, fixed_time("2026-03-10T23:00:00Z"), false)
            .expect("next prayer exists");
        assert_eq!(next.prayer, Prayer::Fajr);

        let with_sunnah = next_prayer(&schedule, fixed_time("2026-03-10T23:00:00Z"), true)
            .expect("next prayer exists");
        assert_eq!(with_sunnah.prayer, Prayer::Tahajud);
    }

    #[test]
    fn no_candidate_past_tomorrow_fajr() {
        let schedule = sample_schedule(false);
        assert_eq!(
            next_prayer(&schedule, fixed_time("2026-03-11T05:00:00Z"), false),
            None
        );
    }

    #[test]
    fn countdown_label_formats_hours_and_minutes() {
        // 3h 25m 30s remaining reads as "3h 26m".
        assert_eq!(countdown_label(3 * 3600 + 25 * 60 + 30), "3h 26m");
        assert_eq!(countdown_label(45), "1m");
        assert_eq!(countdown_label(59 * 60 + 59), "60m");
        assert_eq!(countdown_label(0), NOW_LABEL);
        assert_eq!(countdown_label(-5), NOW_LABEL);
    }

    #[test]
    fn imminent_window_is_ten_minutes_exclusive_of_zero() {
        assert!(is_imminent(1));
        assert!(is_imminent(600));
        assert!(!is_imminent(601));
        assert!(!is_imminent(0));
        assert!(!is_imminent(-1));
    }

    #[test]
    fn tracker_crosses_zero_once_then_advances() {
        let schedule = sample_schedule(false);
        let mut tracker = NextPrayerTracker::default();

        let before = fixed_time("2026-03-10T15:29:59Z");
        match tracker.tick(&schedule, before, false) {
            TickOutcome::Countdown { next, imminent, .. } => {
                assert_eq!(next.prayer, Prayer::Asr);
                assert!(imminent);
            }
            other => panic!("expected countdown, got {other:?}"),
        }

        let crossing = fixed_time("2026-03-10T15:30:00Z");
        assert_eq!(
            tracker.tick(&schedule, crossing, false),
            TickOutcome::ZeroCrossing {
                next: NextPrayer {
                    prayer: Prayer::Asr,
                    at: crossing,
                },
            }
        );

        // The following tick must advance without repeating the alert.
        match tracker.tick(&schedule, crossing + Duration::seconds(1), false) {
            TickOutcome::Countdown { next, .. } => assert_eq!(next.prayer, Prayer::Maghrib),
            other => panic!("expected countdown, got {other:?}"),
        }
    }

    #[test]
    fn tracker_reports_stale_schedule_past_tomorrow_fajr() {
        let schedule = sample_schedule(false);
        let mut tracker = NextPrayerTracker::default();
        assert_eq!(
            tracker.tick(&schedule, fixed_time("2026-03-11T06:00:00Z"), false),
            TickOutcome::ScheduleStale
        );
    }

    #[test]
    fn reset_preserves_the_fired_marker() {
        let schedule = sample_schedule(false);
        let mut tracker = NextPrayerTracker::default();
        let crossing = fixed_time("2026-03-10T15:30:00Z");

        let _ = tracker.tick(&schedule, crossing - Duration::seconds(30), false);
        assert_eq!(
            tracker.tick(&schedule, crossing, false),
            TickOutcome::ZeroCrossing {
                next: NextPrayer {
                    prayer: Prayer::Asr,
                    at: crossing,
                },
            }
        );

        tracker.reset();
        // Re-entering at the crossing instant selects the next future prayer
        // instead of re-firing for Asr.
        match tracker.tick(&schedule, crossing, false) {
            TickOutcome::Countdown { next, .. } => assert_eq!(next.prayer, Prayer::Maghrib),
            other => panic!("expected countdown, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn next_prayer_is_strictly_in_the_future(offset_seconds in 0i64..86_400) {
            let schedule = sample_schedule(false);
            let now = fixed_time("2026-03-10T05:00:00Z") + Duration::seconds(offset_seconds);
            if let Some(next) = next_prayer(&schedule, now, false) {
                prop_assert!(next.at > now);
            }
        }

        #[test]
        fn countdown_outcomes_never_point_at_the_past(offset_seconds in 0i64..86_400) {
            let schedule = sample_schedule(false);
            let now = fixed_time("2026-03-10T05:00:00Z") + Duration::seconds(offset_seconds);
            let mut tracker = NextPrayerTracker::default();
            if let TickOutcome::Countdown { next, .. } = tracker.tick(&schedule, now, false) {
                prop_assert!(next.at > now);
            }
        }
    }
}
