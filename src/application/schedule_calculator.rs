use crate::application::NowProvider;
use crate::domain::models::{
    ActiveZone, CalculationParameters, Coordinates, Prayer, PrayerSchedule,
};
use crate::infrastructure::astronomy::AstronomicalCalculator;
use crate::infrastructure::error::ComputationError;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

const DHUHA_OFFSET_MINUTES: i64 = 20;

pub struct PrayerScheduleCalculator<A>
where
    A: AstronomicalCalculator,
{
    calculator: Arc<A>,
    now_provider: NowProvider,
}

impl<A> PrayerScheduleCalculator<A>
where
    A: AstronomicalCalculator,
{
    pub fn new(calculator: Arc<A>) -> Self {
        Self {
            calculator,
            now_provider: Arc::new(Utc::now),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub fn recompute(
        &self,
        coordinates: Coordinates,
        zone: ActiveZone,
        parameters: &CalculationParameters,
    ) -> Result<PrayerSchedule, ComputationError> {
        let now = (self.now_provider)();
        let today = zone.civil_date(now);
        let tomorrow = today + Duration::days(1);

        let base_today =
            self.calculator
                .compute(coordinates, today, parameters.method, parameters.madhhab)?;
        let base_tomorrow =
            self.calculator
                .compute(coordinates, tomorrow, parameters.method, parameters.madhhab)?;

        let corrections = &parameters.corrections;
        let fajr = base_today.fajr + Duration::minutes(corrections.fajr);
        let dhuhr = base_today.dhuhr + Duration::minutes(corrections.dhuhr);
        let asr = base_today.asr + Duration::minutes(corrections.asr);
        let maghrib = base_today.maghrib + Duration::minutes(corrections.maghrib);
        let isha = base_today.isha + Duration::minutes(corrections.isha);
        let tomorrow_fajr = base_tomorrow.fajr + Duration::minutes(corrections.fajr);

        let mut times: Vec<(Prayer, DateTime<Utc>)> = vec![
            (Prayer::Fajr, fajr),
            (Prayer::Dhuhr, dhuhr),
            (Prayer::Asr, asr),
            (Prayer::Maghrib, maghrib),
            (Prayer::Isha, isha),
        ];

        if parameters.show_sunnah {
            // Tahajud opens at the last third of the night between today's
            // Isha and tomorrow's Fajr; Dhuha trails sunrise by a fixed
            // offset, uncorrected.
            let night = tomorrow_fajr - isha;
            times.push((Prayer::Tahajud, isha + night * 2 / 3));
            times.push((
                Prayer::Dhuha,
                base_today.sunrise + Duration::minutes(DHUHA_OFFSET_MINUTES),
            ));
        }

        Ok(PrayerSchedule {
            times,
            tomorrow_fajr,
            computed_at: now,
            zone,
        })
    }
}
