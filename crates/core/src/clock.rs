//! Time source for everything that depends on "now" or "today".
//!
//! "Today" is the shop's calendar day in its configured timezone, so a
//! technician scheduling time off late in the evening is judged against the
//! local date rather than UTC.

use std::sync::Mutex;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn timezone(&self) -> Tz;

    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.timezone()).date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    timezone: Tz,
}

impl SystemClock {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn timezone(&self) -> Tz {
        self.timezone
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug)]
pub struct FakeClock {
    now: Mutex<DateTime<Utc>>,
    timezone: Tz,
}

impl FakeClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_timezone(now, Tz::UTC)
    }

    pub fn with_timezone(now: DateTime<Utc>, timezone: Tz) -> Self {
        Self {
            now: Mutex::new(now),
            timezone,
        }
    }

    /// Noon UTC on the given day.
    pub fn on(date: NaiveDate) -> Self {
        let noon = date
            .and_hms_opt(12, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or_else(Utc::now);
        Self::new(noon)
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.lock();
        *now += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        // A poisoned clock only means a test panicked mid-update; the value is still usable.
        self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }

    fn timezone(&self) -> Tz {
        self.timezone
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn today_follows_the_shop_timezone() {
        // 20:00 UTC on the 20th is already the 21st in Manila.
        let now = Utc.with_ymd_and_hms(2025, 11, 20, 20, 0, 0).unwrap();
        let clock = FakeClock::with_timezone(now, chrono_tz::Asia::Manila);

        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 11, 21).unwrap());
    }

    #[test]
    fn advance_moves_now_forward() {
        let clock = FakeClock::on(NaiveDate::from_ymd_opt(2025, 11, 20).unwrap());
        let before = clock.now();
        clock.advance(Duration::seconds(181));

        assert_eq!(clock.now() - before, Duration::seconds(181));
    }
}
