//! Time source used by services to decide what "today" is.

use chrono::{DateTime, Local, NaiveDate, TimeZone};

/// Source of the current local time.
pub trait Clock {
    fn now(&self) -> DateTime<Local>;

    /// Current local calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Current time as Unix epoch milliseconds.
    fn now_ms(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// Wall-clock time from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    now: DateTime<Local>,
}

impl FixedClock {
    pub fn at(now: DateTime<Local>) -> Self {
        Self { now }
    }

    /// Pins the clock to local noon of `date`.
    pub fn on_date(date: NaiveDate) -> Self {
        let noon = date.and_hms_opt(12, 0, 0).unwrap_or_default();
        let now = noon
            .and_local_timezone(Local)
            .earliest()
            .unwrap_or_else(|| Local.from_utc_datetime(&noon));
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.now
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Local> {
        (**self).now()
    }
}
