//! The wall-clock primitive the engine runs on.
//!
//! The engine only ever adds and compares seconds on a linear axis. Turning
//! civil date-time fields into that axis (and back), and naming the weekday
//! of a civil date, is delegated to a [`Calendar`].

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone,
};
use chrono_tz::Tz;

/// Conversion between civil date-times and linear timestamps (seconds).
pub trait Calendar {
    /// Civil date-time to seconds on the linear axis.
    fn to_linear(&self, dt: NaiveDateTime) -> i64;

    /// Seconds on the linear axis to a civil date-time, or `None` when the
    /// timestamp is outside the representable range.
    fn from_linear(&self, ts: i64) -> Option<NaiveDateTime>;

    /// Day of the week, 0 = Sunday through 6 = Saturday.
    fn weekday_of(&self, dt: NaiveDateTime) -> u8 {
        dt.weekday().num_days_from_sunday() as u8
    }
}

impl<C: Calendar + ?Sized> Calendar for &C {
    fn to_linear(&self, dt: NaiveDateTime) -> i64 {
        (**self).to_linear(dt)
    }

    fn from_linear(&self, ts: i64) -> Option<NaiveDateTime> {
        (**self).from_linear(ts)
    }

    fn weekday_of(&self, dt: NaiveDateTime) -> u8 {
        (**self).weekday_of(dt)
    }
}

/// Civil time is UTC. This is what a controller running with `TZ=UTC0` sees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UtcCalendar;

impl Calendar for UtcCalendar {
    fn to_linear(&self, dt: NaiveDateTime) -> i64 {
        dt.and_utc().timestamp()
    }

    fn from_linear(&self, ts: i64) -> Option<NaiveDateTime> {
        DateTime::from_timestamp(ts, 0).map(|dt| dt.naive_utc())
    }
}

/// Civil time in an IANA time zone.
///
/// Ambiguous wall-clock readings (the repeated hour when clocks fall back)
/// resolve to the earlier instant. Readings that do not exist (the skipped
/// hour when clocks spring forward) are converted with the offset in force
/// at that reading, which lands them just past the gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZonedCalendar {
    tz: Tz,
}

impl ZonedCalendar {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Calendar for ZonedCalendar {
    fn to_linear(&self, dt: NaiveDateTime) -> i64 {
        match self.tz.from_local_datetime(&dt) {
            LocalResult::Single(t) => t.timestamp(),
            LocalResult::Ambiguous(earliest, _) => earliest.timestamp(),
            LocalResult::None => {
                let offset = self.tz.offset_from_utc_datetime(&dt).fix();
                let utc = dt - Duration::seconds(i64::from(offset.local_minus_utc()));
                utc.and_utc().timestamp()
            }
        }
    }

    fn from_linear(&self, ts: i64) -> Option<NaiveDateTime> {
        DateTime::from_timestamp(ts, 0).map(|dt| dt.with_timezone(&self.tz).naive_local())
    }
}

/// Build a civil date-time from calendar fields (month and day are 1-based).
///
/// Returns `None` for field combinations that do not name a real date-time.
pub fn civil(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}
