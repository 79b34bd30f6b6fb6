//! Recurrence rule definitions: the active window, the repeat frequency and
//! interval, the weekday mask and the optional occurrence cap.
//!
//! Field names are loosely based on RFC 5545 (`FREQ`, `INTERVAL`, `BYDAY`,
//! `COUNT`), restricted to fixed-length intervals.
//!
//! ```text
//! Every 15 minutes on Monday and Thursday, 20:00 until 08:00 the next day:
//!   window_start = 2016-10-24T20:00:00
//!   window_end   = 2016-12-24T08:00:00
//!   frequency    = Minutely
//!   interval     = 15
//!   weekday_mask = MO | TH
//! ```

use std::fmt;
use std::ops::BitOr;

use chrono::{NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::calendar::civil;
use crate::error::RuleError;

/// Unit of the repeat interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Only the window boundaries are events; there is no interior recurrence.
    Limits,
    Secondly,
    Minutely,
    Hourly,
}

impl Frequency {
    /// Length of one unit in seconds, or `None` for [`Frequency::Limits`].
    pub fn unit_seconds(self) -> Option<i64> {
        match self {
            Frequency::Limits => None,
            Frequency::Secondly => Some(1),
            Frequency::Minutely => Some(60),
            Frequency::Hourly => Some(60 * 60),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Limits => "limits",
            Frequency::Secondly => "secondly",
            Frequency::Minutely => "minutely",
            Frequency::Hourly => "hourly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw frequency codes as stored by firmware: 0 = limits, 1 = secondly,
/// 2 = minutely, 3 = hourly.
impl TryFrom<u8> for Frequency {
    type Error = RuleError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Frequency::Limits),
            1 => Ok(Frequency::Secondly),
            2 => Ok(Frequency::Minutely),
            3 => Ok(Frequency::Hourly),
            other => Err(RuleError::InvalidFrequency(format!("code {other}"))),
        }
    }
}

/// Set of weekdays a rule may anchor to.
///
/// Bit layout, most significant first: SU MO TU WE TH FR SA, so Sunday is
/// `0x40` and Saturday is `0x01`. A mask built with [`WeekdayMask::from_bits`]
/// keeps whatever bits it was given; rule validation rejects empty masks and
/// bits above `0x7F`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct WeekdayMask(u8);

const DAY_CODES: [&str; 7] = ["SU", "MO", "TU", "WE", "TH", "FR", "SA"];

impl WeekdayMask {
    pub const SUNDAY: Self = Self(0x40);
    pub const MONDAY: Self = Self(0x20);
    pub const TUESDAY: Self = Self(0x10);
    pub const WEDNESDAY: Self = Self(0x08);
    pub const THURSDAY: Self = Self(0x04);
    pub const FRIDAY: Self = Self(0x02);
    pub const SATURDAY: Self = Self(0x01);
    pub const EVERYDAY: Self = Self(0x7F);
    pub const WEEKDAYS: Self = Self(0x3E);
    pub const WEEKENDS: Self = Self(0x41);
    pub const EMPTY: Self = Self(0);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Nonempty and no bits outside the seven days.
    pub const fn is_valid(self) -> bool {
        self.0 != 0 && self.0 <= Self::EVERYDAY.0
    }

    /// Mask holding the single day with index `index` (0 = Sunday).
    /// Out-of-range indices give the empty mask.
    pub const fn from_index(index: u8) -> Self {
        if index < 7 {
            Self(0x40 >> index)
        } else {
            Self::EMPTY
        }
    }

    /// Whether the day with index `index` (0 = Sunday .. 6 = Saturday) is set.
    pub const fn contains_index(self, index: u8) -> bool {
        index < 7 && self.0 & (0x40 >> index) != 0
    }

    pub fn contains(self, day: Weekday) -> bool {
        self.contains_index(day.num_days_from_sunday() as u8)
    }

    /// Set day indices in Sunday-first order.
    pub fn indices(self) -> impl Iterator<Item = u8> {
        (0..7u8).filter(move |&i| self.contains_index(i))
    }

    /// Two-letter RFC 5545 day codes of the set days, Sunday first.
    pub fn codes(self) -> Vec<&'static str> {
        self.indices().map(|i| DAY_CODES[i as usize]).collect()
    }

    /// Parse one two-letter day code (`"MO"`, case-insensitive).
    pub fn from_code(code: &str) -> Option<Self> {
        DAY_CODES
            .iter()
            .position(|c| c.eq_ignore_ascii_case(code.trim()))
            .map(|i| Self::from_index(i as u8))
    }
}

impl From<Weekday> for WeekdayMask {
    fn from(day: Weekday) -> Self {
        Self::from_index(day.num_days_from_sunday() as u8)
    }
}

impl BitOr for WeekdayMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for WeekdayMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.codes().join(","))
    }
}

impl TryFrom<Vec<String>> for WeekdayMask {
    type Error = String;

    fn try_from(codes: Vec<String>) -> Result<Self, Self::Error> {
        codes.iter().try_fold(Self::EMPTY, |mask, code| {
            Self::from_code(code)
                .map(|day| mask | day)
                .ok_or_else(|| format!("unknown weekday code '{code}'"))
        })
    }
}

impl From<WeekdayMask> for Vec<String> {
    fn from(mask: WeekdayMask) -> Self {
        mask.codes().into_iter().map(str::to_string).collect()
    }
}

/// One schedule's recurrence definition.
///
/// Build one from [`RecurrenceRule::default`] or [`RecurrenceRule::new`],
/// adjust the public fields, then hand it to the engine or a scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrenceRule {
    /// Start date, and the daily start time of the active window.
    pub window_start: NaiveDateTime,
    /// End date, and the daily end time of the active window.
    pub window_end: NaiveDateTime,
    pub frequency: Frequency,
    /// Number of `frequency` units between recurrences.
    pub interval: u32,
    pub weekday_mask: WeekdayMask,
    /// Cap on interior recurrences counted per day window. `None` and
    /// `Some(0)` are unbounded.
    pub occurrence_limit: Option<u32>,
    pub enabled: bool,
}

impl RecurrenceRule {
    /// A default rule over the given window.
    pub fn new(window_start: NaiveDateTime, window_end: NaiveDateTime) -> Self {
        Self {
            window_start,
            window_end,
            ..Self::default()
        }
    }

    /// The occurrence cap, with `Some(0)` folded into `None`.
    pub fn effective_limit(&self) -> Option<u32> {
        self.occurrence_limit.filter(|&n| n > 0)
    }
}

impl Default for RecurrenceRule {
    /// 2016-01-01 08:00 through 2020-12-31 17:00, every 5 minutes on
    /// weekdays, no occurrence cap, disabled.
    fn default() -> Self {
        Self {
            window_start: civil(2016, 1, 1, 8, 0, 0).unwrap_or_default(),
            window_end: civil(2020, 12, 31, 17, 0, 0).unwrap_or_default(),
            frequency: Frequency::Minutely,
            interval: 5,
            weekday_mask: WeekdayMask::WEEKDAYS,
            occurrence_limit: None,
            enabled: false,
        }
    }
}
