//! # cadence
//!
//! Deterministic next-event resolution for windowed recurring schedules.
//!
//! A [`RecurrenceRule`] is a small cousin of an RFC 5545 recurrence: an
//! active window whose daily start and end times repeat on the days of a
//! weekday mask, with fixed-length interior repeats (every N seconds,
//! minutes or hours) and an optional cap on repeats per day. Given "now",
//! the engine answers with the single next event. A [`Scheduler`] holds a
//! handful of rules and keeps the earliest upcoming event of each group.
//!
//! Everything is synchronous and bounded, with no global state, which keeps
//! it usable from an embedded control loop.
//!
//! ## Quick start
//!
//! ```rust
//! use cadence::{civil, find_next_event, Frequency, RecurrenceRule, TriggerKind, UtcCalendar};
//!
//! let mut rule = RecurrenceRule::new(
//!     civil(2016, 10, 24, 8, 0, 0).unwrap(),
//!     civil(2018, 10, 24, 16, 0, 0).unwrap(),
//! );
//! rule.frequency = Frequency::Minutely;
//! rule.interval = 5;
//! rule.enabled = true;
//!
//! let now = civil(2016, 10, 24, 8, 55, 0).unwrap();
//! let next = find_next_event(&rule, now, &UtcCalendar).unwrap().unwrap();
//! assert_eq!(next.kind, TriggerKind::Recur);
//! assert_eq!(next.at, civil(2016, 10, 24, 9, 0, 0).unwrap().and_utc().timestamp());
//! ```
//!
//! ## Modules
//!
//! - [`calendar`]: civil date-time ↔ linear timestamp conversion
//! - [`rule`]: `RecurrenceRule`, `Frequency`, `WeekdayMask`
//! - [`engine`]: `find_next_event` and friends
//! - [`scheduler`]: bounded, grouped schedule collection
//! - [`interop`]: RRULE import/export
//! - [`error`]: Error types

pub mod calendar;
pub mod engine;
pub mod error;
pub mod interop;
pub mod rule;
pub mod scheduler;

pub use calendar::{civil, Calendar, UtcCalendar, ZonedCalendar};
pub use engine::{find_next_event, upcoming_events, validate, Trigger, TriggerKind};
pub use error::{RuleError, SchedulerError};
pub use rule::{Frequency, RecurrenceRule, WeekdayMask};
pub use scheduler::{
    Event, GroupId, Schedule, ScheduleFault, ScheduleId, Scheduler, DEFAULT_CAPACITY,
};
