//! Error types for rule evaluation and scheduler bookkeeping.

use thiserror::Error;

/// A recurrence rule that cannot be evaluated.
///
/// Every variant is a caller configuration problem. "Nothing to do right now"
/// is not an error and is reported as `Ok(None)` by the engine instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("window start is after window end")]
    StartAfterEnd,

    #[error("invalid interval: must be nonzero, and at most 24 for hourly rules")]
    InvalidInterval,

    #[error("invalid weekday mask: must select at least one of the seven days and nothing else")]
    InvalidWeekdayMask,

    #[error("invalid frequency: {0}")]
    InvalidFrequency(String),

    #[error("recurrence can never land on an enabled weekday")]
    UnsatisfiableRecurrence,

    /// A linear timestamp fell outside what the calendar can represent.
    #[error("timestamp {0} is out of calendar range")]
    OutOfRange(i64),

    #[error("invalid RRULE: {0}")]
    InvalidRrule(String),
}

/// Scheduler collection boundary conditions. A failing call leaves the
/// scheduler untouched.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("scheduler is full ({capacity} schedules)")]
    CapacityExceeded { capacity: usize },

    #[error("scheduler has no schedules")]
    Empty,

    #[error("schedule ids exhausted; clear the scheduler to start over")]
    IdsExhausted,
}

/// Convenience alias used throughout cadence.
pub type Result<T, E = RuleError> = std::result::Result<T, E>;
