//! Next-event resolution for a single recurrence rule.
//!
//! [`find_next_event`] validates a rule, classifies `now` against the rule's
//! window, and inside the window walks a short run of candidate days looking
//! for the first day-local window that still has an event after `now`.
//!
//! Candidate dates step on the civil calendar. Stepping inside a day-local
//! window happens on the linear axis, so minute, hour, day, month and year
//! rollovers fall out of plain integer addition.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::calendar::Calendar;
use crate::error::{Result, RuleError};
use crate::rule::{Frequency, RecurrenceRule};

/// Number of candidate dates examined by the interior search: the date before
/// `now`'s date, `now`'s own date, and the seven that follow.
pub const CANDIDATE_DAYS: usize = 9;

/// Hourly intervals that are whole weeks always land on the start weekday.
const HOURS_PER_WEEK: u32 = 7 * 24;

/// What kind of boundary or repeat a trigger marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    /// The start of the rule window or of a day-local window.
    Start,
    /// An interior repeat inside a day-local window.
    Recur,
    /// The end of a day-local window ([`Frequency::Limits`] rules only).
    End,
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TriggerKind::Start => "start",
            TriggerKind::Recur => "recur",
            TriggerKind::End => "end",
        })
    }
}

/// The next event produced by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub kind: TriggerKind,
    /// Linear timestamp (seconds) of the event.
    pub at: i64,
}

/// Check a rule without evaluating it.
///
/// Checks run in a fixed order and the first failure wins.
pub fn validate<C: Calendar + ?Sized>(rule: &RecurrenceRule, calendar: &C) -> Result<()> {
    let start = calendar.to_linear(rule.window_start);
    let end = calendar.to_linear(rule.window_end);

    if start > end {
        return Err(RuleError::StartAfterEnd);
    }
    if rule.interval == 0 {
        return Err(RuleError::InvalidInterval);
    }
    if rule.frequency == Frequency::Hourly && rule.interval > 24 {
        return Err(RuleError::InvalidInterval);
    }
    if !rule.weekday_mask.is_valid() {
        return Err(RuleError::InvalidWeekdayMask);
    }
    // `Frequency` is closed, so a bad frequency code is rejected where it is
    // converted (`Frequency::try_from`, RRULE import) rather than here.
    let start_day = calendar.weekday_of(rule.window_start);
    if !rule.weekday_mask.contains_index(start_day)
        && rule.interval % HOURS_PER_WEEK == 0
        && rule.frequency == Frequency::Hourly
    {
        return Err(RuleError::UnsatisfiableRecurrence);
    }
    Ok(())
}

/// Find the next event of `rule` relative to `now`.
///
/// Returns `Ok(None)` when the rule is disabled, the window is over, or no
/// day-local window in the search horizon still has an event. Validation
/// runs before the enabled gate, so a broken rule reports its error even
/// while disabled.
///
/// # Errors
/// Returns the first [`RuleError`] found by [`validate`], or
/// [`RuleError::OutOfRange`] when a candidate day cannot be represented by
/// the calendar.
pub fn find_next_event<C: Calendar + ?Sized>(
    rule: &RecurrenceRule,
    now: NaiveDateTime,
    calendar: &C,
) -> Result<Option<Trigger>> {
    validate(rule, calendar)?;

    if !rule.enabled {
        return Ok(None);
    }

    let now_ts = calendar.to_linear(now);
    let start = calendar.to_linear(rule.window_start);
    let end = calendar.to_linear(rule.window_end);

    if now_ts < start {
        return Ok(Some(Trigger {
            kind: TriggerKind::Start,
            at: start,
        }));
    }
    if now_ts >= end {
        return Ok(None);
    }

    let found = find_interior_event(rule, now_ts, calendar)?;

    // A day-local window may run past the rule's last day.
    Ok(found.filter(|trigger| trigger.at <= end))
}

/// Repeatedly evaluate `rule`, feeding each trigger's time back in as the
/// next `now`, and collect up to `limit` triggers.
///
/// Stops early at the first `Ok(None)`.
pub fn upcoming_events<C: Calendar + ?Sized>(
    rule: &RecurrenceRule,
    now: NaiveDateTime,
    limit: usize,
    calendar: &C,
) -> Result<Vec<Trigger>> {
    let mut triggers = Vec::with_capacity(limit);
    let mut cursor = now;

    while triggers.len() < limit {
        let Some(trigger) = find_next_event(rule, cursor, calendar)? else {
            break;
        };
        cursor = calendar
            .from_linear(trigger.at)
            .ok_or(RuleError::OutOfRange(trigger.at))?;
        triggers.push(trigger);
    }

    Ok(triggers)
}

/// Lazy run of consecutive candidate dates: the date before `now`'s date,
/// then the following dates, [`CANDIDATE_DAYS`] in total.
///
/// Dates step on the civil calendar, so a 23- or 25-hour DST day neither
/// skips nor repeats a date.
#[derive(Debug, Clone)]
pub struct CandidateDays {
    next: Option<NaiveDate>,
    remaining: usize,
}

impl CandidateDays {
    pub fn around(today: NaiveDate) -> Self {
        Self {
            next: today.pred_opt(),
            remaining: CANDIDATE_DAYS,
        }
    }
}

impl Iterator for CandidateDays {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if self.remaining == 0 {
            return None;
        }
        let date = self.next?;
        self.next = date.succ_opt();
        self.remaining -= 1;
        Some(date)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

fn find_interior_event<C: Calendar + ?Sized>(
    rule: &RecurrenceRule,
    now_ts: i64,
    calendar: &C,
) -> Result<Option<Trigger>> {
    let today = calendar
        .from_linear(now_ts)
        .ok_or(RuleError::OutOfRange(now_ts))?
        .date();

    for date in CandidateDays::around(today) {
        let weekday = calendar.weekday_of(date.and_time(rule.window_start.time()));
        if !rule.weekday_mask.contains_index(weekday) {
            trace!(%date, weekday, "weekday masked out");
            continue;
        }

        let (local_start, local_end) = day_window(rule, date, calendar)?;
        trace!(%date, local_start, local_end, "candidate day");

        if now_ts < local_start {
            return Ok(Some(Trigger {
                kind: TriggerKind::Start,
                at: local_start,
            }));
        }
        if now_ts >= local_end {
            continue;
        }

        let (landed, steps) = step_past(rule, local_start, local_end, now_ts);
        if landed > local_end {
            continue;
        }
        // The cap only counts landings inside the window; reaching it ends
        // the whole search.
        if let Some(limit) = rule.effective_limit() {
            if steps >= limit {
                return Ok(None);
            }
        }
        let kind = match rule.frequency {
            Frequency::Limits => TriggerKind::End,
            _ => TriggerKind::Recur,
        };
        return Ok(Some(Trigger { kind, at: landed }));
    }

    Ok(None)
}

/// The rule's daily start and end times re-anchored to `day`'s date.
/// A window whose end is not after its start crosses midnight and ends on
/// the following date.
fn day_window<C: Calendar + ?Sized>(
    rule: &RecurrenceRule,
    date: NaiveDate,
    calendar: &C,
) -> Result<(i64, i64)> {
    let start = calendar.to_linear(date.and_time(rule.window_start.time()));
    let mut end = calendar.to_linear(date.and_time(rule.window_end.time()));
    if end <= start {
        let next = date.succ_opt().ok_or(RuleError::OutOfRange(end))?;
        end = calendar.to_linear(next.and_time(rule.window_end.time()));
    }
    Ok((start, end))
}

/// Step from `local_start` until strictly past `now_ts`. Returns the landing
/// time and the number of steps taken.
fn step_past(rule: &RecurrenceRule, local_start: i64, local_end: i64, now_ts: i64) -> (i64, u32) {
    let Some(unit) = rule.frequency.unit_seconds() else {
        // Limits: the single step is the window end.
        return (local_end, 1);
    };

    let step = unit * i64::from(rule.interval);
    let steps = (now_ts - local_start).div_euclid(step) + 1;
    let landed = local_start + steps * step;
    (landed, u32::try_from(steps).unwrap_or(u32::MAX))
}
