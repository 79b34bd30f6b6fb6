//! A bounded set of schedules, grouped so that only the earliest upcoming
//! event per group is kept.
//!
//! Schedules in the same group stand for actions that must not fire on top
//! of each other (several candidate timings for one output, say). Schedules
//! in different groups are independent and are all evaluated in one pass.
//!
//! ```
//! use cadence::{civil, Frequency, RecurrenceRule, Scheduler, WeekdayMask};
//!
//! let mut scheduler = Scheduler::new();
//!
//! let mut rule = RecurrenceRule::new(
//!     civil(2016, 10, 24, 8, 0, 0).unwrap(),
//!     civil(2018, 10, 24, 16, 0, 0).unwrap(),
//! );
//! rule.frequency = Frequency::Minutely;
//! rule.weekday_mask = WeekdayMask::EVERYDAY;
//! rule.enabled = true;
//!
//! rule.interval = 10;
//! scheduler.add(2, rule.clone()).unwrap();
//! rule.interval = 3;
//! let fastest = scheduler.add(2, rule).unwrap();
//!
//! let faults = scheduler.update_events(civil(2018, 2, 23, 11, 20, 0).unwrap());
//! assert!(faults.is_empty());
//! assert_eq!(scheduler.get_event(2).unwrap().schedule_id, fastest);
//! ```

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::{Calendar, UtcCalendar};
use crate::engine::{find_next_event, Trigger, TriggerKind};
use crate::error::{RuleError, SchedulerError};
use crate::rule::RecurrenceRule;

/// Default number of schedules a [`Scheduler`] can hold.
pub const DEFAULT_CAPACITY: usize = 5;

/// Caller-chosen partition key. Schedules sharing a group compete for one
/// event slot.
pub type GroupId = u32;

/// Sequential identity handed out by [`Scheduler::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleId(pub u32);

impl fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub group: GroupId,
    pub rule: RecurrenceRule,
}

/// The earliest upcoming event of one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: TriggerKind,
    /// Linear timestamp (seconds).
    pub when: i64,
    pub schedule_id: ScheduleId,
    pub group: GroupId,
}

impl Event {
    fn from_trigger(trigger: Trigger, schedule: &Schedule) -> Self {
        Self {
            kind: trigger.kind,
            when: trigger.at,
            schedule_id: schedule.id,
            group: schedule.group,
        }
    }
}

/// An enabled schedule whose rule could not be evaluated during
/// [`Scheduler::update_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleFault {
    pub schedule_id: ScheduleId,
    pub group: GroupId,
    pub error: RuleError,
}

/// Owns up to `CAPACITY` schedules and the per-group events derived from
/// them.
#[derive(Debug, Clone)]
pub struct Scheduler<C = UtcCalendar, const CAPACITY: usize = DEFAULT_CAPACITY> {
    calendar: C,
    schedules: Vec<Schedule>,
    events: Vec<Event>,
    next_id: u32,
}

impl Scheduler<UtcCalendar, DEFAULT_CAPACITY> {
    /// An empty scheduler on UTC civil time with the default capacity.
    pub fn new() -> Self {
        Self::with_calendar(UtcCalendar)
    }
}

impl Default for Scheduler<UtcCalendar, DEFAULT_CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Calendar, const CAPACITY: usize> Scheduler<C, CAPACITY> {
    pub fn with_calendar(calendar: C) -> Self {
        Self {
            calendar,
            schedules: Vec::with_capacity(CAPACITY),
            events: Vec::with_capacity(CAPACITY),
            next_id: 0,
        }
    }

    pub fn calendar(&self) -> &C {
        &self.calendar
    }

    pub fn capacity(&self) -> usize {
        CAPACITY
    }

    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }

    /// Schedules in insertion order.
    pub fn schedules(&self) -> &[Schedule] {
        &self.schedules
    }

    /// Events from the last [`Scheduler::update_events`], one per group, in
    /// order of each group's first enabled schedule.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Register `rule` under `group` and return its new id.
    ///
    /// Ids increase by one per successful call and are not reused until
    /// [`Scheduler::clear`]. A slot freed by [`Scheduler::remove_last`] can
    /// be filled again.
    ///
    /// # Errors
    /// [`SchedulerError::CapacityExceeded`] when `CAPACITY` schedules are
    /// already held, and [`SchedulerError::IdsExhausted`] once every id
    /// since the last [`Scheduler::clear`] has been handed out. Nothing
    /// changes in either case.
    pub fn add(
        &mut self,
        group: GroupId,
        rule: RecurrenceRule,
    ) -> Result<ScheduleId, SchedulerError> {
        if self.schedules.len() >= CAPACITY {
            return Err(SchedulerError::CapacityExceeded { capacity: CAPACITY });
        }

        let id = ScheduleId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or(SchedulerError::IdsExhausted)?;
        self.schedules.push(Schedule { id, group, rule });
        Ok(id)
    }

    /// Remove and return the most recently added schedule.
    ///
    /// # Errors
    /// [`SchedulerError::Empty`] when there is nothing to remove.
    pub fn remove_last(&mut self) -> Result<Schedule, SchedulerError> {
        self.schedules.pop().ok_or(SchedulerError::Empty)
    }

    /// Drop every schedule and event. Ids start again from zero.
    pub fn clear(&mut self) {
        self.schedules.clear();
        self.events.clear();
        self.next_id = 0;
    }

    pub fn get_schedule(&self, id: ScheduleId) -> Option<&Schedule> {
        self.schedules.iter().find(|s| s.id == id)
    }

    pub fn get_event(&self, group: GroupId) -> Option<&Event> {
        self.events.iter().find(|e| e.group == group)
    }

    /// Rebuild the per-group events for `now`.
    ///
    /// Every enabled schedule is evaluated in insertion order. A group's slot
    /// goes to its first schedule with an event and is taken over only by a
    /// strictly earlier one, so ties go to the earlier-added schedule.
    /// Schedules with no upcoming event, and schedules whose rule fails
    /// validation, never occupy a slot; the failures are returned.
    pub fn update_events(&mut self, now: NaiveDateTime) -> Vec<ScheduleFault> {
        self.events.clear();
        let mut faults = Vec::new();

        for schedule in self.schedules.iter().filter(|s| s.rule.enabled) {
            match find_next_event(&schedule.rule, now, &self.calendar) {
                Ok(Some(trigger)) => {
                    merge_event(&mut self.events, Event::from_trigger(trigger, schedule));
                }
                Ok(None) => {}
                Err(error) => faults.push(ScheduleFault {
                    schedule_id: schedule.id,
                    group: schedule.group,
                    error,
                }),
            }
        }

        debug!(
            %now,
            schedules = self.schedules.len(),
            groups = self.events.len(),
            faults = faults.len(),
            "updated scheduler events"
        );

        faults
    }
}

/// Earliest-wins merge into the per-group event list.
fn merge_event(events: &mut Vec<Event>, candidate: Event) {
    match events.iter_mut().find(|e| e.group == candidate.group) {
        Some(existing) => {
            if candidate.when < existing.when {
                *existing = candidate;
            }
        }
        None => events.push(candidate),
    }
}
