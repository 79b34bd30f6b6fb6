//! RFC 5545 RRULE import and export.
//!
//! Only the subset a [`RecurrenceRule`] can express survives the trip:
//! `FREQ=SECONDLY|MINUTELY|HOURLY`, `INTERVAL`, plain `BYDAY` codes and
//! `COUNT`. `COUNT` maps onto the per-day-window occurrence cap. Parsing and
//! validation of the RRULE text is done by the `rrule` crate.

use chrono::NaiveDateTime;
use rrule::{Frequency as RruleFrequency, NWeekday, RRuleSet};

use crate::error::{Result, RuleError};
use crate::rule::{Frequency, RecurrenceRule, WeekdayMask};

impl RecurrenceRule {
    /// Build an enabled rule from RRULE text over the given window.
    ///
    /// A missing `BYDAY` selects every day. `UNTIL` is accepted but ignored;
    /// the window bounds the rule.
    ///
    /// # Errors
    /// Returns `RuleError::InvalidRrule` if the text is unparseable or uses
    /// ordinal weekdays (`2MO`), and `RuleError::InvalidFrequency` for
    /// frequencies coarser than hourly.
    pub fn from_rrule(
        rrule: &str,
        window_start: NaiveDateTime,
        window_end: NaiveDateTime,
    ) -> Result<Self> {
        let rrule = rrule.trim();
        let rrule = rrule.strip_prefix("RRULE:").unwrap_or(rrule);
        if rrule.is_empty() {
            return Err(RuleError::InvalidRrule("empty RRULE string".to_string()));
        }

        // The rrule crate wants a DTSTART; the window start stands in for it.
        let text = format!(
            "DTSTART;TZID=UTC:{}\nRRULE:{}",
            window_start.format("%Y%m%dT%H%M%S"),
            rrule
        );
        let set: RRuleSet = text
            .parse()
            .map_err(|e| RuleError::InvalidRrule(format!("{}", e)))?;

        let parsed = match &set.get_rrule()[..] {
            [single] => single,
            _ => {
                return Err(RuleError::InvalidRrule(
                    "expected exactly one RRULE".to_string(),
                ))
            }
        };

        let frequency = match parsed.get_freq() {
            RruleFrequency::Secondly => Frequency::Secondly,
            RruleFrequency::Minutely => Frequency::Minutely,
            RruleFrequency::Hourly => Frequency::Hourly,
            other => return Err(RuleError::InvalidFrequency(format!("{:?}", other))),
        };

        let mut weekday_mask = WeekdayMask::EMPTY;
        for day in parsed.get_by_weekday() {
            match day {
                NWeekday::Every(weekday) => {
                    weekday_mask = weekday_mask | WeekdayMask::from(*weekday);
                }
                NWeekday::Nth(..) => {
                    return Err(RuleError::InvalidRrule(format!(
                        "ordinal BYDAY {:?} is not supported",
                        day
                    )))
                }
            }
        }
        if weekday_mask == WeekdayMask::EMPTY {
            weekday_mask = WeekdayMask::EVERYDAY;
        }

        Ok(Self {
            window_start,
            window_end,
            frequency,
            interval: u32::from(parsed.get_interval()),
            weekday_mask,
            occurrence_limit: parsed.get_count(),
            enabled: true,
        })
    }

    /// Render the repeat part of this rule as RRULE text, e.g.
    /// `FREQ=MINUTELY;INTERVAL=5;BYDAY=MO,TU,WE,TH,FR`.
    ///
    /// Returns `None` for [`Frequency::Limits`], which has no RRULE
    /// counterpart.
    pub fn to_rrule(&self) -> Option<String> {
        let freq = match self.frequency {
            Frequency::Limits => return None,
            Frequency::Secondly => "SECONDLY",
            Frequency::Minutely => "MINUTELY",
            Frequency::Hourly => "HOURLY",
        };

        let mut text = format!(
            "FREQ={};INTERVAL={};BYDAY={}",
            freq,
            self.interval,
            self.weekday_mask.codes().join(",")
        );
        if let Some(count) = self.effective_limit() {
            text.push_str(&format!(";COUNT={}", count));
        }
        Some(text)
    }
}
