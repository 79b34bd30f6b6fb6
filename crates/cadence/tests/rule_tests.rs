//! Tests for rule construction, the weekday mask, serde shapes, and RRULE
//! import/export.

use cadence::{civil, Frequency, RecurrenceRule, RuleError, WeekdayMask};
use chrono::{NaiveDateTime, Weekday};

fn at(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> NaiveDateTime {
    civil(year, month, day, hour, min, sec).expect("valid civil date-time")
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

#[test]
fn default_rule_values() {
    let rule = RecurrenceRule::default();

    assert_eq!(rule.window_start, at(2016, 1, 1, 8, 0, 0));
    assert_eq!(rule.window_end, at(2020, 12, 31, 17, 0, 0));
    assert_eq!(rule.frequency, Frequency::Minutely);
    assert_eq!(rule.interval, 5);
    assert_eq!(rule.weekday_mask, WeekdayMask::WEEKDAYS);
    assert_eq!(rule.occurrence_limit, None);
    assert!(!rule.enabled);
}

#[test]
fn new_keeps_defaults_outside_the_window() {
    let rule = RecurrenceRule::new(at(2019, 5, 1, 6, 0, 0), at(2019, 6, 1, 7, 0, 0));

    assert_eq!(rule.window_start, at(2019, 5, 1, 6, 0, 0));
    assert_eq!(rule.window_end, at(2019, 6, 1, 7, 0, 0));
    assert_eq!(rule.interval, 5);
    assert!(!rule.enabled);
}

// ---------------------------------------------------------------------------
// WeekdayMask
// ---------------------------------------------------------------------------

#[test]
fn named_sets_match_their_days() {
    assert_eq!(
        WeekdayMask::WEEKDAYS,
        WeekdayMask::MONDAY
            | WeekdayMask::TUESDAY
            | WeekdayMask::WEDNESDAY
            | WeekdayMask::THURSDAY
            | WeekdayMask::FRIDAY
    );
    assert_eq!(
        WeekdayMask::WEEKENDS,
        WeekdayMask::SATURDAY | WeekdayMask::SUNDAY
    );
    assert_eq!(
        WeekdayMask::EVERYDAY,
        WeekdayMask::WEEKDAYS | WeekdayMask::WEEKENDS
    );
}

#[test]
fn sunday_is_the_high_bit() {
    assert_eq!(WeekdayMask::SUNDAY.bits(), 0x40);
    assert_eq!(WeekdayMask::SATURDAY.bits(), 0x01);
    assert!(WeekdayMask::SUNDAY.contains_index(0));
    assert!(WeekdayMask::SATURDAY.contains_index(6));
    assert!(!WeekdayMask::EVERYDAY.contains_index(7));
}

#[test]
fn contains_chrono_weekdays() {
    let mask = WeekdayMask::MONDAY | WeekdayMask::THURSDAY;

    assert!(mask.contains(Weekday::Mon));
    assert!(mask.contains(Weekday::Thu));
    assert!(!mask.contains(Weekday::Sun));
    assert_eq!(WeekdayMask::from(Weekday::Fri), WeekdayMask::FRIDAY);
}

#[test]
fn mask_validity() {
    assert!(WeekdayMask::EVERYDAY.is_valid());
    assert!(!WeekdayMask::EMPTY.is_valid());
    assert!(!WeekdayMask::from_bits(0x80).is_valid());
    assert!(!WeekdayMask::from_bits(0xFF).is_valid());
}

#[test]
fn mask_displays_day_codes() {
    let mask = WeekdayMask::SUNDAY | WeekdayMask::WEDNESDAY;

    assert_eq!(mask.to_string(), "SU,WE");
    assert_eq!(WeekdayMask::from_code("th"), Some(WeekdayMask::THURSDAY));
    assert_eq!(WeekdayMask::from_code("XX"), None);
}

// ---------------------------------------------------------------------------
// Serde
// ---------------------------------------------------------------------------

#[test]
fn rule_deserializes_with_defaults_for_missing_fields() {
    let json = r#"{
        "window_start": "2016-10-24T08:00:00",
        "window_end": "2018-10-24T16:00:00",
        "frequency": "hourly",
        "weekday_mask": ["MO", "WE", "FR"],
        "enabled": true
    }"#;

    let rule: RecurrenceRule = serde_json::from_str(json).expect("valid rule JSON");

    assert_eq!(rule.window_start, at(2016, 10, 24, 8, 0, 0));
    assert_eq!(rule.frequency, Frequency::Hourly);
    assert_eq!(rule.interval, 5);
    assert_eq!(
        rule.weekday_mask,
        WeekdayMask::MONDAY | WeekdayMask::WEDNESDAY | WeekdayMask::FRIDAY
    );
    assert!(rule.enabled);
}

#[test]
fn unknown_day_code_fails_to_deserialize() {
    let json = r#"{ "weekday_mask": ["MO", "XX"] }"#;

    assert!(serde_json::from_str::<RecurrenceRule>(json).is_err());
}

#[test]
fn unknown_frequency_fails_to_deserialize() {
    let json = r#"{ "frequency": "daily" }"#;

    assert!(serde_json::from_str::<RecurrenceRule>(json).is_err());
}

#[test]
fn empty_mask_deserializes_and_is_caught_by_validation() {
    let rule: RecurrenceRule = serde_json::from_str(r#"{ "weekday_mask": [] }"#).unwrap();

    assert_eq!(rule.weekday_mask, WeekdayMask::EMPTY);
    assert_eq!(
        cadence::validate(&rule, &cadence::UtcCalendar),
        Err(RuleError::InvalidWeekdayMask)
    );
}

#[test]
fn rule_serializes_mask_as_codes() {
    let mut rule = RecurrenceRule::default();
    rule.weekday_mask = WeekdayMask::WEEKENDS;

    let json = serde_json::to_value(&rule).unwrap();

    assert_eq!(json["weekday_mask"], serde_json::json!(["SU", "SA"]));
    assert_eq!(json["frequency"], "minutely");
}

// ---------------------------------------------------------------------------
// RRULE import
// ---------------------------------------------------------------------------

fn window() -> (NaiveDateTime, NaiveDateTime) {
    (at(2016, 10, 24, 20, 0, 0), at(2016, 12, 24, 8, 0, 0))
}

#[test]
fn import_minutely_with_byday() {
    let (start, end) = window();

    let rule = RecurrenceRule::from_rrule("FREQ=MINUTELY;INTERVAL=15;BYDAY=MO,TH", start, end)
        .expect("should import");

    assert_eq!(rule.frequency, Frequency::Minutely);
    assert_eq!(rule.interval, 15);
    assert_eq!(
        rule.weekday_mask,
        WeekdayMask::MONDAY | WeekdayMask::THURSDAY
    );
    assert_eq!(rule.window_start, start);
    assert_eq!(rule.window_end, end);
    assert_eq!(rule.occurrence_limit, None);
    assert!(rule.enabled);
}

#[test]
fn import_accepts_rrule_prefix_and_count() {
    let (start, end) = window();

    let rule = RecurrenceRule::from_rrule("RRULE:FREQ=HOURLY;INTERVAL=2;COUNT=4", start, end)
        .expect("should import");

    assert_eq!(rule.frequency, Frequency::Hourly);
    assert_eq!(rule.interval, 2);
    assert_eq!(rule.occurrence_limit, Some(4));
    assert_eq!(rule.weekday_mask, WeekdayMask::EVERYDAY);
}

#[test]
fn import_rejects_daily_frequency() {
    let (start, end) = window();

    assert!(matches!(
        RecurrenceRule::from_rrule("FREQ=DAILY", start, end),
        Err(RuleError::InvalidFrequency(_))
    ));
}

#[test]
fn import_rejects_ordinal_byday() {
    let (start, end) = window();

    assert!(matches!(
        RecurrenceRule::from_rrule("FREQ=HOURLY;BYDAY=2MO", start, end),
        Err(RuleError::InvalidRrule(_))
    ));
}

#[test]
fn import_rejects_garbage() {
    let (start, end) = window();

    assert!(matches!(
        RecurrenceRule::from_rrule("NOT A RULE", start, end),
        Err(RuleError::InvalidRrule(_))
    ));
    assert!(matches!(
        RecurrenceRule::from_rrule("   ", start, end),
        Err(RuleError::InvalidRrule(_))
    ));
}

// ---------------------------------------------------------------------------
// RRULE export
// ---------------------------------------------------------------------------

#[test]
fn export_renders_freq_interval_and_byday() {
    let mut rule = RecurrenceRule::default();
    rule.frequency = Frequency::Secondly;
    rule.interval = 30;
    rule.weekday_mask = WeekdayMask::WEDNESDAY;

    assert_eq!(
        rule.to_rrule().as_deref(),
        Some("FREQ=SECONDLY;INTERVAL=30;BYDAY=WE")
    );
}

#[test]
fn export_includes_count_only_when_bounded() {
    let mut rule = RecurrenceRule::default();
    rule.occurrence_limit = Some(0);
    assert!(!rule.to_rrule().unwrap().contains("COUNT"));

    rule.occurrence_limit = Some(6);
    assert!(rule.to_rrule().unwrap().ends_with(";COUNT=6"));
}

#[test]
fn export_of_limits_is_none() {
    let mut rule = RecurrenceRule::default();
    rule.frequency = Frequency::Limits;

    assert_eq!(rule.to_rrule(), None);
}

#[test]
fn exported_text_imports_back_to_the_same_repeat() {
    let mut rule = RecurrenceRule::default();
    rule.enabled = true;
    rule.frequency = Frequency::Hourly;
    rule.interval = 3;
    rule.weekday_mask = WeekdayMask::WEEKENDS;
    rule.occurrence_limit = Some(2);

    let text = rule.to_rrule().unwrap();
    let back = RecurrenceRule::from_rrule(&text, rule.window_start, rule.window_end).unwrap();

    assert_eq!(back, rule);
}
