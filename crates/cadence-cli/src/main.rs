//! `cadence` CLI: evaluate recurring schedules from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Next event per group, as of a given instant (UTC civil time)
//! cadence next -i schedules.json --now 2018-02-23T11:20:00
//!
//! # Same, in a time zone, as JSON
//! cadence next -i schedules.json --now 2018-02-23T11:20:00 --tz Europe/London --json
//!
//! # The next 5 triggers of every schedule
//! cadence upcoming -i schedules.json --now 2018-02-23T11:20:00 -n 5
//!
//! # Each schedule's repeat part as RRULE text
//! cadence rrule -i schedules.json
//! ```
//!
//! ## Schedule file
//!
//! ```json
//! { "schedules": [
//!     { "group": 1, "rule": { "window_start": "2016-10-24T08:00:00",
//!                             "window_end": "2018-10-24T16:00:00",
//!                             "frequency": "minutely", "interval": 5,
//!                             "weekday_mask": ["MO", "TU"], "enabled": true } },
//!     { "group": 2, "rrule": "FREQ=HOURLY;INTERVAL=2;BYDAY=SA,SU",
//!       "rule": { "window_start": "2016-10-24T08:00:00",
//!                 "window_end": "2018-10-24T16:00:00" } }
//! ] }
//! ```
//!
//! Missing rule fields take the library defaults. An `rrule` entry replaces
//! the repeat part of `rule` and enables it.

use anyhow::{Context, Result};
use cadence::{
    upcoming_events, Calendar, GroupId, RecurrenceRule, Scheduler, UtcCalendar, ZonedCalendar,
};
use chrono::NaiveDateTime;
use chrono_tz::Tz;
use clap::{ArgAction, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "cadence",
    version,
    about = "Evaluate windowed recurring schedules"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the next event of every group
    Next {
        /// Schedule file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Evaluation instant, e.g. 2018-02-23T11:20:00
        #[arg(long)]
        now: String,
        /// IANA time zone of the civil times (UTC if omitted)
        #[arg(long)]
        tz: Option<String>,
        /// Print events as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the next triggers of every schedule
    Upcoming {
        /// Schedule file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Evaluation instant, e.g. 2018-02-23T11:20:00
        #[arg(long)]
        now: String,
        /// Triggers to list per schedule
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,
        /// IANA time zone of the civil times (UTC if omitted)
        #[arg(long)]
        tz: Option<String>,
    },
    /// Print each schedule's repeat part as RRULE text
    Rrule {
        /// Schedule file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
}

#[derive(Deserialize)]
struct ScheduleFile {
    schedules: Vec<ScheduleEntry>,
}

#[derive(Deserialize)]
struct ScheduleEntry {
    group: GroupId,
    #[serde(default)]
    rule: RecurrenceRule,
    #[serde(default)]
    rrule: Option<String>,
}

/// Event as printed by `next --json`.
#[derive(Serialize)]
struct EventDto {
    group: GroupId,
    schedule_id: u32,
    kind: String,
    when: i64,
    local: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Next {
            input,
            now,
            tz,
            json,
        } => {
            let rules = load_rules(input.as_deref())?;
            let now = parse_now(&now)?;
            match parse_tz(tz.as_deref())? {
                Some(tz) => print_next(ZonedCalendar::new(tz), rules, now, json)?,
                None => print_next(UtcCalendar, rules, now, json)?,
            }
        }
        Commands::Upcoming {
            input,
            now,
            count,
            tz,
        } => {
            let rules = load_rules(input.as_deref())?;
            let now = parse_now(&now)?;
            match parse_tz(tz.as_deref())? {
                Some(tz) => print_upcoming(&ZonedCalendar::new(tz), &rules, now, count)?,
                None => print_upcoming(&UtcCalendar, &rules, now, count)?,
            }
        }
        Commands::Rrule { input } => {
            for (index, (group, rule)) in load_rules(input.as_deref())?.iter().enumerate() {
                match rule.to_rrule() {
                    Some(text) => println!("schedule {} (group {}): {}", index, group, text),
                    None => println!(
                        "schedule {} (group {}): window limits only, no RRULE form",
                        index, group
                    ),
                }
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print_next<C: Calendar>(
    calendar: C,
    rules: Vec<(GroupId, RecurrenceRule)>,
    now: NaiveDateTime,
    json: bool,
) -> Result<()> {
    let mut scheduler: Scheduler<C> = Scheduler::with_calendar(calendar);
    for (group, rule) in rules {
        scheduler
            .add(group, rule)
            .with_context(|| format!("Failed to register schedule for group {}", group))?;
    }

    let faults = scheduler.update_events(now);
    for fault in &faults {
        eprintln!(
            "warning: schedule {} (group {}) skipped: {}",
            fault.schedule_id, fault.group, fault.error
        );
    }

    let calendar = scheduler.calendar();
    if json {
        let events: Vec<EventDto> = scheduler
            .events()
            .iter()
            .map(|e| EventDto {
                group: e.group,
                schedule_id: e.schedule_id.0,
                kind: e.kind.to_string(),
                when: e.when,
                local: calendar.from_linear(e.when).map(|dt| dt.to_string()),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    if scheduler.events().is_empty() {
        println!("no upcoming events");
    }
    for event in scheduler.events() {
        println!(
            "group {}: {} at {} (schedule {})",
            event.group,
            event.kind,
            format_ts(calendar, event.when),
            event.schedule_id
        );
    }
    Ok(())
}

fn print_upcoming<C: Calendar>(
    calendar: &C,
    rules: &[(GroupId, RecurrenceRule)],
    now: NaiveDateTime,
    count: usize,
) -> Result<()> {
    for (index, (group, rule)) in rules.iter().enumerate() {
        println!("schedule {} (group {}):", index, group);
        match upcoming_events(rule, now, count, calendar) {
            Ok(triggers) if triggers.is_empty() => println!("  no upcoming events"),
            Ok(triggers) => {
                for trigger in triggers {
                    println!("  {} at {}", trigger.kind, format_ts(calendar, trigger.at));
                }
            }
            Err(e) => println!("  invalid rule: {}", e),
        }
    }
    Ok(())
}

fn format_ts<C: Calendar>(calendar: &C, ts: i64) -> String {
    calendar
        .from_linear(ts)
        .map(|dt| dt.to_string())
        .unwrap_or_else(|| format!("@{}", ts))
}

/// Read the schedule file and resolve any `rrule` entries into rules.
fn load_rules(path: Option<&str>) -> Result<Vec<(GroupId, RecurrenceRule)>> {
    let raw = read_input(path)?;
    let file: ScheduleFile =
        serde_json::from_str(&raw).context("Failed to parse schedule file")?;
    debug!(schedules = file.schedules.len(), "loaded schedule file");

    file.schedules
        .into_iter()
        .map(|entry| {
            let rule = match entry.rrule {
                Some(text) => {
                    RecurrenceRule::from_rrule(&text, entry.rule.window_start, entry.rule.window_end)
                        .with_context(|| format!("Failed to import RRULE '{}'", text))?
                }
                None => entry.rule,
            };
            Ok((entry.group, rule))
        })
        .collect()
}

fn parse_now(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .with_context(|| format!("Invalid --now '{}': expected YYYY-MM-DDTHH:MM:SS", raw))
}

fn parse_tz(raw: Option<&str>) -> Result<Option<Tz>> {
    raw.map(|name| {
        name.parse::<Tz>()
            .map_err(|_| anyhow::anyhow!("Unknown time zone: '{}'", name))
    })
    .transpose()
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}
