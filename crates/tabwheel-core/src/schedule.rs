//! Schedule evaluation: decides whether a config entry is currently
//! applicable given its day-of-week and time-of-day window.
//!
//! Pure and stateless — `now` is always passed in, never read from the
//! system clock, and the result is recomputed fresh on every call so
//! eligibility tracks wall-clock drift exactly.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::types::TabEntry;

// ─── Days ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Day {
    pub const ALL: [Self; 7] = [
        Self::Mon,
        Self::Tue,
        Self::Wed,
        Self::Thu,
        Self::Fri,
        Self::Sat,
        Self::Sun,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mon => "mon",
            Self::Tue => "tue",
            Self::Wed => "wed",
            Self::Thu => "thu",
            Self::Fri => "fri",
            Self::Sat => "sat",
            Self::Sun => "sun",
        }
    }

    pub fn weekday(self) -> Weekday {
        match self {
            Self::Mon => Weekday::Mon,
            Self::Tue => Weekday::Tue,
            Self::Wed => Weekday::Wed,
            Self::Thu => Weekday::Thu,
            Self::Fri => Weekday::Fri,
            Self::Sat => Weekday::Sat,
            Self::Sun => Weekday::Sun,
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Day {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mon" => Ok(Self::Mon),
            "tue" => Ok(Self::Tue),
            "wed" => Ok(Self::Wed),
            "thu" => Ok(Self::Thu),
            "fri" => Ok(Self::Fri),
            "sat" => Ok(Self::Sat),
            "sun" => Ok(Self::Sun),
            _ => Err(format!("unknown day: {s}")),
        }
    }
}

// ─── Window ───────────────────────────────────────────────────────

/// Day/time visibility window for an entry.
///
/// Absent `days` means every day; absent `open` or `close` means no
/// time-of-day restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub days: Option<BTreeSet<Day>>,
    pub open: Option<NaiveTime>,
    pub close: Option<NaiveTime>,
}

/// Whether `entry` may be open at `now` (local wall clock).
pub fn is_applicable(entry: &TabEntry, now: NaiveDateTime) -> bool {
    let Some(window) = &entry.schedule else {
        return true;
    };
    day_applicable(window, now) && time_applicable(window, now)
}

fn day_applicable(window: &ScheduleWindow, now: NaiveDateTime) -> bool {
    match &window.days {
        None => true,
        Some(days) => days.iter().any(|d| d.weekday() == now.weekday()),
    }
}

/// Inclusive on both bounds: applicable at exactly `open` and exactly
/// `close`. A window with `close` earlier than `open` is never applicable
/// within a single day — overnight wraparound is intentionally not handled.
fn time_applicable(window: &ScheduleWindow, now: NaiveDateTime) -> bool {
    let (Some(open), Some(close)) = (window.open, window.close) else {
        return true;
    };
    let open_at = now.date().and_time(open);
    let close_at = now.date().and_time(close);
    open_at <= now && now <= close_at
}

// ─── Tests ────────────────────────────────────────────────────────
