//! Schedule resolution: is a child expected on a given day?
//!
//! Two independent facts feed the answer. The weekly pattern is the default
//! recurring plan; the daily record is a one-day override that staff (or a
//! check-in) can force on or off regardless of the pattern.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Day of week
// ---------------------------------------------------------------------------

/// Weekday key of a schedule pattern column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// Weekday of a facility-local date.
    ///
    /// Callers must pass the local date (see [`crate::clock::FacilityClock`]),
    /// never a UTC date, or weekdays drift by one near midnight.
    pub fn of(date: NaiveDate) -> Self {
        date.weekday().into()
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }

    /// ISO-8601 weekday number, Monday = 1 through Sunday = 7.
    pub fn iso_number(self) -> i16 {
        match self {
            Self::Monday => 1,
            Self::Tuesday => 2,
            Self::Wednesday => 3,
            Self::Thursday => 4,
            Self::Friday => 5,
            Self::Saturday => 6,
            Self::Sunday => 7,
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(value: Weekday) -> Self {
        match value {
            Weekday::Mon => Self::Monday,
            Weekday::Tue => Self::Tuesday,
            Weekday::Wed => Self::Wednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
            Weekday::Sun => Self::Sunday,
        }
    }
}

// ---------------------------------------------------------------------------
// Weekly pattern
// ---------------------------------------------------------------------------

/// A child's recurring weekly plan with its validity window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyPattern {
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
    pub valid_from: NaiveDate,
    pub valid_to: Option<NaiveDate>,
    pub is_active: bool,
}

impl WeeklyPattern {
    pub fn expects(&self, day: DayOfWeek) -> bool {
        match day {
            DayOfWeek::Monday => self.monday,
            DayOfWeek::Tuesday => self.tuesday,
            DayOfWeek::Wednesday => self.wednesday,
            DayOfWeek::Thursday => self.thursday,
            DayOfWeek::Friday => self.friday,
            DayOfWeek::Saturday => self.saturday,
            DayOfWeek::Sunday => self.sunday,
        }
    }

    /// Whether this pattern is active and its window `[valid_from, valid_to]`
    /// contains `date`. An open-ended window has no `valid_to`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.is_active
            && self.valid_from <= date
            && self.valid_to.map_or(true, |to| date <= to)
    }
}

/// Pick the pattern relevant for `date` out of a child's pattern history.
///
/// Only active patterns whose window contains the date qualify. If windows
/// overlap, the most recently started one wins.
pub fn select_pattern<'a, I>(patterns: I, date: NaiveDate) -> Option<&'a WeeklyPattern>
where
    I: IntoIterator<Item = &'a WeeklyPattern>,
{
    patterns
        .into_iter()
        .filter(|p| p.covers(date))
        .max_by_key(|p| p.valid_from)
}

// ---------------------------------------------------------------------------
// Daily override
// ---------------------------------------------------------------------------

/// Status of a per-date override record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DailyStatus {
    /// Force the day on.
    Scheduled,
    /// Force the day off; the child will not come.
    Absent,
    /// Force the day off; staff acknowledged an unplanned visit.
    Irregular,
}

impl DailyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Absent => "absent",
            Self::Irregular => "irregular",
        }
    }
}

impl fmt::Display for DailyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DailyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "absent" => Ok(Self::Absent),
            "irregular" => Ok(Self::Irregular),
            other => Err(format!("Unknown daily attendance status: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Decide whether a child is expected on the day keyed by `day`.
///
/// `pattern` must already be the pattern covering the target date (see
/// [`select_pattern`]); `None` means no pattern applies and the base value
/// is `false`. A daily override always wins over the pattern.
pub fn is_scheduled_for_date(
    pattern: Option<&WeeklyPattern>,
    daily: Option<DailyStatus>,
    day: DayOfWeek,
) -> bool {
    match daily {
        Some(DailyStatus::Scheduled) => true,
        Some(DailyStatus::Absent | DailyStatus::Irregular) => false,
        None => pattern.is_some_and(|p| p.expects(day)),
    }
}

/// Select the covering pattern for `date` and resolve against the override.
pub fn is_scheduled_on<'a, I>(patterns: I, daily: Option<DailyStatus>, date: NaiveDate) -> bool
where
    I: IntoIterator<Item = &'a WeeklyPattern>,
{
    is_scheduled_for_date(select_pattern(patterns, date), daily, DayOfWeek::of(date))
}
