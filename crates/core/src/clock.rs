//! Facility-local calendar arithmetic.
//!
//! Every "today" in the attendance domain is the facility's local calendar
//! day, not the UTC day. A child scanning in at 08:30 local time (23:30 UTC
//! the previous day for a UTC+9 facility) belongs to the local date.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Default facility offset from UTC, in minutes (UTC+9).
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 540;

/// The UTC bounds of one facility-local calendar day.
///
/// Half-open: `start` is local 00:00:00 and `end` is the next local
/// midnight, so every instant up to 23:59:59.999 is contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl DayWindow {
    pub fn contains(&self, at: Timestamp) -> bool {
        at >= self.start && at < self.end
    }
}

/// Supplies "now" and converts instants into the facility's local calendar.
///
/// A clock may be frozen at a fixed instant, which is how tests pin the
/// current day and wall-clock time.
#[derive(Debug, Clone, Copy)]
pub struct FacilityClock {
    offset: FixedOffset,
    frozen_at: Option<Timestamp>,
}

impl FacilityClock {
    /// Build a clock for a facility `offset_minutes` east of UTC.
    pub fn new(offset_minutes: i32) -> Result<Self, CoreError> {
        let offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "UTC offset of {offset_minutes} minutes is out of range"
                ))
            })?;
        Ok(Self {
            offset,
            frozen_at: None,
        })
    }

    /// Pin this clock to a fixed instant.
    pub fn frozen_at(mut self, at: Timestamp) -> Self {
        self.frozen_at = Some(at);
        self
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn now(&self) -> Timestamp {
        self.frozen_at.unwrap_or_else(Utc::now)
    }

    pub fn local(&self, at: Timestamp) -> DateTime<FixedOffset> {
        at.with_timezone(&self.offset)
    }

    /// The facility-local calendar date of an instant.
    pub fn date_of(&self, at: Timestamp) -> NaiveDate {
        self.local(at).date_naive()
    }

    /// The facility-local wall-clock time of an instant.
    pub fn time_of(&self, at: Timestamp) -> NaiveTime {
        self.local(at).time()
    }

    pub fn today(&self) -> NaiveDate {
        self.date_of(self.now())
    }

    pub fn time_now(&self) -> NaiveTime {
        self.time_of(self.now())
    }

    /// UTC bounds of the given local date.
    pub fn day_window(&self, date: NaiveDate) -> DayWindow {
        let local_midnight = date.and_time(NaiveTime::MIN);
        let start = (local_midnight
            - Duration::seconds(i64::from(self.offset.local_minus_utc())))
        .and_utc();
        DayWindow {
            start,
            end: start + Duration::days(1),
        }
    }
}
