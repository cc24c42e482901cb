//! Weekly recurring schedule rows.

use carebook_core::schedule::WeeklyPattern;
use carebook_core::types::{EntityId, Timestamp};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `schedule_patterns` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SchedulePattern {
    pub id: EntityId,
    pub child_id: EntityId,
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
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SchedulePattern {
    /// The pattern as the schedule resolver sees it.
    pub fn weekly(&self) -> WeeklyPattern {
        WeeklyPattern {
            monday: self.monday,
            tuesday: self.tuesday,
            wednesday: self.wednesday,
            thursday: self.thursday,
            friday: self.friday,
            saturday: self.saturday,
            sunday: self.sunday,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            is_active: self.is_active,
        }
    }
}
