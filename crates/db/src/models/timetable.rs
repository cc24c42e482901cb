//! School weekday timetable rows.

use carebook_core::types::EntityId;
use chrono::NaiveTime;
use serde::Serialize;
use sqlx::FromRow;

/// A row from `school_timetables`: one grade's times on one weekday.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TimetableSlot {
    pub school_id: EntityId,
    pub grade: i16,
    /// ISO weekday, Monday = 1.
    pub day_of_week: i16,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}
