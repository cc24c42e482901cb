//! Check-in/check-out event rows.

use carebook_core::presence::{AttendanceSpan, CheckInMethod};
use carebook_core::types::{EntityId, Timestamp};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `attendance_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttendanceLog {
    pub id: EntityId,
    pub child_id: EntityId,
    pub facility_id: EntityId,
    pub attendance_date: NaiveDate,
    pub checked_in_at: Timestamp,
    pub checked_out_at: Option<Timestamp>,
    pub check_in_method: String,
    pub check_out_method: Option<String>,
    pub created_at: Timestamp,
}

impl AttendanceLog {
    pub fn method(&self) -> Option<CheckInMethod> {
        self.check_in_method.parse().ok()
    }
}

impl AttendanceSpan for AttendanceLog {
    fn checked_in_at(&self) -> Timestamp {
        self.checked_in_at
    }

    fn checked_out_at(&self) -> Option<Timestamp> {
        self.checked_out_at
    }
}

/// DTO for opening a new log.
#[derive(Debug, Clone)]
pub struct CreateAttendanceLog {
    pub child_id: EntityId,
    pub facility_id: EntityId,
    /// Facility-local date of `checked_in_at`.
    pub attendance_date: NaiveDate,
    pub checked_in_at: Timestamp,
    pub check_in_method: CheckInMethod,
}
