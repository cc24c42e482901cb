//! Per-date schedule override rows.

use carebook_core::schedule::DailyStatus;
use carebook_core::types::{EntityId, Timestamp};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `daily_attendance` table. At most one per child and date.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DailyAttendanceRecord {
    pub id: EntityId,
    pub child_id: EntityId,
    pub facility_id: EntityId,
    pub attendance_date: NaiveDate,
    pub status: String,
    pub created_by: Option<EntityId>,
    pub updated_by: Option<EntityId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DailyAttendanceRecord {
    /// Parsed status. The column is CHECK-constrained, so `None` only
    /// happens if the schema and this enum drift apart.
    pub fn daily_status(&self) -> Option<DailyStatus> {
        self.status.parse().ok()
    }
}

/// Set the status of a child's daily record, creating it if absent.
///
/// `actor_id` becomes `updated_by`, and also `created_by` on insert. `None`
/// marks a write made by a QR scan rather than by a staff member.
#[derive(Debug, Clone)]
pub struct UpsertDailyAttendance {
    pub child_id: EntityId,
    pub facility_id: EntityId,
    pub attendance_date: NaiveDate,
    pub status: DailyStatus,
    pub actor_id: Option<EntityId>,
}
