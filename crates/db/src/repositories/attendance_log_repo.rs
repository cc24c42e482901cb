//! Repository for the `attendance_logs` table.
//!
//! Reads select by `checked_in_at` within a UTC window computed from the
//! facility-local day. Inserts also store that local day in
//! `attendance_date`, which backs the one-open-log-per-day unique index.

use carebook_core::clock::DayWindow;
use carebook_core::presence::CheckInMethod;
use carebook_core::types::{EntityId, Timestamp};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::attendance_log::{AttendanceLog, CreateAttendanceLog};

/// Column list for the `attendance_logs` table.
const COLUMNS: &str = "id, child_id, facility_id, attendance_date, checked_in_at, \
                       checked_out_at, check_in_method, check_out_method, created_at";

pub struct AttendanceLogRepo;

impl AttendanceLogRepo {
    /// The child's open log checked in within `window`, if any.
    pub async fn find_open_in_window(
        pool: &PgPool,
        child_id: EntityId,
        facility_id: EntityId,
        window: DayWindow,
    ) -> Result<Option<AttendanceLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM attendance_logs \
             WHERE child_id = $1 AND facility_id = $2 \
               AND checked_in_at >= $3 AND checked_in_at < $4 \
               AND checked_out_at IS NULL \
             ORDER BY checked_in_at DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, AttendanceLog>(&query)
            .bind(child_id)
            .bind(facility_id)
            .bind(window.start)
            .bind(window.end)
            .fetch_optional(pool)
            .await
    }

    /// The child's earliest log, open or closed, checked in within `window`.
    ///
    /// Earliest, so that repeated check-ins keep reporting the original
    /// check-in time.
    pub async fn find_first_in_window(
        pool: &PgPool,
        child_id: EntityId,
        facility_id: EntityId,
        window: DayWindow,
    ) -> Result<Option<AttendanceLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM attendance_logs \
             WHERE child_id = $1 AND facility_id = $2 \
               AND checked_in_at >= $3 AND checked_in_at < $4 \
             ORDER BY checked_in_at ASC \
             LIMIT 1"
        );
        sqlx::query_as::<_, AttendanceLog>(&query)
            .bind(child_id)
            .bind(facility_id)
            .bind(window.start)
            .bind(window.end)
            .fetch_optional(pool)
            .await
    }

    /// Every log of a facility checked in within `window`.
    pub async fn list_in_window(
        pool: &PgPool,
        facility_id: EntityId,
        window: DayWindow,
    ) -> Result<Vec<AttendanceLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM attendance_logs \
             WHERE facility_id = $1 AND checked_in_at >= $2 AND checked_in_at < $3 \
             ORDER BY child_id, checked_in_at"
        );
        sqlx::query_as::<_, AttendanceLog>(&query)
            .bind(facility_id)
            .bind(window.start)
            .bind(window.end)
            .fetch_all(pool)
            .await
    }

    /// Insert a new open log.
    ///
    /// Fails with a unique violation on `uq_attendance_logs_open_per_day`
    /// when the child already has an open log for the day.
    pub async fn create<'e, E>(
        executor: E,
        input: &CreateAttendanceLog,
    ) -> Result<AttendanceLog, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO attendance_logs \
                (id, child_id, facility_id, attendance_date, checked_in_at, check_in_method) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AttendanceLog>(&query)
            .bind(Uuid::new_v4())
            .bind(input.child_id)
            .bind(input.facility_id)
            .bind(input.attendance_date)
            .bind(input.checked_in_at)
            .bind(input.check_in_method.as_str())
            .fetch_one(executor)
            .await
    }

    /// Set the check-out of a log that is still open.
    ///
    /// Returns `None` if the log does not exist or was already closed.
    pub async fn close(
        pool: &PgPool,
        id: EntityId,
        checked_out_at: Timestamp,
        method: CheckInMethod,
    ) -> Result<Option<AttendanceLog>, sqlx::Error> {
        let query = format!(
            "UPDATE attendance_logs \
             SET checked_out_at = $2, check_out_method = $3 \
             WHERE id = $1 AND checked_out_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AttendanceLog>(&query)
            .bind(id)
            .bind(checked_out_at)
            .bind(method.as_str())
            .fetch_optional(pool)
            .await
    }
}
