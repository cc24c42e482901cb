//! Repository for the `daily_attendance` table.

use carebook_core::types::EntityId;
use chrono::NaiveDate;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::daily_attendance::{DailyAttendanceRecord, UpsertDailyAttendance};

/// Column list for the `daily_attendance` table.
const COLUMNS: &str = "id, child_id, facility_id, attendance_date, status, created_by, \
                       updated_by, created_at, updated_at";

pub struct DailyAttendanceRepo;

impl DailyAttendanceRepo {
    pub async fn find(
        pool: &PgPool,
        child_id: EntityId,
        date: NaiveDate,
    ) -> Result<Option<DailyAttendanceRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM daily_attendance WHERE child_id = $1 AND attendance_date = $2"
        );
        sqlx::query_as::<_, DailyAttendanceRecord>(&query)
            .bind(child_id)
            .bind(date)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_facility(
        pool: &PgPool,
        facility_id: EntityId,
        date: NaiveDate,
    ) -> Result<Vec<DailyAttendanceRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM daily_attendance \
             WHERE facility_id = $1 AND attendance_date = $2"
        );
        sqlx::query_as::<_, DailyAttendanceRecord>(&query)
            .bind(facility_id)
            .bind(date)
            .fetch_all(pool)
            .await
    }

    /// Insert or update the child's record for the date in one statement.
    ///
    /// The `(child_id, attendance_date)` unique constraint makes concurrent
    /// upserts converge on a single row. `created_by` is kept on update.
    pub async fn upsert<'e, E>(
        executor: E,
        input: &UpsertDailyAttendance,
    ) -> Result<DailyAttendanceRecord, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO daily_attendance \
                (id, child_id, facility_id, attendance_date, status, created_by, updated_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $6) \
             ON CONFLICT (child_id, attendance_date) \
             DO UPDATE SET status = EXCLUDED.status, \
                           updated_by = EXCLUDED.updated_by, \
                           updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DailyAttendanceRecord>(&query)
            .bind(Uuid::new_v4())
            .bind(input.child_id)
            .bind(input.facility_id)
            .bind(input.attendance_date)
            .bind(input.status.as_str())
            .bind(input.actor_id)
            .fetch_one(executor)
            .await
    }
}
