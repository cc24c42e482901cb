//! The attendance record store.
//!
//! [`AttendanceStore`] is the transactional record store the attendance
//! services program against: reads by key and by time window, inserts, and
//! the few updates the domain allows. [`PgAttendanceStore`] backs it with the
//! repositories in this crate. The `testing` feature adds an in-memory
//! implementation with fault injection.

use std::future::Future;

use carebook_core::clock::DayWindow;
use carebook_core::presence::CheckInMethod;
use carebook_core::schedule::DayOfWeek;
use carebook_core::types::{EntityId, Timestamp};
use chrono::NaiveDate;

use crate::models::attendance_log::{AttendanceLog, CreateAttendanceLog};
use crate::models::child::{Child, ChildClass};
use crate::models::daily_attendance::{DailyAttendanceRecord, UpsertDailyAttendance};
use crate::models::schedule_pattern::SchedulePattern;
use crate::models::timetable::TimetableSlot;

#[cfg(feature = "testing")]
pub mod memory;
mod postgres;

pub use postgres::PgAttendanceStore;

/// PostgreSQL SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Storage failure, with uniqueness violations split out so callers can
/// recover from lost insert races.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Duplicate value violates unique constraint: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return Self::UniqueViolation {
                    constraint: db_err.constraint().unwrap_or("unknown").to_string(),
                };
            }
        }
        Self::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Reads and writes the attendance core needs, and nothing more.
pub trait AttendanceStore: Clone + Send + Sync + 'static {
    /// Cheap connectivity check for health checks.
    fn ping(&self) -> impl Future<Output = StoreResult<()>> + Send;

    /// Look a child up by id *and* facility.
    fn find_child(
        &self,
        child_id: EntityId,
        facility_id: EntityId,
    ) -> impl Future<Output = StoreResult<Option<Child>>> + Send;

    fn list_children(
        &self,
        facility_id: EntityId,
    ) -> impl Future<Output = StoreResult<Vec<Child>>> + Send;

    fn list_child_classes(
        &self,
        child_id: EntityId,
    ) -> impl Future<Output = StoreResult<Vec<ChildClass>>> + Send;

    fn list_facility_classes(
        &self,
        facility_id: EntityId,
    ) -> impl Future<Output = StoreResult<Vec<ChildClass>>> + Send;

    /// Active patterns whose validity window contains `date`.
    fn list_schedule_patterns(
        &self,
        facility_id: EntityId,
        date: NaiveDate,
    ) -> impl Future<Output = StoreResult<Vec<SchedulePattern>>> + Send;

    /// One child's active patterns whose validity window contains `date`.
    fn list_child_patterns(
        &self,
        child_id: EntityId,
        date: NaiveDate,
    ) -> impl Future<Output = StoreResult<Vec<SchedulePattern>>> + Send;

    fn list_timetable(
        &self,
        facility_id: EntityId,
        day: DayOfWeek,
    ) -> impl Future<Output = StoreResult<Vec<TimetableSlot>>> + Send;

    fn find_daily_record(
        &self,
        child_id: EntityId,
        date: NaiveDate,
    ) -> impl Future<Output = StoreResult<Option<DailyAttendanceRecord>>> + Send;

    fn list_daily_records(
        &self,
        facility_id: EntityId,
        date: NaiveDate,
    ) -> impl Future<Output = StoreResult<Vec<DailyAttendanceRecord>>> + Send;

    fn upsert_daily_record(
        &self,
        input: &UpsertDailyAttendance,
    ) -> impl Future<Output = StoreResult<DailyAttendanceRecord>> + Send;

    fn find_open_log(
        &self,
        child_id: EntityId,
        facility_id: EntityId,
        window: DayWindow,
    ) -> impl Future<Output = StoreResult<Option<AttendanceLog>>> + Send;

    /// The earliest log, open or closed, checked in within `window`.
    fn find_first_log(
        &self,
        child_id: EntityId,
        facility_id: EntityId,
        window: DayWindow,
    ) -> impl Future<Output = StoreResult<Option<AttendanceLog>>> + Send;

    fn list_logs(
        &self,
        facility_id: EntityId,
        window: DayWindow,
    ) -> impl Future<Output = StoreResult<Vec<AttendanceLog>>> + Send;

    /// Insert a log. A second open log for the same child, facility and day
    /// fails with [`StoreError::UniqueViolation`].
    fn create_log(
        &self,
        input: &CreateAttendanceLog,
    ) -> impl Future<Output = StoreResult<AttendanceLog>> + Send;

    /// Close a log if it is still open; `None` otherwise.
    fn close_log(
        &self,
        log_id: EntityId,
        checked_out_at: Timestamp,
        method: CheckInMethod,
    ) -> impl Future<Output = StoreResult<Option<AttendanceLog>>> + Send;

    /// Insert a log and upsert the daily record atomically: either both
    /// writes land or neither does.
    fn create_log_with_daily_record(
        &self,
        log: &CreateAttendanceLog,
        daily: &UpsertDailyAttendance,
    ) -> impl Future<Output = StoreResult<(AttendanceLog, DailyAttendanceRecord)>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unique_violations_are_flagged() {
        let dup = StoreError::UniqueViolation {
            constraint: "uq_attendance_logs_open_per_day".into(),
        };
        assert!(dup.is_unique_violation());
        assert!(!StoreError::from(sqlx::Error::RowNotFound).is_unique_violation());
        assert!(!StoreError::from(sqlx::Error::PoolClosed).is_unique_violation());
    }
}
