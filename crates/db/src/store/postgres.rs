use carebook_core::clock::DayWindow;
use carebook_core::presence::CheckInMethod;
use carebook_core::schedule::DayOfWeek;
use carebook_core::types::{EntityId, Timestamp};
use chrono::NaiveDate;

use super::{AttendanceStore, StoreResult};
use crate::models::attendance_log::{AttendanceLog, CreateAttendanceLog};
use crate::models::child::{Child, ChildClass};
use crate::models::daily_attendance::{DailyAttendanceRecord, UpsertDailyAttendance};
use crate::models::schedule_pattern::SchedulePattern;
use crate::models::timetable::TimetableSlot;
use crate::repositories::{
    AttendanceLogRepo, ChildRepo, DailyAttendanceRepo, SchedulePatternRepo, TimetableRepo,
};
use crate::DbPool;

/// [`AttendanceStore`] over a PostgreSQL pool. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PgAttendanceStore {
    pool: DbPool,
}

impl PgAttendanceStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl AttendanceStore for PgAttendanceStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(crate::health_check(&self.pool).await?)
    }

    async fn find_child(
        &self,
        child_id: EntityId,
        facility_id: EntityId,
    ) -> StoreResult<Option<Child>> {
        Ok(ChildRepo::find_in_facility(&self.pool, child_id, facility_id).await?)
    }

    async fn list_children(&self, facility_id: EntityId) -> StoreResult<Vec<Child>> {
        Ok(ChildRepo::list_by_facility(&self.pool, facility_id).await?)
    }

    async fn list_child_classes(&self, child_id: EntityId) -> StoreResult<Vec<ChildClass>> {
        Ok(ChildRepo::list_classes(&self.pool, child_id).await?)
    }

    async fn list_facility_classes(&self, facility_id: EntityId) -> StoreResult<Vec<ChildClass>> {
        Ok(ChildRepo::list_classes_for_facility(&self.pool, facility_id).await?)
    }

    async fn list_schedule_patterns(
        &self,
        facility_id: EntityId,
        date: NaiveDate,
    ) -> StoreResult<Vec<SchedulePattern>> {
        Ok(SchedulePatternRepo::list_covering(&self.pool, facility_id, date).await?)
    }

    async fn list_child_patterns(
        &self,
        child_id: EntityId,
        date: NaiveDate,
    ) -> StoreResult<Vec<SchedulePattern>> {
        Ok(SchedulePatternRepo::list_covering_for_child(&self.pool, child_id, date).await?)
    }

    async fn list_timetable(
        &self,
        facility_id: EntityId,
        day: DayOfWeek,
    ) -> StoreResult<Vec<TimetableSlot>> {
        Ok(TimetableRepo::list_for_facility_day(&self.pool, facility_id, day.iso_number()).await?)
    }

    async fn find_daily_record(
        &self,
        child_id: EntityId,
        date: NaiveDate,
    ) -> StoreResult<Option<DailyAttendanceRecord>> {
        Ok(DailyAttendanceRepo::find(&self.pool, child_id, date).await?)
    }

    async fn list_daily_records(
        &self,
        facility_id: EntityId,
        date: NaiveDate,
    ) -> StoreResult<Vec<DailyAttendanceRecord>> {
        Ok(DailyAttendanceRepo::list_for_facility(&self.pool, facility_id, date).await?)
    }

    async fn upsert_daily_record(
        &self,
        input: &UpsertDailyAttendance,
    ) -> StoreResult<DailyAttendanceRecord> {
        Ok(DailyAttendanceRepo::upsert(&self.pool, input).await?)
    }

    async fn find_open_log(
        &self,
        child_id: EntityId,
        facility_id: EntityId,
        window: DayWindow,
    ) -> StoreResult<Option<AttendanceLog>> {
        Ok(AttendanceLogRepo::find_open_in_window(&self.pool, child_id, facility_id, window).await?)
    }

    async fn find_first_log(
        &self,
        child_id: EntityId,
        facility_id: EntityId,
        window: DayWindow,
    ) -> StoreResult<Option<AttendanceLog>> {
        Ok(AttendanceLogRepo::find_first_in_window(&self.pool, child_id, facility_id, window).await?)
    }

    async fn list_logs(
        &self,
        facility_id: EntityId,
        window: DayWindow,
    ) -> StoreResult<Vec<AttendanceLog>> {
        Ok(AttendanceLogRepo::list_in_window(&self.pool, facility_id, window).await?)
    }

    async fn create_log(&self, input: &CreateAttendanceLog) -> StoreResult<AttendanceLog> {
        Ok(AttendanceLogRepo::create(&self.pool, input).await?)
    }

    async fn close_log(
        &self,
        log_id: EntityId,
        checked_out_at: Timestamp,
        method: CheckInMethod,
    ) -> StoreResult<Option<AttendanceLog>> {
        Ok(AttendanceLogRepo::close(&self.pool, log_id, checked_out_at, method).await?)
    }

    async fn create_log_with_daily_record(
        &self,
        log: &CreateAttendanceLog,
        daily: &UpsertDailyAttendance,
    ) -> StoreResult<(AttendanceLog, DailyAttendanceRecord)> {
        let mut tx = self.pool.begin().await?;
        let created = AttendanceLogRepo::create(&mut *tx, log).await?;
        let record = DailyAttendanceRepo::upsert(&mut *tx, daily).await?;
        tx.commit().await?;
        Ok((created, record))
    }
}
