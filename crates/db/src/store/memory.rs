//! In-memory [`AttendanceStore`] for tests.
//!
//! Enforces the same uniqueness rules as the PostgreSQL schema (one open log
//! per child, facility and day; one daily record per child and day) and adds
//! fault injection for exercising error and race paths.

use std::sync::{Arc, Mutex, MutexGuard};

use carebook_core::clock::DayWindow;
use carebook_core::presence::CheckInMethod;
use carebook_core::schedule::{DailyStatus, DayOfWeek, WeeklyPattern};
use carebook_core::types::{EntityId, Timestamp};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use super::{AttendanceStore, StoreError, StoreResult};
use crate::models::attendance_log::{AttendanceLog, CreateAttendanceLog};
use crate::models::child::{Child, ChildClass};
use crate::models::daily_attendance::{DailyAttendanceRecord, UpsertDailyAttendance};
use crate::models::schedule_pattern::SchedulePattern;
use crate::models::timetable::TimetableSlot;

const OPEN_LOG_CONSTRAINT: &str = "uq_attendance_logs_open_per_day";

#[derive(Debug, Default)]
struct State {
    children: Vec<Child>,
    classes: Vec<ChildClass>,
    patterns: Vec<SchedulePattern>,
    timetable: Vec<TimetableSlot>,
    daily: Vec<DailyAttendanceRecord>,
    logs: Vec<AttendanceLog>,
    /// Log lookups left that should miss, as if racing another request.
    stale_reads: usize,
    fail_next_write: bool,
    fail_next_daily_upsert: bool,
}

impl State {
    fn facility_of(&self, child_id: EntityId) -> Option<EntityId> {
        self.children
            .iter()
            .find(|c| c.id == child_id)
            .map(|c| c.facility_id)
    }

    fn take_stale_read(&mut self) -> bool {
        if self.stale_reads > 0 {
            self.stale_reads -= 1;
            true
        } else {
            false
        }
    }

    fn check_write(&mut self) -> StoreResult<()> {
        if std::mem::take(&mut self.fail_next_write) {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        Ok(())
    }

    fn insert_log(&mut self, input: &CreateAttendanceLog) -> StoreResult<AttendanceLog> {
        let duplicate_open = self.logs.iter().any(|l| {
            l.child_id == input.child_id
                && l.facility_id == input.facility_id
                && l.attendance_date == input.attendance_date
                && l.checked_out_at.is_none()
        });
        if duplicate_open {
            return Err(StoreError::UniqueViolation {
                constraint: OPEN_LOG_CONSTRAINT.to_string(),
            });
        }
        let log = AttendanceLog {
            id: Uuid::new_v4(),
            child_id: input.child_id,
            facility_id: input.facility_id,
            attendance_date: input.attendance_date,
            checked_in_at: input.checked_in_at,
            checked_out_at: None,
            check_in_method: input.check_in_method.as_str().to_string(),
            check_out_method: None,
            created_at: Utc::now(),
        };
        self.logs.push(log.clone());
        Ok(log)
    }

    fn upsert_daily(&mut self, input: &UpsertDailyAttendance) -> StoreResult<DailyAttendanceRecord> {
        if std::mem::take(&mut self.fail_next_daily_upsert) {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        let now = Utc::now();
        if let Some(existing) = self
            .daily
            .iter_mut()
            .find(|r| r.child_id == input.child_id && r.attendance_date == input.attendance_date)
        {
            existing.status = input.status.as_str().to_string();
            existing.updated_by = input.actor_id;
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let record = DailyAttendanceRecord {
            id: Uuid::new_v4(),
            child_id: input.child_id,
            facility_id: input.facility_id,
            attendance_date: input.attendance_date,
            status: input.status.as_str().to_string(),
            created_by: input.actor_id,
            updated_by: input.actor_id,
            created_at: now,
            updated_at: now,
        };
        self.daily.push(record.clone());
        Ok(record)
    }
}

/// Shared in-memory store. Clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // -----------------------------------------------------------------------
    // Seeding
    // -----------------------------------------------------------------------

    pub fn add_child(&self, facility_id: EntityId, name: &str) -> Child {
        self.insert_child(facility_id, name, None, None)
    }

    /// Add a child enrolled at a school in `grade`, for timetable lookups.
    pub fn add_school_child(
        &self,
        facility_id: EntityId,
        name: &str,
        school_id: EntityId,
        grade: i16,
    ) -> Child {
        self.insert_child(facility_id, name, Some(school_id), Some(grade))
    }

    fn insert_child(
        &self,
        facility_id: EntityId,
        name: &str,
        school_id: Option<EntityId>,
        grade: Option<i16>,
    ) -> Child {
        let now = Utc::now();
        let child = Child {
            id: Uuid::new_v4(),
            facility_id,
            name: name.to_string(),
            school_id,
            grade,
            created_at: now,
            updated_at: now,
        };
        self.lock().children.push(child.clone());
        child
    }

    pub fn add_class(&self, child_id: EntityId, class_name: &str, is_current: bool) {
        self.lock().classes.push(ChildClass {
            child_id,
            class_id: Uuid::new_v4(),
            class_name: class_name.to_string(),
            is_current,
        });
    }

    pub fn add_pattern(&self, child_id: EntityId, pattern: WeeklyPattern) {
        let now = Utc::now();
        self.lock().patterns.push(SchedulePattern {
            id: Uuid::new_v4(),
            child_id,
            monday: pattern.monday,
            tuesday: pattern.tuesday,
            wednesday: pattern.wednesday,
            thursday: pattern.thursday,
            friday: pattern.friday,
            saturday: pattern.saturday,
            sunday: pattern.sunday,
            valid_from: pattern.valid_from,
            valid_to: pattern.valid_to,
            is_active: pattern.is_active,
            created_at: now,
            updated_at: now,
        });
    }

    pub fn add_timetable_slot(&self, slot: TimetableSlot) {
        self.lock().timetable.push(slot);
    }

    pub fn set_daily_status(
        &self,
        child_id: EntityId,
        facility_id: EntityId,
        date: NaiveDate,
        status: DailyStatus,
    ) {
        let input = UpsertDailyAttendance {
            child_id,
            facility_id,
            attendance_date: date,
            status,
            actor_id: Some(Uuid::nil()),
        };
        // Seeding bypasses fault injection.
        let mut state = self.lock();
        let pending = std::mem::take(&mut state.fail_next_daily_upsert);
        let _ = state.upsert_daily(&input);
        state.fail_next_daily_upsert = pending;
    }

    /// Insert a log as-is, skipping the open-log uniqueness check.
    pub fn seed_log(
        &self,
        child_id: EntityId,
        facility_id: EntityId,
        attendance_date: NaiveDate,
        checked_in_at: Timestamp,
        checked_out_at: Option<Timestamp>,
        method: CheckInMethod,
    ) -> AttendanceLog {
        let log = AttendanceLog {
            id: Uuid::new_v4(),
            child_id,
            facility_id,
            attendance_date,
            checked_in_at,
            checked_out_at,
            check_in_method: method.as_str().to_string(),
            check_out_method: checked_out_at.map(|_| method.as_str().to_string()),
            created_at: checked_in_at,
        };
        self.lock().logs.push(log.clone());
        log
    }

    // -----------------------------------------------------------------------
    // Fault injection
    // -----------------------------------------------------------------------

    /// Make the next `n` log lookups miss, as a request that lost a race
    /// against a concurrent insert would see it.
    pub fn simulate_stale_reads(&self, n: usize) {
        self.lock().stale_reads = n;
    }

    /// Fail the next write of any kind before it touches data.
    pub fn fail_next_write(&self) {
        self.lock().fail_next_write = true;
    }

    /// Fail the next daily-record upsert, including the one inside a
    /// combined log-and-record write.
    pub fn fail_next_daily_upsert(&self) {
        self.lock().fail_next_daily_upsert = true;
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    pub fn logs(&self) -> Vec<AttendanceLog> {
        self.lock().logs.clone()
    }

    pub fn daily_records(&self) -> Vec<DailyAttendanceRecord> {
        self.lock().daily.clone()
    }
}

impl AttendanceStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn find_child(
        &self,
        child_id: EntityId,
        facility_id: EntityId,
    ) -> StoreResult<Option<Child>> {
        Ok(self
            .lock()
            .children
            .iter()
            .find(|c| c.id == child_id && c.facility_id == facility_id)
            .cloned())
    }

    async fn list_children(&self, facility_id: EntityId) -> StoreResult<Vec<Child>> {
        let mut children: Vec<Child> = self
            .lock()
            .children
            .iter()
            .filter(|c| c.facility_id == facility_id)
            .cloned()
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }

    async fn list_child_classes(&self, child_id: EntityId) -> StoreResult<Vec<ChildClass>> {
        Ok(self
            .lock()
            .classes
            .iter()
            .filter(|c| c.child_id == child_id)
            .cloned()
            .collect())
    }

    async fn list_facility_classes(&self, facility_id: EntityId) -> StoreResult<Vec<ChildClass>> {
        let state = self.lock();
        Ok(state
            .classes
            .iter()
            .filter(|c| state.facility_of(c.child_id) == Some(facility_id))
            .cloned()
            .collect())
    }

    async fn list_schedule_patterns(
        &self,
        facility_id: EntityId,
        date: NaiveDate,
    ) -> StoreResult<Vec<SchedulePattern>> {
        let state = self.lock();
        Ok(state
            .patterns
            .iter()
            .filter(|p| state.facility_of(p.child_id) == Some(facility_id))
            .filter(|p| p.weekly().covers(date))
            .cloned()
            .collect())
    }

    async fn list_child_patterns(
        &self,
        child_id: EntityId,
        date: NaiveDate,
    ) -> StoreResult<Vec<SchedulePattern>> {
        Ok(self
            .lock()
            .patterns
            .iter()
            .filter(|p| p.child_id == child_id && p.weekly().covers(date))
            .cloned()
            .collect())
    }

    async fn list_timetable(
        &self,
        facility_id: EntityId,
        day: DayOfWeek,
    ) -> StoreResult<Vec<TimetableSlot>> {
        let state = self.lock();
        Ok(state
            .timetable
            .iter()
            .filter(|slot| slot.day_of_week == day.iso_number())
            .filter(|slot| {
                state.children.iter().any(|c| {
                    c.facility_id == facility_id
                        && c.school_id == Some(slot.school_id)
                        && c.grade == Some(slot.grade)
                })
            })
            .cloned()
            .collect())
    }

    async fn find_daily_record(
        &self,
        child_id: EntityId,
        date: NaiveDate,
    ) -> StoreResult<Option<DailyAttendanceRecord>> {
        Ok(self
            .lock()
            .daily
            .iter()
            .find(|r| r.child_id == child_id && r.attendance_date == date)
            .cloned())
    }

    async fn list_daily_records(
        &self,
        facility_id: EntityId,
        date: NaiveDate,
    ) -> StoreResult<Vec<DailyAttendanceRecord>> {
        Ok(self
            .lock()
            .daily
            .iter()
            .filter(|r| r.facility_id == facility_id && r.attendance_date == date)
            .cloned()
            .collect())
    }

    async fn upsert_daily_record(
        &self,
        input: &UpsertDailyAttendance,
    ) -> StoreResult<DailyAttendanceRecord> {
        let mut state = self.lock();
        state.check_write()?;
        state.upsert_daily(input)
    }

    async fn find_open_log(
        &self,
        child_id: EntityId,
        facility_id: EntityId,
        window: DayWindow,
    ) -> StoreResult<Option<AttendanceLog>> {
        let mut state = self.lock();
        if state.take_stale_read() {
            return Ok(None);
        }
        Ok(state
            .logs
            .iter()
            .filter(|l| l.child_id == child_id && l.facility_id == facility_id)
            .filter(|l| window.contains(l.checked_in_at) && l.checked_out_at.is_none())
            .max_by_key(|l| l.checked_in_at)
            .cloned())
    }

    async fn find_first_log(
        &self,
        child_id: EntityId,
        facility_id: EntityId,
        window: DayWindow,
    ) -> StoreResult<Option<AttendanceLog>> {
        let mut state = self.lock();
        if state.take_stale_read() {
            return Ok(None);
        }
        Ok(state
            .logs
            .iter()
            .filter(|l| l.child_id == child_id && l.facility_id == facility_id)
            .filter(|l| window.contains(l.checked_in_at))
            .min_by_key(|l| l.checked_in_at)
            .cloned())
    }

    async fn list_logs(
        &self,
        facility_id: EntityId,
        window: DayWindow,
    ) -> StoreResult<Vec<AttendanceLog>> {
        let mut logs: Vec<AttendanceLog> = self
            .lock()
            .logs
            .iter()
            .filter(|l| l.facility_id == facility_id && window.contains(l.checked_in_at))
            .cloned()
            .collect();
        logs.sort_by_key(|l| (l.child_id, l.checked_in_at));
        Ok(logs)
    }

    async fn create_log(&self, input: &CreateAttendanceLog) -> StoreResult<AttendanceLog> {
        let mut state = self.lock();
        state.check_write()?;
        state.insert_log(input)
    }

    async fn close_log(
        &self,
        log_id: EntityId,
        checked_out_at: Timestamp,
        method: CheckInMethod,
    ) -> StoreResult<Option<AttendanceLog>> {
        let mut state = self.lock();
        state.check_write()?;
        Ok(state
            .logs
            .iter_mut()
            .find(|l| l.id == log_id && l.checked_out_at.is_none())
            .map(|log| {
                log.checked_out_at = Some(checked_out_at);
                log.check_out_method = Some(method.as_str().to_string());
                log.clone()
            }))
    }

    async fn create_log_with_daily_record(
        &self,
        log: &CreateAttendanceLog,
        daily: &UpsertDailyAttendance,
    ) -> StoreResult<(AttendanceLog, DailyAttendanceRecord)> {
        let mut state = self.lock();
        state.check_write()?;
        let created = state.insert_log(log)?;
        match state.upsert_daily(daily) {
            Ok(record) => Ok((created, record)),
            Err(err) => {
                // Roll back the log insert.
                state.logs.retain(|l| l.id != created.id);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 8).unwrap()
    }

    fn window() -> DayWindow {
        let start = Utc.with_ymd_and_hms(2024, 4, 7, 15, 0, 0).unwrap();
        DayWindow {
            start,
            end: start + Duration::days(1),
        }
    }

    fn open_log(child_id: EntityId, facility_id: EntityId) -> CreateAttendanceLog {
        CreateAttendanceLog {
            child_id,
            facility_id,
            attendance_date: date(),
            checked_in_at: window().start + Duration::hours(9),
            check_in_method: CheckInMethod::Manual,
        }
    }

    #[tokio::test]
    async fn second_open_log_is_a_unique_violation() {
        let store = MemoryStore::new();
        let facility = Uuid::new_v4();
        let child = store.add_child(facility, "Aoi");

        store.create_log(&open_log(child.id, facility)).await.unwrap();
        let err = store
            .create_log(&open_log(child.id, facility))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn failed_daily_upsert_rolls_back_the_log() {
        let store = MemoryStore::new();
        let facility = Uuid::new_v4();
        let child = store.add_child(facility, "Aoi");
        store.fail_next_daily_upsert();

        let daily = UpsertDailyAttendance {
            child_id: child.id,
            facility_id: facility,
            attendance_date: date(),
            status: DailyStatus::Scheduled,
            actor_id: Some(Uuid::new_v4()),
        };
        let result = store
            .create_log_with_daily_record(&open_log(child.id, facility), &daily)
            .await;

        assert!(result.is_err());
        assert!(store.logs().is_empty());
        assert!(store.daily_records().is_empty());
    }

    #[tokio::test]
    async fn stale_reads_miss_then_recover() {
        let store = MemoryStore::new();
        let facility = Uuid::new_v4();
        let child = store.add_child(facility, "Aoi");
        store.create_log(&open_log(child.id, facility)).await.unwrap();
        store.simulate_stale_reads(1);

        let first = store.find_first_log(child.id, facility, window()).await.unwrap();
        let second = store.find_first_log(child.id, facility, window()).await.unwrap();
        assert!(first.is_none());
        assert!(second.is_some());
    }

    #[tokio::test]
    async fn close_only_touches_open_logs() {
        let store = MemoryStore::new();
        let facility = Uuid::new_v4();
        let child = store.add_child(facility, "Aoi");
        let log = store.create_log(&open_log(child.id, facility)).await.unwrap();
        let at = log.checked_in_at + Duration::hours(6);

        let closed = store.close_log(log.id, at, CheckInMethod::Manual).await.unwrap();
        assert_eq!(closed.unwrap().checked_out_at, Some(at));
        let again = store.close_log(log.id, at, CheckInMethod::Manual).await.unwrap();
        assert!(again.is_none());
    }
}
