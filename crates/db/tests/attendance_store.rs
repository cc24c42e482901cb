//! Integration tests for `PgAttendanceStore` against a real database.
//!
//! Exercises the storage rules the attendance flows rely on:
//! - At most one open log per child and day (unique partial index)
//! - Daily records converge on one row per child and date
//! - Closing only affects open logs
//! - The combined log-and-record write is atomic

use carebook_core::clock::FacilityClock;
use carebook_core::presence::CheckInMethod;
use carebook_core::schedule::DailyStatus;
use carebook_core::types::EntityId;
use carebook_db::models::attendance_log::CreateAttendanceLog;
use carebook_db::models::daily_attendance::UpsertDailyAttendance;
use carebook_db::store::{AttendanceStore, PgAttendanceStore, StoreError};
use chrono::{NaiveDate, TimeZone, Utc};
use sqlx::PgPool;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 8).unwrap()
}

async fn insert_child(pool: &PgPool, facility_id: EntityId, name: &str) -> EntityId {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO children (id, facility_id, name) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(facility_id)
        .bind(name)
        .execute(pool)
        .await
        .unwrap();
    id
}

fn new_log(child_id: EntityId, facility_id: EntityId, hour: u32) -> CreateAttendanceLog {
    CreateAttendanceLog {
        child_id,
        facility_id,
        attendance_date: day(),
        checked_in_at: Utc.with_ymd_and_hms(2024, 4, 8, hour, 0, 0).unwrap(),
        check_in_method: CheckInMethod::Qr,
    }
}

fn upsert(
    child_id: EntityId,
    facility_id: EntityId,
    status: DailyStatus,
    actor_id: EntityId,
) -> UpsertDailyAttendance {
    UpsertDailyAttendance {
        child_id,
        facility_id,
        attendance_date: day(),
        status,
        actor_id: Some(actor_id),
    }
}

// ---------------------------------------------------------------------------
// Open-log uniqueness
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn second_open_log_is_a_unique_violation(pool: PgPool) {
    let store = PgAttendanceStore::new(pool.clone());
    let facility_id = Uuid::new_v4();
    let child_id = insert_child(&pool, facility_id, "Aoi").await;

    store.create_log(&new_log(child_id, facility_id, 1)).await.unwrap();
    let err = store
        .create_log(&new_log(child_id, facility_id, 2))
        .await
        .unwrap_err();

    assert!(err.is_unique_violation());
    assert!(matches!(
        err,
        StoreError::UniqueViolation { ref constraint } if constraint == "uq_attendance_logs_open_per_day"
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn closed_log_allows_a_new_open_log(pool: PgPool) {
    let store = PgAttendanceStore::new(pool.clone());
    let facility_id = Uuid::new_v4();
    let child_id = insert_child(&pool, facility_id, "Aoi").await;

    let first = store.create_log(&new_log(child_id, facility_id, 1)).await.unwrap();
    let closed_at = Utc.with_ymd_and_hms(2024, 4, 8, 3, 0, 0).unwrap();
    store
        .close_log(first.id, closed_at, CheckInMethod::Manual)
        .await
        .unwrap()
        .unwrap();

    store.create_log(&new_log(child_id, facility_id, 5)).await.unwrap();
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn first_log_is_earliest_of_the_day(pool: PgPool) {
    let store = PgAttendanceStore::new(pool.clone());
    let facility_id = Uuid::new_v4();
    let child_id = insert_child(&pool, facility_id, "Aoi").await;
    let window = FacilityClock::new(540).unwrap().day_window(day());

    let first = store.create_log(&new_log(child_id, facility_id, 1)).await.unwrap();
    let closed_at = Utc.with_ymd_and_hms(2024, 4, 8, 2, 0, 0).unwrap();
    store
        .close_log(first.id, closed_at, CheckInMethod::Manual)
        .await
        .unwrap();
    let second = store.create_log(&new_log(child_id, facility_id, 4)).await.unwrap();

    let found = store
        .find_first_log(child_id, facility_id, window)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, first.id);

    let open = store
        .find_open_log(child_id, facility_id, window)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(open.id, second.id);
}

// ---------------------------------------------------------------------------
// Close
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn close_only_affects_open_logs(pool: PgPool) {
    let store = PgAttendanceStore::new(pool.clone());
    let facility_id = Uuid::new_v4();
    let child_id = insert_child(&pool, facility_id, "Aoi").await;

    let log = store.create_log(&new_log(child_id, facility_id, 1)).await.unwrap();
    let first_close = Utc.with_ymd_and_hms(2024, 4, 8, 8, 0, 0).unwrap();
    let closed = store
        .close_log(log.id, first_close, CheckInMethod::Qr)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(closed.checked_out_at, Some(first_close));
    assert_eq!(closed.check_out_method.as_deref(), Some("qr"));

    let second_close = Utc.with_ymd_and_hms(2024, 4, 8, 9, 0, 0).unwrap();
    let again = store
        .close_log(log.id, second_close, CheckInMethod::Manual)
        .await
        .unwrap();
    assert!(again.is_none());
}

// ---------------------------------------------------------------------------
// Daily records
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn daily_upserts_converge_on_one_row(pool: PgPool) {
    let store = PgAttendanceStore::new(pool.clone());
    let facility_id = Uuid::new_v4();
    let child_id = insert_child(&pool, facility_id, "Aoi").await;
    let creator = Uuid::new_v4();
    let editor = Uuid::new_v4();

    store
        .upsert_daily_record(&upsert(child_id, facility_id, DailyStatus::Absent, creator))
        .await
        .unwrap();
    let updated = store
        .upsert_daily_record(&upsert(child_id, facility_id, DailyStatus::Scheduled, editor))
        .await
        .unwrap();

    assert_eq!(updated.daily_status(), Some(DailyStatus::Scheduled));
    assert_eq!(updated.created_by, Some(creator));
    assert_eq!(updated.updated_by, Some(editor));

    let records = store.list_daily_records(facility_id, day()).await.unwrap();
    assert_eq!(records.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn combined_write_rolls_back_on_conflict(pool: PgPool) {
    let store = PgAttendanceStore::new(pool.clone());
    let facility_id = Uuid::new_v4();
    let child_id = insert_child(&pool, facility_id, "Aoi").await;
    let actor = Uuid::new_v4();

    store.create_log(&new_log(child_id, facility_id, 1)).await.unwrap();
    let err = store
        .create_log_with_daily_record(
            &new_log(child_id, facility_id, 2),
            &upsert(child_id, facility_id, DailyStatus::Scheduled, actor),
        )
        .await
        .unwrap_err();

    assert!(err.is_unique_violation());
    let record = store.find_daily_record(child_id, day()).await.unwrap();
    assert!(record.is_none());
}

// ---------------------------------------------------------------------------
// Facility scoping
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn child_lookup_is_scoped_to_facility(pool: PgPool) {
    let store = PgAttendanceStore::new(pool.clone());
    let facility_id = Uuid::new_v4();
    let child_id = insert_child(&pool, facility_id, "Aoi").await;

    assert!(store.find_child(child_id, facility_id).await.unwrap().is_some());
    assert!(store
        .find_child(child_id, Uuid::new_v4())
        .await
        .unwrap()
        .is_none());
}
