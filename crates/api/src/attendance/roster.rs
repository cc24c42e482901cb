//! Today's roster and the alert board derived from it.
//!
//! Roster-wide reads are issued concurrently and joined into maps keyed by
//! child id, then every child is resolved independently.

use std::collections::HashMap;

use carebook_core::alerts::{classify, AlertInput, AlertKind, AlertThresholds};
use carebook_core::classes::resolve_class_name;
use carebook_core::clock::FacilityClock;
use carebook_core::presence::{derive_presence, CheckInMethod, PresenceStatus};
use carebook_core::schedule::{is_scheduled_on, DailyStatus, DayOfWeek, WeeklyPattern};
use carebook_core::types::{EntityId, Timestamp};
use carebook_db::models::attendance_log::AttendanceLog;
use carebook_db::models::child::ChildClass;
use carebook_db::models::timetable::TimetableSlot;
use carebook_db::store::AttendanceStore;
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use super::hhmm;
use crate::error::AppResult;

/// One child's resolved state for today.
#[derive(Debug, Clone, Serialize)]
pub struct RosterEntry {
    pub child_id: EntityId,
    pub child_name: String,
    pub class_name: String,
    pub status: PresenceStatus,
    pub is_scheduled_today: bool,
    pub daily_status: Option<DailyStatus>,
    /// Staff member who last set `daily_status`; `None` for a QR-made record.
    #[serde(skip)]
    pub daily_status_set_by: Option<EntityId>,
    #[serde(serialize_with = "hhmm::serialize")]
    pub scheduled_start_time: Option<NaiveTime>,
    #[serde(serialize_with = "hhmm::serialize")]
    pub scheduled_end_time: Option<NaiveTime>,
    pub checked_in_at: Option<Timestamp>,
    pub checked_out_at: Option<Timestamp>,
    pub check_in_method: Option<CheckInMethod>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Roster {
    pub attendance_date: NaiveDate,
    pub children: Vec<RosterEntry>,
}

fn group_by_child<T>(
    rows: Vec<T>,
    child_id: impl Fn(&T) -> EntityId,
) -> HashMap<EntityId, Vec<T>> {
    let mut grouped: HashMap<EntityId, Vec<T>> = HashMap::new();
    for row in rows {
        grouped.entry(child_id(&row)).or_default().push(row);
    }
    grouped
}

/// Resolve every child of a facility for the clock's current day.
pub async fn build_roster<S: AttendanceStore>(
    store: &S,
    clock: &FacilityClock,
    facility_id: EntityId,
) -> AppResult<Roster> {
    let today = clock.today();
    let window = clock.day_window(today);

    let (children, classes, patterns, daily, logs, timetable) = tokio::try_join!(
        store.list_children(facility_id),
        store.list_facility_classes(facility_id),
        store.list_schedule_patterns(facility_id, today),
        store.list_daily_records(facility_id, today),
        store.list_logs(facility_id, window),
        store.list_timetable(facility_id, DayOfWeek::of(today)),
    )?;

    let classes: HashMap<EntityId, Vec<ChildClass>> = group_by_child(classes, |c| c.child_id);
    let mut weekly: HashMap<EntityId, Vec<WeeklyPattern>> = HashMap::new();
    for pattern in &patterns {
        weekly.entry(pattern.child_id).or_default().push(pattern.weekly());
    }
    let daily: HashMap<EntityId, (DailyStatus, Option<EntityId>)> = daily
        .iter()
        .filter_map(|r| r.daily_status().map(|s| (r.child_id, (s, r.updated_by))))
        .collect();
    let logs: HashMap<EntityId, Vec<AttendanceLog>> = group_by_child(logs, |l| l.child_id);
    let slots: HashMap<(EntityId, i16), &TimetableSlot> = timetable
        .iter()
        .map(|slot| ((slot.school_id, slot.grade), slot))
        .collect();

    let entries = children
        .iter()
        .map(|child| {
            let child_logs = logs.get(&child.id).map(Vec::as_slice).unwrap_or_default();
            let presence = derive_presence(child_logs);
            let (daily_status, daily_status_set_by) = match daily.get(&child.id) {
                Some(&(status, set_by)) => (Some(status), set_by),
                None => (None, None),
            };
            let child_patterns = weekly.get(&child.id).into_iter().flatten();
            let is_scheduled_today = is_scheduled_on(child_patterns, daily_status, today);
            let slot = child.school_id.zip(child.grade).and_then(|key| slots.get(&key));

            RosterEntry {
                child_id: child.id,
                child_name: child.name.clone(),
                class_name: resolve_class_name(
                    classes.get(&child.id).map(Vec::as_slice).unwrap_or_default(),
                ),
                status: presence.status,
                is_scheduled_today,
                daily_status,
                daily_status_set_by,
                scheduled_start_time: slot.and_then(|s| s.start_time),
                scheduled_end_time: slot.and_then(|s| s.end_time),
                checked_in_at: presence.display_log.map(|l| l.checked_in_at),
                checked_out_at: presence.display_log.and_then(|l| l.checked_out_at),
                check_in_method: presence.display_log.and_then(AttendanceLog::method),
            }
        })
        .collect();

    Ok(Roster {
        attendance_date: today,
        children: entries,
    })
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct AlertEntry {
    #[serde(flatten)]
    pub kind: AlertKind,
    pub child_id: EntityId,
    pub child_name: String,
    pub class_name: String,
    #[serde(serialize_with = "hhmm::serialize")]
    pub scheduled_start_time: Option<NaiveTime>,
    #[serde(serialize_with = "hhmm::serialize")]
    pub scheduled_end_time: Option<NaiveTime>,
    pub checked_in_at: Option<Timestamp>,
    pub check_in_method: Option<CheckInMethod>,
    /// Staff already confirmed this unexpected arrival.
    pub acknowledged: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertCounts {
    pub overdue: usize,
    pub late: usize,
    pub unexpected: usize,
    pub not_arrived: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertBoard {
    pub attendance_date: NaiveDate,
    /// Local wall-clock time the board was computed at, `HH:MM`.
    pub as_of: String,
    pub overdue: Vec<AlertEntry>,
    pub late: Vec<AlertEntry>,
    pub unexpected: Vec<AlertEntry>,
    pub not_arrived: Vec<AlertEntry>,
    pub counts: AlertCounts,
}

/// Classify every roster entry at local time `now`.
pub fn build_alerts(roster: &Roster, now: NaiveTime, thresholds: &AlertThresholds) -> AlertBoard {
    let mut board = AlertBoard {
        attendance_date: roster.attendance_date,
        as_of: now.format("%H:%M").to_string(),
        overdue: Vec::new(),
        late: Vec::new(),
        unexpected: Vec::new(),
        not_arrived: Vec::new(),
        counts: AlertCounts::default(),
    };

    for entry in &roster.children {
        let input = AlertInput {
            status: entry.status,
            is_scheduled_today: entry.is_scheduled_today,
            scheduled_start_time: entry.scheduled_start_time,
            scheduled_end_time: entry.scheduled_end_time,
            check_in_method: entry.check_in_method,
            now,
        };
        let Some(kind) = classify(&input, thresholds) else {
            continue;
        };

        let alert = AlertEntry {
            kind,
            child_id: entry.child_id,
            child_name: entry.child_name.clone(),
            class_name: entry.class_name.clone(),
            scheduled_start_time: entry.scheduled_start_time,
            scheduled_end_time: entry.scheduled_end_time,
            checked_in_at: entry.checked_in_at,
            check_in_method: entry.check_in_method,
            // Only staff confirmation counts; a QR scan also writes `irregular`.
            acknowledged: kind == AlertKind::Unexpected
                && entry.daily_status == Some(DailyStatus::Irregular)
                && entry.daily_status_set_by.is_some(),
        };
        match kind {
            AlertKind::Overdue { .. } => board.overdue.push(alert),
            AlertKind::Late { .. } => board.late.push(alert),
            AlertKind::Unexpected => board.unexpected.push(alert),
            AlertKind::NotArrived => board.not_arrived.push(alert),
        }
    }

    board.counts = AlertCounts {
        overdue: board.overdue.len(),
        late: board.late.len(),
        unexpected: board.unexpected.len(),
        not_arrived: board.not_arrived.len(),
    };
    board
}
