//! QR check-in.
//!
//! A child scans a signed QR code at the facility entrance. The request is
//! verified against the session's facility and the shared secret, then
//! recorded at most once per child and day. Two scans racing each other
//! converge on the same log through the storage-level uniqueness rule.
//!
//! A fresh check-in by a child with no expectation for the day also marks
//! the day `irregular`. That write is not part of the check-in: if it fails
//! the check-in still stands and the failure is logged.

use carebook_core::classes::resolve_class_name;
use carebook_core::error::CoreError;
use carebook_core::presence::CheckInMethod;
use carebook_core::qr_signature::{self, FacilityBinding};
use carebook_core::schedule::{is_scheduled_on, DailyStatus, WeeklyPattern};
use carebook_core::types::{EntityId, Timestamp};
use carebook_db::models::attendance_log::{AttendanceLog, CreateAttendanceLog};
use carebook_db::models::child::Child;
use carebook_db::models::daily_attendance::{DailyAttendanceRecord, UpsertDailyAttendance};
use carebook_db::models::schedule_pattern::SchedulePattern;
use carebook_db::store::AttendanceStore;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{non_blank, parse_id};
use crate::config::AttendanceConfig;
use crate::error::{AppError, AppResult};

/// The `token` field, sent either as a string or as an array whose first
/// element is the token.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TokenField {
    Single(String),
    List(Vec<String>),
}

impl TokenField {
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(token) => Some(token),
            Self::List(tokens) => tokens.first().map(String::as_str),
        }
    }
}

/// Body of `POST /attendance/checkin`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckInRequest {
    pub token: Option<TokenField>,
    pub child_id: Option<String>,
    pub facility_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckInData {
    pub child_id: EntityId,
    pub child_name: String,
    pub class_name: String,
    pub checked_in_at: Timestamp,
    pub attendance_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct CheckInOutcome {
    /// The child already had a log today; `data` describes that log.
    pub already_checked_in: bool,
    pub data: CheckInData,
}

impl CheckInOutcome {
    fn new(child: &Child, class_name: String, log: &AttendanceLog, already: bool) -> Self {
        Self {
            already_checked_in: already,
            data: CheckInData {
                child_id: child.id,
                child_name: child.name.clone(),
                class_name,
                checked_in_at: log.checked_in_at,
                attendance_date: log.attendance_date,
            },
        }
    }
}

/// Verify a QR scan and record the check-in for `session_facility`.
pub async fn check_in<S: AttendanceStore>(
    store: &S,
    config: &AttendanceConfig,
    session_facility: EntityId,
    request: CheckInRequest,
) -> AppResult<CheckInOutcome> {
    let raw_token = non_blank(request.token.as_ref().and_then(TokenField::first));
    let (Some(raw_token), Some(raw_child_id)) = (raw_token, non_blank(request.child_id.as_deref()))
    else {
        return Err(AppError::BadRequest("token and child_id are required".into()));
    };

    let token = qr_signature::normalize_token(raw_token)
        .ok_or_else(|| AppError::BadRequest("Malformed token".into()))?;
    let child_id = parse_id("child_id", raw_child_id)?;
    let supplied_facility = non_blank(request.facility_id.as_deref())
        .map(|raw| parse_id("facility_id", raw))
        .transpose()?;

    // Unknown and foreign children look the same from outside.
    let child = store
        .find_child(child_id, session_facility)
        .await?
        .ok_or_else(|| CoreError::NotFound("Child not found".into()))?;

    let facility_id = match FacilityBinding::resolve(supplied_facility, child.facility_id) {
        FacilityBinding::Verified { facility_id } => facility_id,
        FacilityBinding::Mismatched { supplied, actual } => {
            tracing::warn!(%child_id, %supplied, %actual, "QR check-in for another facility");
            return Err(CoreError::Forbidden("Facility mismatch".into()).into());
        }
    };

    if let Err(err) = qr_signature::verify(
        token,
        &child_id.to_string(),
        &facility_id.to_string(),
        &config.qr_signature_secret,
    ) {
        tracing::warn!(%child_id, %facility_id, reason = ?err, "QR signature rejected");
        return Err(CoreError::Unauthorized(err.to_string()).into());
    }

    let now = config.clock.now();
    let today = config.clock.date_of(now);
    let window = config.clock.day_window(today);

    let (classes, existing, daily, patterns) = tokio::try_join!(
        store.list_child_classes(child_id),
        store.find_first_log(child_id, facility_id, window),
        store.find_daily_record(child_id, today),
        store.list_child_patterns(child_id, today),
    )?;
    let class_name = resolve_class_name(&classes);

    if let Some(log) = existing {
        tracing::info!(%child_id, %facility_id, "Child already checked in today");
        return Ok(CheckInOutcome::new(&child, class_name, &log, true));
    }

    let input = CreateAttendanceLog {
        child_id,
        facility_id,
        attendance_date: today,
        checked_in_at: now,
        check_in_method: CheckInMethod::Qr,
    };

    match store.create_log(&input).await {
        Ok(log) => {
            tracing::info!(%child_id, %facility_id, log_id = %log.id, "QR check-in recorded");
            if needs_irregular_mark(daily.as_ref(), &patterns, today) {
                mark_irregular(store, child_id, facility_id, today).await;
            }
            Ok(CheckInOutcome::new(&child, class_name, &log, false))
        }
        Err(err) if err.is_unique_violation() => {
            let log = store
                .find_first_log(child_id, facility_id, window)
                .await?
                .ok_or_else(|| {
                    AppError::InternalError(format!(
                        "check-in for child {child_id} conflicted but no log was found"
                    ))
                })?;
            tracing::info!(%child_id, %facility_id, log_id = %log.id, "Concurrent QR check-in converged");
            Ok(CheckInOutcome::new(&child, class_name, &log, true))
        }
        Err(err) => Err(err.into()),
    }
}

/// A child with neither a daily record nor a pattern expecting them today.
fn needs_irregular_mark(
    daily: Option<&DailyAttendanceRecord>,
    patterns: &[SchedulePattern],
    today: NaiveDate,
) -> bool {
    if daily.is_some() {
        return false;
    }
    let weekly: Vec<WeeklyPattern> = patterns.iter().map(SchedulePattern::weekly).collect();
    !is_scheduled_on(&weekly, None, today)
}

async fn mark_irregular<S: AttendanceStore>(
    store: &S,
    child_id: EntityId,
    facility_id: EntityId,
    today: NaiveDate,
) {
    let input = UpsertDailyAttendance {
        child_id,
        facility_id,
        attendance_date: today,
        status: DailyStatus::Irregular,
        actor_id: None,
    };
    if let Err(err) = store.upsert_daily_record(&input).await {
        tracing::error!(%child_id, %facility_id, error = %err, "Failed to mark unplanned QR arrival");
    }
}
