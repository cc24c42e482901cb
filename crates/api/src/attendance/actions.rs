//! Manual staff actions on a child's attendance for today.

use carebook_core::actions::{
    plan, ActionEffect, AttendanceAction, ALREADY_CHECKED_IN, NO_ACTIVE_TO_CHECK_OUT,
};
use carebook_core::clock::DayWindow;
use carebook_core::error::CoreError;
use carebook_core::presence::CheckInMethod;
use carebook_core::schedule::DailyStatus;
use carebook_core::types::{EntityId, Timestamp};
use carebook_db::models::attendance_log::{AttendanceLog, CreateAttendanceLog};
use carebook_db::models::daily_attendance::UpsertDailyAttendance;
use carebook_db::store::AttendanceStore;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{non_blank, parse_id};
use crate::config::AttendanceConfig;
use crate::error::{AppError, AppResult};

/// Body of `POST /attendance/action`.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
    pub action: Option<String>,
    pub child_id: Option<String>,
    /// RFC 3339 instant to record instead of now.
    pub action_timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionOutcome {
    pub action: AttendanceAction,
    pub child_id: EntityId,
    pub attendance_date: NaiveDate,
    /// Daily status written, if the action writes one.
    pub daily_status: Option<DailyStatus>,
    /// Log opened or closed, if the action touches one.
    pub log: Option<AttendanceLog>,
}

/// Who is acting on which child, and when.
#[derive(Debug, Clone, Copy)]
struct ActionContext {
    child_id: EntityId,
    facility_id: EntityId,
    actor_id: EntityId,
    today: NaiveDate,
    effective_at: Timestamp,
}

impl ActionContext {
    fn daily(&self, status: DailyStatus) -> UpsertDailyAttendance {
        UpsertDailyAttendance {
            child_id: self.child_id,
            facility_id: self.facility_id,
            attendance_date: self.today,
            status,
            actor_id: Some(self.actor_id),
        }
    }
}

/// Parse `action_timestamp`, falling back to `now` when it is absent,
/// invalid, or outside `today`.
///
/// Logs are read back by `checked_in_at` within the local day, so an instant
/// on another day would leave a log that no later read can see.
pub fn effective_timestamp(raw: Option<&str>, now: Timestamp, today: DayWindow) -> Timestamp {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|t| t.with_timezone(&Utc))
        .filter(|t| today.contains(*t))
        .unwrap_or(now)
}

/// Apply a staff action for `facility_id` on behalf of `actor_id`.
pub async fn apply_action<S: AttendanceStore>(
    store: &S,
    config: &AttendanceConfig,
    facility_id: EntityId,
    actor_id: EntityId,
    request: ActionRequest,
) -> AppResult<ActionOutcome> {
    let (Some(raw_action), Some(raw_child_id)) = (
        non_blank(request.action.as_deref()),
        non_blank(request.child_id.as_deref()),
    ) else {
        return Err(AppError::BadRequest("action and child_id are required".into()));
    };
    let action: AttendanceAction = raw_action.parse()?;
    let child_id = parse_id("child_id", raw_child_id)?;

    store
        .find_child(child_id, facility_id)
        .await?
        .ok_or_else(|| CoreError::NotFound("Child not found".into()))?;

    let now = config.clock.now();
    let today = config.clock.date_of(now);
    let window = config.clock.day_window(today);
    let ctx = ActionContext {
        child_id,
        facility_id,
        actor_id,
        today,
        effective_at: effective_timestamp(request.action_timestamp.as_deref(), now, window),
    };

    let (daily, open_log) = tokio::try_join!(
        store.find_daily_record(child_id, today),
        store.find_open_log(child_id, facility_id, window),
    )?;
    tracing::debug!(
        %child_id,
        %action,
        previous = ?daily.as_ref().and_then(|r| r.daily_status()),
        has_open_log = open_log.is_some(),
        "Applying attendance action"
    );

    let effect = plan(action, open_log.is_some())?;
    let log = match effect {
        ActionEffect::OpenLog { daily_status } => {
            Some(open_log_manually(store, &ctx, daily_status).await?)
        }
        ActionEffect::CloseOpenLog => {
            let open =
                open_log.ok_or_else(|| CoreError::NotFound(NO_ACTIVE_TO_CHECK_OUT.into()))?;
            // Never check out before the check-in.
            let checked_out_at = ctx.effective_at.max(open.checked_in_at);
            let closed = store
                .close_log(open.id, checked_out_at, CheckInMethod::Manual)
                .await?
                // Closed by someone else since the read.
                .ok_or_else(|| CoreError::NotFound(NO_ACTIVE_TO_CHECK_OUT.into()))?;
            Some(closed)
        }
        ActionEffect::SetDailyStatus(status) => {
            store.upsert_daily_record(&ctx.daily(status)).await?;
            None
        }
    };

    tracing::info!(%child_id, %facility_id, %action, actor_id = %actor_id, "Attendance action applied");

    Ok(ActionOutcome {
        action,
        child_id,
        attendance_date: today,
        daily_status: effect.daily_status(),
        log,
    })
}

/// Open a manual log and mark the day, both or neither.
async fn open_log_manually<S: AttendanceStore>(
    store: &S,
    ctx: &ActionContext,
    daily_status: DailyStatus,
) -> AppResult<AttendanceLog> {
    let input = CreateAttendanceLog {
        child_id: ctx.child_id,
        facility_id: ctx.facility_id,
        attendance_date: ctx.today,
        checked_in_at: ctx.effective_at,
        check_in_method: CheckInMethod::Manual,
    };
    match store
        .create_log_with_daily_record(&input, &ctx.daily(daily_status))
        .await
    {
        Ok((log, _)) => Ok(log),
        Err(err) if err.is_unique_violation() => {
            Err(CoreError::Conflict(ALREADY_CHECKED_IN.into()).into())
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use carebook_core::clock::FacilityClock;
    use chrono::TimeZone;

    use super::*;

    fn monday() -> DayWindow {
        FacilityClock::new(540)
            .unwrap()
            .day_window(NaiveDate::from_ymd_opt(2024, 4, 8).unwrap())
    }

    #[test]
    fn action_timestamp_parses_rfc3339() {
        let now = Utc.with_ymd_and_hms(2024, 4, 8, 0, 0, 0).unwrap();
        let at = effective_timestamp(Some("2024-04-08T08:30:00+09:00"), now, monday());
        assert_eq!(at, Utc.with_ymd_and_hms(2024, 4, 7, 23, 30, 0).unwrap());
    }

    #[test]
    fn invalid_or_missing_timestamp_falls_back_to_now() {
        let now = Utc.with_ymd_and_hms(2024, 4, 8, 0, 0, 0).unwrap();
        assert_eq!(effective_timestamp(None, now, monday()), now);
        assert_eq!(effective_timestamp(Some("yesterday"), now, monday()), now);
    }

    #[test]
    fn timestamp_outside_local_day_falls_back_to_now() {
        let now = Utc.with_ymd_and_hms(2024, 4, 8, 1, 0, 0).unwrap();
        let window = monday();
        for raw in [
            "2024-04-07T10:00:00+09:00",
            "2024-04-07T23:59:59+09:00",
            "2024-04-09T00:00:00+09:00",
        ] {
            assert_eq!(effective_timestamp(Some(raw), now, window), now, "{raw}");
        }
        let midnight = "2024-04-08T00:00:00+09:00";
        assert_eq!(effective_timestamp(Some(midnight), now, window), window.start);
    }
}
