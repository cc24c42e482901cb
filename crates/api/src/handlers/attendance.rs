//! Handlers for the `/attendance` resource.
//!
//! Every endpoint is scoped to the facility bound to the caller's session.
//! The session is checked before the body is looked at, so an unbound
//! session is always a 401.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use carebook_db::store::AttendanceStore;
use serde::Serialize;

use crate::attendance::actions::{self, ActionOutcome, ActionRequest};
use crate::attendance::checkin::{self, CheckInData, CheckInRequest};
use crate::attendance::roster::{self, AlertBoard, Roster};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Check-in response; `already_checked_in` sits beside the payload.
#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    pub success: bool,
    pub already_checked_in: bool,
    pub data: CheckInData,
}

/// POST /attendance/checkin
///
/// Verify a scanned QR token and record the check-in. Scanning again the
/// same day returns the original check-in with `already_checked_in: true`.
pub async fn check_in<S: AttendanceStore>(
    State(state): State<AppState<S>>,
    user: AuthUser,
    payload: Result<Json<CheckInRequest>, JsonRejection>,
) -> AppResult<Json<CheckInResponse>> {
    let facility_id = user.require_facility()?;
    let Json(request) = payload?;

    let outcome =
        checkin::check_in(&state.store, &state.config.attendance, facility_id, request).await?;

    Ok(Json(CheckInResponse {
        success: true,
        already_checked_in: outcome.already_checked_in,
        data: outcome.data,
    }))
}

/// POST /attendance/action
///
/// Apply a manual staff action (`check_in`, `check_out`, `mark_absent`,
/// `add_schedule`, `confirm_unexpected`) for today.
pub async fn apply_action<S: AttendanceStore>(
    State(state): State<AppState<S>>,
    user: AuthUser,
    payload: Result<Json<ActionRequest>, JsonRejection>,
) -> AppResult<Json<DataResponse<ActionOutcome>>> {
    let facility_id = user.require_facility()?;
    let Json(request) = payload?;

    let outcome = actions::apply_action(
        &state.store,
        &state.config.attendance,
        facility_id,
        user.user_id,
        request,
    )
    .await?;

    Ok(Json(DataResponse::ok(outcome)))
}

/// GET /attendance/today
pub async fn today<S: AttendanceStore>(
    State(state): State<AppState<S>>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<Roster>>> {
    let facility_id = user.require_facility()?;
    let roster =
        roster::build_roster(&state.store, &state.config.attendance.clock, facility_id).await?;
    Ok(Json(DataResponse::ok(roster)))
}

/// GET /attendance/alerts
///
/// Overdue, late, unexpected and not-yet-arrived children, with counts.
pub async fn alerts<S: AttendanceStore>(
    State(state): State<AppState<S>>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<AlertBoard>>> {
    let facility_id = user.require_facility()?;
    let attendance = &state.config.attendance;
    let roster = roster::build_roster(&state.store, &attendance.clock, facility_id).await?;
    let board = roster::build_alerts(&roster, attendance.clock.time_now(), &attendance.thresholds);
    Ok(Json(DataResponse::ok(board)))
}
