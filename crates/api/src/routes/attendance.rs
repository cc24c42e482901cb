//! Route definitions for the `/attendance` resource.

use axum::routing::{get, post};
use axum::Router;
use carebook_db::store::AttendanceStore;

use crate::handlers::attendance;
use crate::state::AppState;

/// Routes mounted at `/attendance`.
///
/// ```text
/// POST   /checkin    -> check_in
/// POST   /action     -> apply_action
/// GET    /today      -> today
/// GET    /alerts     -> alerts
/// ```
pub fn router<S: AttendanceStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/checkin", post(attendance::check_in::<S>))
        .route("/action", post(attendance::apply_action::<S>))
        .route("/today", get(attendance::today::<S>))
        .route("/alerts", get(attendance::alerts::<S>))
}
