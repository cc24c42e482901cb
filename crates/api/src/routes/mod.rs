pub mod attendance;
pub mod health;

use axum::Router;
use carebook_db::store::AttendanceStore;

use crate::state::AppState;

/// Build the route tree.
///
/// ```text
/// /attendance/checkin        QR check-in (POST)
/// /attendance/action         manual staff action (POST)
/// /attendance/today          today's roster (GET)
/// /attendance/alerts         alert board (GET)
/// ```
pub fn api_routes<S: AttendanceStore>() -> Router<AppState<S>> {
    Router::new().nest("/attendance", attendance::router())
}
