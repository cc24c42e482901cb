use axum::extract::State;
use axum::{routing::get, Json, Router};
use carebook_db::store::AttendanceStore;
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the record store is reachable.
    pub db_healthy: bool,
}

/// GET /health -- returns service and store health.
async fn health_check<S: AttendanceStore>(
    State(state): State<AppState<S>>,
) -> Json<HealthResponse> {
    let db_healthy = state.store.ping().await.is_ok();

    let status = if db_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
    })
}

/// Mount health check routes at the root.
pub fn router<S: AttendanceStore>() -> Router<AppState<S>> {
    Router::new().route("/health", get(health_check::<S>))
}
