#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use carebook_api::auth::jwt::{generate_access_token, JwtConfig};
use carebook_api::config::{AttendanceConfig, ServerConfig};
use carebook_api::router::build_app_router;
use carebook_api::state::AppState;
use carebook_core::alerts::AlertThresholds;
use carebook_core::clock::FacilityClock;
use carebook_core::qr_signature;
use carebook_core::schedule::WeeklyPattern;
use carebook_core::types::{EntityId, Timestamp};
use carebook_db::store::memory::MemoryStore;
use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

pub const QR_SECRET: &str = "test-qr-signature-secret";
pub const JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Every test runs on Monday 2024-04-08 in a UTC+9 facility.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 8).unwrap()
}

/// An instant at facility-local `hh:mm` on [`today`].
pub fn local(hour: u32, minute: u32) -> Timestamp {
    FixedOffset::east_opt(9 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 4, 8, hour, minute, 0)
        .unwrap()
        .with_timezone(&Utc)
}

/// Build a test `ServerConfig` whose clock is frozen at `now`.
pub fn test_config(now: Timestamp) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
            access_token_expiry_mins: 15,
        },
        attendance: AttendanceConfig {
            qr_signature_secret: QR_SECRET.to_string(),
            thresholds: AlertThresholds::default(),
            clock: FacilityClock::new(540).unwrap().frozen_at(now),
        },
    }
}

/// Build the full application router over `store` with the clock at local
/// 10:00.
pub fn build_test_app(store: MemoryStore) -> Router {
    build_test_app_at(store, local(10, 0))
}

/// Build the full application router over `store` with the clock frozen at
/// `now`, through the same builder and middleware stack production uses.
pub fn build_test_app_at(store: MemoryStore, now: Timestamp) -> Router {
    let config = test_config(now);
    let state = AppState {
        store,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// A session token for a staff user bound to `facility_id`.
pub fn bearer(facility_id: Option<EntityId>) -> String {
    bearer_for(Uuid::new_v4(), facility_id)
}

pub fn bearer_for(user_id: EntityId, facility_id: Option<EntityId>) -> String {
    let config = JwtConfig {
        secret: JWT_SECRET.to_string(),
        access_token_expiry_mins: 15,
    };
    generate_access_token(user_id, facility_id, "staff", &config).unwrap()
}

/// The QR token printed for a child.
pub fn qr_token(child_id: EntityId, facility_id: EntityId) -> String {
    qr_signature::sign(&child_id.to_string(), &facility_id.to_string(), QR_SECRET)
}

pub fn pattern(days: [bool; 7]) -> WeeklyPattern {
    WeeklyPattern {
        monday: days[0],
        tuesday: days[1],
        wednesday: days[2],
        thursday: days[3],
        friday: days[4],
        saturday: days[5],
        sunday: days[6],
        valid_from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        valid_to: None,
        is_active: true,
    }
}

pub fn weekdays() -> WeeklyPattern {
    pattern([true, true, true, true, true, false, false])
}

pub fn weekends() -> WeeklyPattern {
    pattern([false, false, false, false, false, true, true])
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Body,
) -> Response {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn post_json(
    app: Router,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Response {
    send(app, Method::POST, uri, token, Body::from(body.to_string())).await
}

pub async fn get(app: Router, uri: &str, token: Option<&str>) -> Response {
    send(app, Method::GET, uri, token, Body::empty()).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
