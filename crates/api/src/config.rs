use carebook_core::alerts::{
    AlertThresholds, DEFAULT_LATE_ARRIVAL_MINUTES, DEFAULT_OVERDUE_DEPARTURE_MINUTES,
};
use carebook_core::clock::{FacilityClock, DEFAULT_UTC_OFFSET_MINUTES};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// Everything except the secrets has a default suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT session token configuration.
    pub jwt: JwtConfig,
    /// QR secret, alert thresholds and the facility clock.
    pub attendance: AttendanceConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            attendance: AttendanceConfig::from_env(),
        }
    }
}

/// Inputs of the attendance core: the shared QR secret, the alert
/// thresholds and the facility clock.
#[derive(Debug, Clone)]
pub struct AttendanceConfig {
    /// Key for QR token signatures. Must match the QR generator's secret.
    pub qr_signature_secret: String,
    pub thresholds: AlertThresholds,
    pub clock: FacilityClock,
}

impl AttendanceConfig {
    /// Load attendance configuration from environment variables.
    ///
    /// | Env Var                       | Required | Default |
    /// |-------------------------------|----------|---------|
    /// | `QR_SIGNATURE_SECRET`         | **yes**  | --      |
    /// | `LATE_ARRIVAL_MINUTES`        | no       | `15`    |
    /// | `OVERDUE_DEPARTURE_MINUTES`   | no       | `30`    |
    /// | `FACILITY_UTC_OFFSET_MINUTES` | no       | `540`   |
    ///
    /// # Panics
    ///
    /// Panics if `QR_SIGNATURE_SECRET` is unset or empty, or if any value
    /// fails to parse.
    pub fn from_env() -> Self {
        let qr_signature_secret = std::env::var("QR_SIGNATURE_SECRET")
            .expect("QR_SIGNATURE_SECRET must be set in the environment");
        assert!(
            !qr_signature_secret.is_empty(),
            "QR_SIGNATURE_SECRET must not be empty"
        );

        let late_arrival_minutes: i64 = std::env::var("LATE_ARRIVAL_MINUTES")
            .unwrap_or_else(|_| DEFAULT_LATE_ARRIVAL_MINUTES.to_string())
            .parse()
            .expect("LATE_ARRIVAL_MINUTES must be a valid i64");

        let overdue_departure_minutes: i64 = std::env::var("OVERDUE_DEPARTURE_MINUTES")
            .unwrap_or_else(|_| DEFAULT_OVERDUE_DEPARTURE_MINUTES.to_string())
            .parse()
            .expect("OVERDUE_DEPARTURE_MINUTES must be a valid i64");

        let offset_minutes: i32 = std::env::var("FACILITY_UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| DEFAULT_UTC_OFFSET_MINUTES.to_string())
            .parse()
            .expect("FACILITY_UTC_OFFSET_MINUTES must be a valid i32");

        let clock = FacilityClock::new(offset_minutes)
            .unwrap_or_else(|e| panic!("Invalid FACILITY_UTC_OFFSET_MINUTES: {e}"));

        Self {
            qr_signature_secret,
            thresholds: AlertThresholds {
                late_arrival_minutes,
                overdue_departure_minutes,
            },
            clock,
        }
    }
}
