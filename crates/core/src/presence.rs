//! Presence status derived from a day's check-in/check-out log.
//!
//! Presence reflects physical log rows only. Whether the child was expected
//! is a separate fact (see [`crate::schedule`]) combined later by the alert
//! classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Tri-state presence of a child for one facility-local day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    CheckedIn,
    CheckedOut,
    Absent,
}

/// How a check-in or check-out was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckInMethod {
    Qr,
    Manual,
}

impl CheckInMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Qr => "qr",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for CheckInMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckInMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "qr" => Ok(Self::Qr),
            "manual" => Ok(Self::Manual),
            other => Err(format!("Unknown check-in method: {other}")),
        }
    }
}

/// The timestamps of an attendance log row that presence depends on.
pub trait AttendanceSpan {
    fn checked_in_at(&self) -> Timestamp;
    fn checked_out_at(&self) -> Option<Timestamp>;

    /// A log with no check-out yet: the child is on the premises.
    fn is_open(&self) -> bool {
        self.checked_out_at().is_none()
    }
}

/// Derived presence plus the log chosen to represent the day.
#[derive(Debug, PartialEq)]
pub struct Presence<'a, L> {
    pub status: PresenceStatus,
    pub display_log: Option<&'a L>,
}

/// Derive presence from the logs whose check-in falls inside today's window.
///
/// - Any open log: `CheckedIn`, and that log is displayed.
/// - Otherwise any closed log: `CheckedOut`, displaying the latest check-in.
/// - No logs: `Absent`.
pub fn derive_presence<L: AttendanceSpan>(logs: &[L]) -> Presence<'_, L> {
    if let Some(open) = logs
        .iter()
        .filter(|l| l.is_open())
        .max_by_key(|l| l.checked_in_at())
    {
        return Presence {
            status: PresenceStatus::CheckedIn,
            display_log: Some(open),
        };
    }

    match logs.iter().max_by_key(|l| l.checked_in_at()) {
        Some(latest) => Presence {
            status: PresenceStatus::CheckedOut,
            display_log: Some(latest),
        },
        None => Presence {
            status: PresenceStatus::Absent,
            display_log: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[derive(Debug, PartialEq)]
    struct Log {
        id: u32,
        checked_in_at: Timestamp,
        checked_out_at: Option<Timestamp>,
    }

    impl AttendanceSpan for Log {
        fn checked_in_at(&self) -> Timestamp {
            self.checked_in_at
        }
        fn checked_out_at(&self) -> Option<Timestamp> {
            self.checked_out_at
        }
    }

    fn at(h: u32, m: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 4, 8, h, m, 0).unwrap()
    }

    fn log(id: u32, checked_in: Timestamp, checked_out: Option<Timestamp>) -> Log {
        Log {
            id,
            checked_in_at: checked_in,
            checked_out_at: checked_out,
        }
    }

    #[test]
    fn no_logs_is_absent() {
        let logs: Vec<Log> = Vec::new();
        let presence = derive_presence(&logs);
        assert_eq!(presence.status, PresenceStatus::Absent);
        assert!(presence.display_log.is_none());
    }

    #[test]
    fn open_log_wins_over_closed() {
        let logs = vec![
            log(1, at(1, 0), Some(at(2, 0))),
            log(2, at(3, 0), None),
            log(3, at(4, 0), Some(at(5, 0))),
        ];
        let presence = derive_presence(&logs);
        assert_eq!(presence.status, PresenceStatus::CheckedIn);
        assert_eq!(presence.display_log.map(|l| l.id), Some(2));
    }

    #[test]
    fn closed_logs_display_latest_check_in() {
        let logs = vec![
            log(1, at(3, 0), Some(at(4, 0))),
            log(2, at(1, 0), Some(at(2, 0))),
        ];
        let presence = derive_presence(&logs);
        assert_eq!(presence.status, PresenceStatus::CheckedOut);
        assert_eq!(presence.display_log.map(|l| l.id), Some(1));
    }

    #[test]
    fn method_parses_from_text() {
        assert_eq!("qr".parse::<CheckInMethod>(), Ok(CheckInMethod::Qr));
        assert_eq!("manual".parse::<CheckInMethod>(), Ok(CheckInMethod::Manual));
        assert!("nfc".parse::<CheckInMethod>().is_err());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&PresenceStatus::CheckedIn).unwrap();
        assert_eq!(json, "\"checked_in\"");
    }
}
