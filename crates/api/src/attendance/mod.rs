//! Attendance services.
//!
//! Each service runs one request against an [`AttendanceStore`]: validate the
//! input, read what it needs concurrently, consult the pure rules in
//! `carebook_core`, then write. Handlers only extract and wrap.
//!
//! [`AttendanceStore`]: carebook_db::store::AttendanceStore

pub mod actions;
pub mod checkin;
pub mod roster;

use carebook_core::types::EntityId;

use crate::error::{AppError, AppResult};

/// A present, non-blank string field.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_id(field: &str, raw: &str) -> AppResult<EntityId> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid {field}")))
}

/// `HH:MM` rendering for optional wall-clock times.
mod hhmm {
    use chrono::NaiveTime;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(
        time: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => serializer.collect_str(&t.format("%H:%M")),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn blank_fields_are_missing() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(Some(" abc ")), Some("abc"));
    }

    #[test]
    fn malformed_ids_are_bad_requests() {
        assert_matches!(parse_id("child_id", "42"), Err(AppError::BadRequest(msg)) if msg == "Invalid child_id");
        let id = uuid::Uuid::new_v4();
        assert_eq!(parse_id("child_id", &format!(" {id} ")).unwrap(), id);
    }
}
