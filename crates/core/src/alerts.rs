//! Attendance alert classification.
//!
//! Combines the schedule flag, the presence status and the wall clock into
//! one of four buckets. Overdue, late and unexpected are contact-worthy;
//! not-arrived is informational.

use chrono::{NaiveTime, Timelike};
use serde::Serialize;

use crate::presence::{CheckInMethod, PresenceStatus};

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Default minutes after the scheduled start before an absent child is late.
pub const DEFAULT_LATE_ARRIVAL_MINUTES: i64 = 15;

/// Default minutes after the scheduled end before a present child is overdue.
pub const DEFAULT_OVERDUE_DEPARTURE_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlertThresholds {
    pub late_arrival_minutes: i64,
    pub overdue_departure_minutes: i64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            late_arrival_minutes: DEFAULT_LATE_ARRIVAL_MINUTES,
            overdue_departure_minutes: DEFAULT_OVERDUE_DEPARTURE_MINUTES,
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Everything the classifier needs to know about one child right now.
#[derive(Debug, Clone, Copy)]
pub struct AlertInput {
    pub status: PresenceStatus,
    pub is_scheduled_today: bool,
    pub scheduled_start_time: Option<NaiveTime>,
    pub scheduled_end_time: Option<NaiveTime>,
    /// Method of the display log, if any.
    pub check_in_method: Option<CheckInMethod>,
    /// Facility-local wall-clock time.
    pub now: NaiveTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertKind {
    /// Still on the premises well after the scheduled end.
    Overdue { minutes_overdue: i64 },
    /// Expected but not arrived well after the scheduled start.
    Late { minutes_late: i64 },
    /// Scanned in by QR without being expected today.
    Unexpected,
    /// Expected and not arrived yet, not yet late.
    NotArrived,
}

impl AlertKind {
    /// Whether staff should contact someone about this alert.
    pub fn is_contact_worthy(&self) -> bool {
        !matches!(self, Self::NotArrived)
    }
}

/// Minutes from `target` to `now` on the same wall-clock day.
///
/// There is no wraparound across midnight: a target later than `now` yields
/// a negative value, which never reaches a threshold.
pub fn minutes_since(now: NaiveTime, target: NaiveTime) -> i64 {
    let to_minutes = |t: NaiveTime| i64::from(t.hour()) * 60 + i64::from(t.minute());
    to_minutes(now) - to_minutes(target)
}

/// Minutes since the scheduled end, if overdue.
pub fn overdue_minutes(input: &AlertInput, thresholds: &AlertThresholds) -> Option<i64> {
    if input.status != PresenceStatus::CheckedIn || !input.is_scheduled_today {
        return None;
    }
    let minutes = minutes_since(input.now, input.scheduled_end_time?);
    (minutes >= thresholds.overdue_departure_minutes).then_some(minutes)
}

/// Minutes since the scheduled start, if late.
pub fn late_minutes(input: &AlertInput, thresholds: &AlertThresholds) -> Option<i64> {
    if input.status != PresenceStatus::Absent || !input.is_scheduled_today {
        return None;
    }
    let minutes = minutes_since(input.now, input.scheduled_start_time?);
    (minutes >= thresholds.late_arrival_minutes).then_some(minutes)
}

/// A QR check-in by a child not expected today.
///
/// Manual check-ins are never unexpected: staff entering them already know
/// the child is there.
pub fn is_unexpected(input: &AlertInput) -> bool {
    input.status == PresenceStatus::CheckedIn
        && !input.is_scheduled_today
        && input.check_in_method == Some(CheckInMethod::Qr)
}

/// Classify one child. The rules are mutually exclusive, so at most one
/// bucket applies.
pub fn classify(input: &AlertInput, thresholds: &AlertThresholds) -> Option<AlertKind> {
    if let Some(minutes_overdue) = overdue_minutes(input, thresholds) {
        return Some(AlertKind::Overdue { minutes_overdue });
    }
    if let Some(minutes_late) = late_minutes(input, thresholds) {
        return Some(AlertKind::Late { minutes_late });
    }
    if is_unexpected(input) {
        return Some(AlertKind::Unexpected);
    }
    if input.is_scheduled_today && input.status == PresenceStatus::Absent {
        return Some(AlertKind::NotArrived);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn input(status: PresenceStatus, scheduled: bool, now: NaiveTime) -> AlertInput {
        AlertInput {
            status,
            is_scheduled_today: scheduled,
            scheduled_start_time: Some(t(14, 0)),
            scheduled_end_time: Some(t(18, 0)),
            check_in_method: None,
            now,
        }
    }

    fn thresholds() -> AlertThresholds {
        AlertThresholds {
            late_arrival_minutes: 15,
            overdue_departure_minutes: 30,
        }
    }

    #[test]
    fn minutes_since_is_plain_difference() {
        assert_eq!(minutes_since(t(14, 20), t(14, 0)), 20);
        assert_eq!(minutes_since(t(13, 50), t(14, 0)), -10);
    }

    #[test]
    fn minutes_since_does_not_wrap_midnight() {
        // Past midnight the difference goes negative instead of wrapping.
        assert_eq!(minutes_since(t(0, 10), t(23, 50)), -1420);
    }

    #[test]
    fn late_at_exact_threshold() {
        let i = input(PresenceStatus::Absent, true, t(14, 15));
        assert_eq!(classify(&i, &thresholds()), Some(AlertKind::Late { minutes_late: 15 }));
    }

    #[test]
    fn not_arrived_before_threshold() {
        let i = input(PresenceStatus::Absent, true, t(14, 14));
        assert_eq!(classify(&i, &thresholds()), Some(AlertKind::NotArrived));
        assert!(!AlertKind::NotArrived.is_contact_worthy());
    }

    #[test]
    fn scheduled_absent_without_start_time_is_not_arrived() {
        let mut i = input(PresenceStatus::Absent, true, t(20, 0));
        i.scheduled_start_time = None;
        assert_eq!(classify(&i, &thresholds()), Some(AlertKind::NotArrived));
    }

    #[test]
    fn unscheduled_absent_child_raises_nothing() {
        let i = input(PresenceStatus::Absent, false, t(16, 0));
        assert_eq!(classify(&i, &thresholds()), None);
    }

    #[test]
    fn overdue_after_end_plus_threshold() {
        let i = input(PresenceStatus::CheckedIn, true, t(18, 45));
        assert_eq!(
            classify(&i, &thresholds()),
            Some(AlertKind::Overdue { minutes_overdue: 45 })
        );
        let early = input(PresenceStatus::CheckedIn, true, t(18, 29));
        assert_eq!(classify(&early, &thresholds()), None);
    }

    #[test]
    fn overdue_requires_end_time() {
        let mut i = input(PresenceStatus::CheckedIn, true, t(23, 0));
        i.scheduled_end_time = None;
        assert_eq!(classify(&i, &thresholds()), None);
    }

    #[test]
    fn checked_out_child_is_never_overdue() {
        let i = input(PresenceStatus::CheckedOut, true, t(23, 0));
        assert_eq!(classify(&i, &thresholds()), None);
    }

    #[test]
    fn unexpected_only_for_qr() {
        let mut i = input(PresenceStatus::CheckedIn, false, t(9, 0));
        i.check_in_method = Some(CheckInMethod::Qr);
        assert_eq!(classify(&i, &thresholds()), Some(AlertKind::Unexpected));

        i.check_in_method = Some(CheckInMethod::Manual);
        assert_eq!(classify(&i, &thresholds()), None);
    }

    #[test]
    fn unscheduled_child_is_never_overdue() {
        let mut i = input(PresenceStatus::CheckedIn, false, t(23, 0));
        i.check_in_method = Some(CheckInMethod::Qr);
        assert_eq!(classify(&i, &thresholds()), Some(AlertKind::Unexpected));
    }

    #[test]
    fn alert_kind_serializes_with_tag() {
        let json = serde_json::to_value(AlertKind::Late { minutes_late: 20 }).unwrap();
        assert_eq!(json["kind"], "late");
        assert_eq!(json["minutes_late"], 20);
    }
}
