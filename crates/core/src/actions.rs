//! Manual staff attendance actions (state machine).
//!
//! Each action has a precondition on whether the child currently has an
//! open log today, and a single effect on the log and/or the daily record.
//! The api crate applies the effect against storage.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::schedule::DailyStatus;

/// Message for `check_out` without an open log.
pub const NO_ACTIVE_TO_CHECK_OUT: &str = "No active attendance to check out";

/// Message for `confirm_unexpected` without an open log.
pub const NO_ACTIVE_TO_CONFIRM: &str = "No active attendance to confirm";

/// Message for actions that require the child not to be present.
pub const ALREADY_CHECKED_IN: &str = "Already checked in";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceAction {
    CheckIn,
    CheckOut,
    MarkAbsent,
    AddSchedule,
    ConfirmUnexpected,
}

impl AttendanceAction {
    pub const ALL: [AttendanceAction; 5] = [
        Self::CheckIn,
        Self::CheckOut,
        Self::MarkAbsent,
        Self::AddSchedule,
        Self::ConfirmUnexpected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CheckIn => "check_in",
            Self::CheckOut => "check_out",
            Self::MarkAbsent => "mark_absent",
            Self::AddSchedule => "add_schedule",
            Self::ConfirmUnexpected => "confirm_unexpected",
        }
    }
}

impl fmt::Display for AttendanceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown action: {s}")))
    }
}

/// What applying an action does to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionEffect {
    /// Open a manual log and set the daily record, as one unit.
    OpenLog { daily_status: DailyStatus },
    /// Close the currently open log manually.
    CloseOpenLog,
    /// Upsert the daily record only.
    SetDailyStatus(DailyStatus),
}

impl ActionEffect {
    /// The daily status this effect writes, if any.
    pub fn daily_status(self) -> Option<DailyStatus> {
        match self {
            Self::OpenLog { daily_status } | Self::SetDailyStatus(daily_status) => {
                Some(daily_status)
            }
            Self::CloseOpenLog => None,
        }
    }
}

/// Check the action's precondition and return its effect.
///
/// A manual check-in always marks the day `scheduled`, whether or not a
/// daily record existed; only `confirm_unexpected` writes `irregular`.
pub fn plan(action: AttendanceAction, has_open_log: bool) -> Result<ActionEffect, CoreError> {
    match (action, has_open_log) {
        (AttendanceAction::CheckIn, true) | (AttendanceAction::MarkAbsent, true) => {
            Err(CoreError::Conflict(ALREADY_CHECKED_IN.into()))
        }
        (AttendanceAction::CheckIn, false) => Ok(ActionEffect::OpenLog {
            daily_status: DailyStatus::Scheduled,
        }),
        (AttendanceAction::CheckOut, false) => {
            Err(CoreError::NotFound(NO_ACTIVE_TO_CHECK_OUT.into()))
        }
        (AttendanceAction::CheckOut, true) => Ok(ActionEffect::CloseOpenLog),
        (AttendanceAction::MarkAbsent, false) => {
            Ok(ActionEffect::SetDailyStatus(DailyStatus::Absent))
        }
        (AttendanceAction::AddSchedule, _) => {
            Ok(ActionEffect::SetDailyStatus(DailyStatus::Scheduled))
        }
        (AttendanceAction::ConfirmUnexpected, false) => {
            Err(CoreError::NotFound(NO_ACTIVE_TO_CONFIRM.into()))
        }
        (AttendanceAction::ConfirmUnexpected, true) => {
            Ok(ActionEffect::SetDailyStatus(DailyStatus::Irregular))
        }
    }
}
