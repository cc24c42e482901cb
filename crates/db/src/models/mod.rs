//! Row types and insert/upsert DTOs.

pub mod attendance_log;
pub mod child;
pub mod daily_attendance;
pub mod schedule_pattern;
pub mod timetable;
