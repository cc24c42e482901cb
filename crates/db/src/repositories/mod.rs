//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` (or any Postgres executor, where a method must
//! also run inside a transaction) as the first argument.

pub mod attendance_log_repo;
pub mod child_repo;
pub mod daily_attendance_repo;
pub mod schedule_pattern_repo;
pub mod timetable_repo;

pub use attendance_log_repo::AttendanceLogRepo;
pub use child_repo::ChildRepo;
pub use daily_attendance_repo::DailyAttendanceRepo;
pub use schedule_pattern_repo::SchedulePatternRepo;
pub use timetable_repo::TimetableRepo;
