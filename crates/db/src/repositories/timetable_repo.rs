//! Repository for the `school_timetables` table.

use carebook_core::types::EntityId;
use sqlx::PgPool;

use crate::models::timetable::TimetableSlot;

pub struct TimetableRepo;

impl TimetableRepo {
    /// Timetable slots on `day_of_week` (ISO, Monday = 1) for every school
    /// attended by a child of the facility.
    pub async fn list_for_facility_day(
        pool: &PgPool,
        facility_id: EntityId,
        day_of_week: i16,
    ) -> Result<Vec<TimetableSlot>, sqlx::Error> {
        sqlx::query_as::<_, TimetableSlot>(
            "SELECT DISTINCT st.school_id, st.grade, st.day_of_week, st.start_time, st.end_time \
             FROM school_timetables st \
             JOIN children c ON c.school_id = st.school_id AND c.grade = st.grade \
             WHERE c.facility_id = $1 AND st.day_of_week = $2",
        )
        .bind(facility_id)
        .bind(day_of_week)
        .fetch_all(pool)
        .await
    }
}
