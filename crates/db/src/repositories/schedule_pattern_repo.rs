//! Repository for the `schedule_patterns` table.

use carebook_core::types::EntityId;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::schedule_pattern::SchedulePattern;

/// Column list for the `schedule_patterns` table (aliased `sp`).
const COLUMNS: &str = "sp.id, sp.child_id, sp.monday, sp.tuesday, sp.wednesday, sp.thursday, \
                       sp.friday, sp.saturday, sp.sunday, sp.valid_from, sp.valid_to, \
                       sp.is_active, sp.created_at, sp.updated_at";

pub struct SchedulePatternRepo;

impl SchedulePatternRepo {
    /// Active patterns of a facility's children whose validity window
    /// contains `date`.
    pub async fn list_covering(
        pool: &PgPool,
        facility_id: EntityId,
        date: NaiveDate,
    ) -> Result<Vec<SchedulePattern>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM schedule_patterns sp \
             JOIN children c ON c.id = sp.child_id \
             WHERE c.facility_id = $1 \
               AND sp.is_active = true \
               AND sp.valid_from <= $2 \
               AND (sp.valid_to IS NULL OR sp.valid_to >= $2) \
             ORDER BY sp.child_id, sp.valid_from DESC"
        );
        sqlx::query_as::<_, SchedulePattern>(&query)
            .bind(facility_id)
            .bind(date)
            .fetch_all(pool)
            .await
    }

    /// Active patterns of one child whose validity window contains `date`.
    pub async fn list_covering_for_child(
        pool: &PgPool,
        child_id: EntityId,
        date: NaiveDate,
    ) -> Result<Vec<SchedulePattern>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM schedule_patterns sp \
             WHERE sp.child_id = $1 \
               AND sp.is_active = true \
               AND sp.valid_from <= $2 \
               AND (sp.valid_to IS NULL OR sp.valid_to >= $2) \
             ORDER BY sp.valid_from DESC"
        );
        sqlx::query_as::<_, SchedulePattern>(&query)
            .bind(child_id)
            .bind(date)
            .fetch_all(pool)
            .await
    }
}
