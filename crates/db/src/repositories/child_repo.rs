//! Repository for the `children`, `classes` and `child_classes` tables.

use carebook_core::types::EntityId;
use sqlx::PgPool;

use crate::models::child::{Child, ChildClass};

/// Column list for the `children` table.
const COLUMNS: &str = "id, facility_id, name, school_id, grade, created_at, updated_at";

/// Read-only access to the child roster.
pub struct ChildRepo;

impl ChildRepo {
    /// Find a child by id within a facility.
    ///
    /// A child in another facility is indistinguishable from a missing one.
    pub async fn find_in_facility(
        pool: &PgPool,
        id: EntityId,
        facility_id: EntityId,
    ) -> Result<Option<Child>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM children WHERE id = $1 AND facility_id = $2");
        sqlx::query_as::<_, Child>(&query)
            .bind(id)
            .bind(facility_id)
            .fetch_optional(pool)
            .await
    }

    /// List all children of a facility, ordered by name.
    pub async fn list_by_facility(
        pool: &PgPool,
        facility_id: EntityId,
    ) -> Result<Vec<Child>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM children WHERE facility_id = $1 ORDER BY name, id");
        sqlx::query_as::<_, Child>(&query)
            .bind(facility_id)
            .fetch_all(pool)
            .await
    }

    /// Class links of one child, oldest link first.
    pub async fn list_classes(
        pool: &PgPool,
        child_id: EntityId,
    ) -> Result<Vec<ChildClass>, sqlx::Error> {
        sqlx::query_as::<_, ChildClass>(
            "SELECT cc.child_id, cc.class_id, c.name AS class_name, cc.is_current \
             FROM child_classes cc \
             JOIN classes c ON c.id = cc.class_id \
             WHERE cc.child_id = $1 \
             ORDER BY cc.created_at, c.name",
        )
        .bind(child_id)
        .fetch_all(pool)
        .await
    }

    /// Class links of every child in a facility, oldest link first.
    pub async fn list_classes_for_facility(
        pool: &PgPool,
        facility_id: EntityId,
    ) -> Result<Vec<ChildClass>, sqlx::Error> {
        sqlx::query_as::<_, ChildClass>(
            "SELECT cc.child_id, cc.class_id, c.name AS class_name, cc.is_current \
             FROM child_classes cc \
             JOIN classes c ON c.id = cc.class_id \
             JOIN children ch ON ch.id = cc.child_id \
             WHERE ch.facility_id = $1 \
             ORDER BY cc.child_id, cc.created_at, c.name",
        )
        .bind(facility_id)
        .fetch_all(pool)
        .await
    }
}
