//! Child roster rows. Lifecycle is managed elsewhere; attendance only reads.

use carebook_core::classes::ClassLink;
use carebook_core::types::{EntityId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `children` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Child {
    pub id: EntityId,
    pub facility_id: EntityId,
    pub name: String,
    pub school_id: Option<EntityId>,
    pub grade: Option<i16>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A child's class membership joined with the class name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChildClass {
    pub child_id: EntityId,
    pub class_id: EntityId,
    pub class_name: String,
    pub is_current: bool,
}

impl ClassLink for ChildClass {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn is_current(&self) -> bool {
        self.is_current
    }
}
