/// Children, facilities, users and log rows are keyed by UUID.
pub type EntityId = uuid::Uuid;

/// All stored timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
