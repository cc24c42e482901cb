//! Shared response envelope types for API handlers.
//!
//! Attendance responses carry a `success` flag alongside the payload; error
//! bodies (see [`crate::error::AppError`]) carry `success: false`.

use serde::Serialize;

/// Standard `{ "success": true, "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
