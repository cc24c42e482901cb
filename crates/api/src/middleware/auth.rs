//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use carebook_core::error::CoreError;
use carebook_core::types::EntityId;
use carebook_db::store::AttendanceStore;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated staff user extracted from a JWT Bearer token in the
/// `Authorization` header.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     let facility_id = user.require_facility()?;
///     tracing::info!(user_id = %user.user_id, %facility_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's id (from `claims.sub`).
    pub user_id: EntityId,
    /// Facility the session is bound to, if any.
    pub facility_id: Option<EntityId>,
    /// The user's role name.
    pub role: String,
}

impl AuthUser {
    /// The facility this session acts for.
    ///
    /// Every attendance operation is facility-scoped, so a session without a
    /// bound facility is treated as unauthenticated.
    pub fn require_facility(&self) -> Result<EntityId, AppError> {
        self.facility_id.ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "No facility bound to this session".into(),
            ))
        })
    }
}

impl<S: AttendanceStore> FromRequestParts<AppState<S>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            facility_id: claims.facility_id,
            role: claims.role,
        })
    }
}
