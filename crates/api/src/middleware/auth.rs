//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use vows_core::error::CoreError;
use vows_core::roles::ROLE_ADMIN;
use vows_core::types::EntityId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Caller extracted from a JWT Bearer token in the `Authorization` header.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The acting user id (from `claims.sub`).
    pub user_id: EntityId,
    /// The wedding the token was issued for.
    pub wedding_id: EntityId,
    /// The role name (e.g. `"owner"`, `"admin"`, `"viewer"`).
    pub role: String,
}

impl AuthUser {
    /// Reject access to any wedding other than the token's own. Admins are
    /// not wedding-scoped.
    pub fn ensure_wedding(&self, wedding_id: &str) -> Result<(), AppError> {
        if self.role == ROLE_ADMIN || self.wedding_id == wedding_id {
            return Ok(());
        }
        Err(AppError::Core(CoreError::Forbidden(
            "Token does not grant access to this wedding".into(),
        )))
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
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
            wedding_id: claims.wedding_id,
            role: claims.role,
        })
    }
}
