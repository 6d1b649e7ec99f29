//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does not
//! meet the minimum requirement.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use vows_core::error::CoreError;
use vows_core::roles::can_send_invites;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `owner` or `admin` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn send(RequireSender(user): RequireSender) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireSender(pub AuthUser);

impl FromRequestParts<AppState> for RequireSender {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !can_send_invites(&user.role) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Owner or Admin role required".into(),
            )));
        }
        Ok(RequireSender(user))
    }
}
