use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use vows_core::types::EntityId;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/weddings/{wedding_id}/do-not-message
///
/// Active entries, newest first.
pub async fn list_do_not_message(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(wedding_id): Path<EntityId>,
) -> AppResult<impl IntoResponse> {
    auth.ensure_wedding(&wedding_id)?;

    let entries = state.engine.inspect.list_do_not_message(&wedding_id).await?;

    Ok(Json(DataResponse { data: entries }))
}
