//! Handlers for invite precheck, send runs and run inspection.
//!
//! Every endpoint is scoped to the `{wedding_id}` path segment and requires
//! a token for that wedding. Starting a run additionally requires
//! [`RequireSender`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;
use vows_core::audience::AudienceFilter;
use vows_core::types::EntityId;
use vows_engine::dispatch::DispatchRequest;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireSender;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_TEMPLATE_LANGUAGE: &str = "en";

fn default_template_language() -> String {
    DEFAULT_TEMPLATE_LANGUAGE.to_string()
}

/// Body of the precheck and send endpoints.
#[derive(Debug, Deserialize, Validate)]
pub struct InviteDispatchRequest {
    #[validate(length(min = 1, max = 64))]
    pub event_id: String,
    #[validate(length(min = 1, max = 120))]
    pub template_name: String,
    #[serde(default = "default_template_language")]
    #[validate(length(min = 1, max = 16))]
    pub template_language: String,
    #[serde(default)]
    pub audience: AudienceFilter,
}

impl InviteDispatchRequest {
    /// Trim, validate and bind to a wedding and actor.
    fn into_dispatch(self, wedding_id: EntityId, actor_id: EntityId) -> AppResult<DispatchRequest> {
        let trimmed = Self {
            event_id: self.event_id.trim().to_string(),
            template_name: self.template_name.trim().to_string(),
            template_language: self.template_language.trim().to_string(),
            audience: self.audience,
        };
        trimmed.validate()?;

        Ok(DispatchRequest {
            wedding_id,
            event_id: trimmed.event_id,
            actor_id: Some(actor_id),
            template_name: trimmed.template_name,
            template_language: trimmed.template_language,
            filter: trimmed.audience,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RunListParams {
    pub event_id: Option<String>,
    pub limit: Option<i64>,
}

/// POST /api/v1/weddings/{wedding_id}/invites/precheck
///
/// Evaluate the audience against the send policy without sending.
pub async fn precheck(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(wedding_id): Path<EntityId>,
    Json(input): Json<InviteDispatchRequest>,
) -> AppResult<impl IntoResponse> {
    auth.ensure_wedding(&wedding_id)?;
    let request = input.into_dispatch(wedding_id, auth.user_id)?;

    let report = state.engine.dispatch.precheck(&request).await?;

    Ok(Json(DataResponse { data: report }))
}

/// POST /api/v1/weddings/{wedding_id}/invites/send
///
/// Run a dispatch to completion and return the finalized run.
pub async fn send(
    RequireSender(auth): RequireSender,
    State(state): State<AppState>,
    Path(wedding_id): Path<EntityId>,
    Json(input): Json<InviteDispatchRequest>,
) -> AppResult<impl IntoResponse> {
    auth.ensure_wedding(&wedding_id)?;
    let request = input.into_dispatch(wedding_id, auth.user_id.clone())?;

    let run = state.engine.dispatch.dispatch_run(&request).await?;

    tracing::info!(
        run_id = %run.id,
        user_id = %auth.user_id,
        status = %run.status,
        "Invite send run requested",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: run })))
}

/// GET /api/v1/weddings/{wedding_id}/invites/runs
pub async fn list_runs(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(wedding_id): Path<EntityId>,
    Query(params): Query<RunListParams>,
) -> AppResult<impl IntoResponse> {
    auth.ensure_wedding(&wedding_id)?;

    let runs = state
        .engine
        .inspect
        .list_runs(&wedding_id, params.event_id.as_deref(), params.limit)
        .await?;

    Ok(Json(DataResponse { data: runs }))
}

/// GET /api/v1/weddings/{wedding_id}/invites/runs/{run_id}
///
/// The run with its messages and their recent transitions and receipts.
pub async fn get_run(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((wedding_id, run_id)): Path<(EntityId, EntityId)>,
) -> AppResult<impl IntoResponse> {
    auth.ensure_wedding(&wedding_id)?;

    let detail = state.engine.inspect.run_detail(&wedding_id, &run_id).await?;

    Ok(Json(DataResponse { data: detail }))
}
