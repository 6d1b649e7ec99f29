//! Provider webhook endpoints.
//!
//! These are called by the messaging provider, not by users: they carry no
//! bearer token and authenticate through the verify token and the
//! `x-hub-signature-256` HMAC instead.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde::Deserialize;
use vows_core::error::CoreError;
use vows_core::webhook::SIGNATURE_HEADER;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Acknowledgement body expected by the provider.
pub const EVENT_RECEIVED: &str = "EVENT_RECEIVED";

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// GET /webhooks/whatsapp
///
/// Subscription handshake: echo `hub.challenge` when the verify token matches.
pub async fn verify_subscription(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> AppResult<impl IntoResponse> {
    let expected = &state.config.webhook.verify_token;
    let token_matches = !expected.is_empty() && params.verify_token.as_deref() == Some(expected.as_str());

    if params.mode.as_deref() != Some("subscribe") || !token_matches {
        tracing::warn!(mode = ?params.mode, "Webhook subscription verification refused");
        return Err(AppError::Core(CoreError::Forbidden(
            "Webhook verification failed".into(),
        )));
    }

    tracing::info!("Webhook subscription verified");
    Ok((StatusCode::OK, params.challenge.unwrap_or_default()))
}

/// POST /webhooks/whatsapp
///
/// 401 when the signature does not verify; 200 otherwise, including for a
/// body that could not be decoded (a rejected receipt is kept for it).
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

    let summary = state.engine.webhooks.ingest(&body, signature).await?;

    if !summary.authenticated {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid webhook signature".into(),
        )));
    }
    Ok((StatusCode::OK, EVENT_RECEIVED))
}
