use axum::routing::get;
use axum::Router;

use crate::handlers::webhooks;
use crate::state::AppState;

/// Provider webhook routes (root-level, NOT under `/api/v1`).
///
/// ```text
/// GET    /webhooks/whatsapp     -> verify_subscription
/// POST   /webhooks/whatsapp     -> receive
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/webhooks/whatsapp",
        get(webhooks::verify_subscription).post(webhooks::receive),
    )
}
