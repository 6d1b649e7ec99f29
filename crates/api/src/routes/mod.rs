pub mod do_not_message;
pub mod health;
pub mod invites;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /weddings/{wedding_id}/invites
///     POST /precheck                  precheck
///     POST /send                      send (owner or admin)
///     GET  /runs                      list runs (?event_id, ?limit)
///     GET  /runs/{run_id}             run detail
///
/// /weddings/{wedding_id}/do-not-message
///     GET  /                          active entries
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/weddings/{wedding_id}/invites", invites::router())
        .nest(
            "/weddings/{wedding_id}/do-not-message",
            do_not_message::router(),
        )
}
