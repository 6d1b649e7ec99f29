use axum::routing::{get, post};
use axum::Router;

use crate::handlers::invites;
use crate::state::AppState;

/// Invite routes mounted at `/weddings/{wedding_id}/invites`.
///
/// ```text
/// POST   /precheck              -> precheck
/// POST   /send                  -> send
/// GET    /runs                  -> list_runs
/// GET    /runs/{run_id}         -> get_run
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/precheck", post(invites::precheck))
        .route("/send", post(invites::send))
        .route("/runs", get(invites::list_runs))
        .route("/runs/{run_id}", get(invites::get_run))
}
