use axum::routing::get;
use axum::Router;

use crate::handlers::do_not_message;
use crate::state::AppState;

/// Routes mounted at `/weddings/{wedding_id}/do-not-message`.
///
/// ```text
/// GET    /                      -> list_do_not_message
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(do_not_message::list_do_not_message))
}
