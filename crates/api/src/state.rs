use std::sync::Arc;

use vows_engine::Engine;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Dispatch, webhook and RSVP services over the configured stores.
    pub engine: Arc<Engine>,
    pub config: Arc<ServerConfig>,
}
