/// Default number of provider calls in flight during one run.
pub const DEFAULT_DISPATCH_CONCURRENCY: usize = 1;

/// Default idle window after which an active RSVP session expires.
pub const DEFAULT_RSVP_SESSION_TTL_HOURS: i64 = 72;

/// Runtime knobs for the engine, injected by the binary.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Provider calls in flight per run. `1` dispatches strictly in order.
    pub dispatch_concurrency: usize,
    pub rsvp_session_ttl_hours: i64,
    /// Shared secret for webhook HMAC verification. Empty rejects everything.
    pub webhook_app_secret: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dispatch_concurrency: DEFAULT_DISPATCH_CONCURRENCY,
            rsvp_session_ttl_hours: DEFAULT_RSVP_SESSION_TTL_HOURS,
            webhook_app_secret: String::new(),
        }
    }
}
