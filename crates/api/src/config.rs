use vows_engine::config::{EngineConfig, DEFAULT_DISPATCH_CONCURRENCY, DEFAULT_RSVP_SESSION_TTL_HOURS};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Grace period for in-flight requests after a shutdown signal (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Provider calls in flight per send run (default: `1`).
    pub dispatch_concurrency: usize,
    /// Idle hours before an active RSVP session expires (default: `72`).
    pub rsvp_session_ttl_hours: i64,
    pub jwt: JwtConfig,
    pub webhook: WebhookConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                    |
    /// |--------------------------|----------------------------|
    /// | `HOST`                   | `0.0.0.0`                  |
    /// | `PORT`                   | `3000`                     |
    /// | `CORS_ORIGINS`           | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`  | `30`                       |
    /// | `DISPATCH_CONCURRENCY`   | `1`                        |
    /// | `RSVP_SESSION_TTL_HOURS` | `72`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let dispatch_concurrency: usize = std::env::var("DISPATCH_CONCURRENCY")
            .unwrap_or_else(|_| DEFAULT_DISPATCH_CONCURRENCY.to_string())
            .parse()
            .expect("DISPATCH_CONCURRENCY must be a valid usize");

        let rsvp_session_ttl_hours: i64 = std::env::var("RSVP_SESSION_TTL_HOURS")
            .unwrap_or_else(|_| DEFAULT_RSVP_SESSION_TTL_HOURS.to_string())
            .parse()
            .expect("RSVP_SESSION_TTL_HOURS must be a valid i64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            dispatch_concurrency,
            rsvp_session_ttl_hours,
            jwt: JwtConfig::from_env(),
            webhook: WebhookConfig::from_env(),
        }
    }

    /// The knobs the engine needs, taken from this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            dispatch_concurrency: self.dispatch_concurrency,
            rsvp_session_ttl_hours: self.rsvp_session_ttl_hours,
            webhook_app_secret: self.webhook.app_secret.clone(),
        }
    }
}

/// Provider webhook credentials.
#[derive(Debug, Clone, Default)]
pub struct WebhookConfig {
    /// HMAC key for `x-hub-signature-256`. Empty rejects every delivery.
    pub app_secret: String,
    /// Token echoed back during subscription verification.
    pub verify_token: String,
}

impl WebhookConfig {
    /// | Env Var                         | Default |
    /// |---------------------------------|---------|
    /// | `WHATSAPP_WEBHOOK_APP_SECRET`   | empty   |
    /// | `WHATSAPP_WEBHOOK_VERIFY_TOKEN` | empty   |
    pub fn from_env() -> Self {
        let app_secret = std::env::var("WHATSAPP_WEBHOOK_APP_SECRET").unwrap_or_default();
        if app_secret.is_empty() {
            tracing::warn!("WHATSAPP_WEBHOOK_APP_SECRET is not set; webhooks will be rejected");
        }
        Self {
            app_secret,
            verify_token: std::env::var("WHATSAPP_WEBHOOK_VERIFY_TOKEN").unwrap_or_default(),
        }
    }
}
