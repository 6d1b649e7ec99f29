use std::time::Duration;

/// Default Graph API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://graph.facebook.com/v21.0";

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Connection settings for the WhatsApp Cloud API.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_base_url: String,
    pub access_token: Option<String>,
    pub phone_number_id: Option<String>,
    pub request_timeout_secs: u64,
}

impl ProviderConfig {
    /// Load provider settings from environment variables.
    ///
    /// | Env Var                          | Default                           |
    /// |----------------------------------|-----------------------------------|
    /// | `WHATSAPP_API_BASE_URL`          | `https://graph.facebook.com/v21.0`|
    /// | `WHATSAPP_ACCESS_TOKEN`          | unset                             |
    /// | `WHATSAPP_PHONE_NUMBER_ID`       | unset                             |
    /// | `WHATSAPP_REQUEST_TIMEOUT_SECS`  | `10`                              |
    ///
    /// Missing credentials leave the config unconfigured rather than failing.
    pub fn from_env() -> Self {
        let api_base_url = std::env::var("WHATSAPP_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.into())
            .trim_end_matches('/')
            .to_string();

        let request_timeout_secs: u64 = std::env::var("WHATSAPP_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        Self {
            api_base_url,
            access_token: non_empty_env("WHATSAPP_ACCESS_TOKEN"),
            phone_number_id: non_empty_env("WHATSAPP_PHONE_NUMBER_ID"),
            request_timeout_secs,
        }
    }

    /// A config with no credentials.
    pub fn unconfigured() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            access_token: None,
            phone_number_id: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.access_token.is_some() && self.phone_number_id.is_some()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// `{base}/{phone_number_id}/messages`, if configured.
    pub fn messages_endpoint(&self) -> Option<String> {
        self.phone_number_id
            .as_deref()
            .map(|id| format!("{}/{id}/messages", self.api_base_url))
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_requires_token_and_phone_number_id() {
        let mut config = ProviderConfig::unconfigured();
        assert!(!config.is_configured());
        assert_eq!(config.messages_endpoint(), None);

        config.access_token = Some("token".into());
        assert!(!config.is_configured());

        config.phone_number_id = Some("1234".into());
        assert!(config.is_configured());
        assert_eq!(
            config.messages_endpoint().as_deref(),
            Some("https://graph.facebook.com/v21.0/1234/messages")
        );
    }
}
