//! HTTP client for the WhatsApp Cloud API `messages` endpoint.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::{MessagingProvider, SendOutcome, TemplateMessage};

/// Error body returned by the Graph API.
#[derive(Debug, Default, Deserialize)]
struct GraphErrorBody {
    code: Option<i64>,
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GraphMessageRef {
    id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GraphResponse {
    #[serde(default)]
    messages: Vec<GraphMessageRef>,
    error: Option<GraphErrorBody>,
}

/// Map an error payload to a code: numeric code, then error type, then
/// `provider_error`.
fn map_error(body: Option<&GraphErrorBody>, fallback: &str) -> (String, String) {
    let message = body
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| fallback.to_string());
    let code = match body {
        Some(GraphErrorBody { code: Some(code), .. }) => code.to_string(),
        Some(GraphErrorBody { kind: Some(kind), .. }) if !kind.is_empty() => kind.clone(),
        _ => "provider_error".to_string(),
    };
    (code, message)
}

pub struct WhatsAppCloudApi {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl WhatsAppCloudApi {
    /// Build a client whose requests all carry `config.request_timeout()`.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { client, config })
    }

    async fn post_message(
        &self,
        body: serde_json::Value,
        fallback: &str,
        missing_id: &str,
    ) -> Result<String, ProviderError> {
        let (Some(endpoint), Some(token)) = (
            self.config.messages_endpoint(),
            self.config.access_token.as_deref(),
        ) else {
            return Err(ProviderError::NotConfigured);
        };

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        let payload: GraphResponse = serde_json::from_slice(&bytes).unwrap_or_default();

        if !status.is_success() {
            let (code, message) = map_error(payload.error.as_ref(), fallback);
            return Err(ProviderError::Api {
                status: status.as_u16(),
                code,
                message,
            });
        }

        payload
            .messages
            .into_iter()
            .find_map(|m| m.id.filter(|id| !id.is_empty()))
            .ok_or_else(|| ProviderError::MissingMessageId(missing_id.to_string()))
    }

    fn finish(&self, to: &str, result: Result<String, ProviderError>) -> SendOutcome {
        match result {
            Ok(provider_message_id) => SendOutcome::Sent {
                provider_message_id,
            },
            Err(err) => {
                tracing::warn!(phone = %to, error = %err, code = err.code(), "Provider send failed");
                err.into_outcome()
            }
        }
    }
}

#[async_trait]
impl MessagingProvider for WhatsAppCloudApi {
    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn send_template(&self, message: &TemplateMessage) -> SendOutcome {
        let mut template = serde_json::json!({
            "name": message.template_name,
            "language": { "code": message.template_language },
        });
        if let Some(components) = &message.components {
            template["components"] = serde_json::json!(components);
        }
        let body = serde_json::json!({
            "messaging_product": "whatsapp",
            "to": message.to,
            "type": "template",
            "template": template,
        });
        let result = self
            .post_message(
                body,
                "Provider request failed.",
                "Provider accepted request but did not return a message id.",
            )
            .await;
        self.finish(&message.to, result)
    }

    async fn send_text(&self, to: &str, text: &str) -> SendOutcome {
        let body = serde_json::json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "preview_url": false, "body": text },
        });
        let result = self
            .post_message(
                body,
                "RSVP prompt failed.",
                "RSVP prompt accepted without provider message id.",
            )
            .await;
        self.finish(to, result)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn numeric_code_wins_over_type() {
        let body = GraphErrorBody {
            code: Some(131047),
            message: Some("Re-engagement message".into()),
            kind: Some("OAuthException".into()),
        };
        assert_eq!(
            map_error(Some(&body), "fallback"),
            ("131047".to_string(), "Re-engagement message".to_string())
        );
    }

    #[test]
    fn type_then_generic_code() {
        let typed = GraphErrorBody {
            code: None,
            message: None,
            kind: Some("OAuthException".into()),
        };
        assert_eq!(
            map_error(Some(&typed), "fallback"),
            ("OAuthException".to_string(), "fallback".to_string())
        );
        assert_eq!(
            map_error(None, "Provider request failed."),
            ("provider_error".to_string(), "Provider request failed.".to_string())
        );
    }

    #[tokio::test]
    async fn unconfigured_client_fails_without_network() {
        let api = WhatsAppCloudApi::new(ProviderConfig::unconfigured()).unwrap();
        assert!(!api.is_configured());
        let outcome = api.send_text("+919800000001", "hello").await;
        assert_matches!(
            outcome,
            SendOutcome::Failed { ref error_code, .. } if error_code == "provider_configuration_missing"
        );
    }

    #[test]
    fn success_payload_yields_message_id() {
        let payload: GraphResponse = serde_json::from_str(
            r#"{"messaging_product":"whatsapp","messages":[{"id":"wamid.HBg"}]}"#,
        )
        .unwrap();
        assert_eq!(payload.messages[0].id.as_deref(), Some("wamid.HBg"));
    }
}
