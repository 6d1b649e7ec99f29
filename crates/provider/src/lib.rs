//! Provider gateway: the outbound messaging contract the engine depends on.
//!
//! The engine only sees [`MessagingProvider`] and its [`SendOutcome`]; the
//! WhatsApp Cloud API client and the recording test double both implement it.

pub mod config;
pub mod error;
pub mod recording;
pub mod whatsapp;

use async_trait::async_trait;
use serde::Serialize;

pub use config::ProviderConfig;
pub use error::ProviderError;
pub use recording::{RecordedSend, RecordingProvider};
pub use whatsapp::WhatsAppCloudApi;

/// A template message addressed to one phone number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateMessage {
    pub to: String,
    pub template_name: String,
    pub template_language: String,
    pub components: Option<Vec<serde_json::Value>>,
}

/// Result of one send attempt. Provider faults never escape as `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent {
        provider_message_id: String,
    },
    Failed {
        error_code: String,
        error_message: String,
    },
}

impl SendOutcome {
    pub fn provider_message_id(&self) -> Option<&str> {
        match self {
            Self::Sent {
                provider_message_id,
            } => Some(provider_message_id),
            Self::Failed { .. } => None,
        }
    }
}

#[async_trait]
pub trait MessagingProvider: Send + Sync {
    /// Whether credentials are present. Sends to an unconfigured provider
    /// are blocked by the eligibility policy before they reach it.
    fn is_configured(&self) -> bool;

    async fn send_template(&self, message: &TemplateMessage) -> SendOutcome;

    async fn send_text(&self, to: &str, body: &str) -> SendOutcome;
}
