use crate::SendOutcome;

/// Everything that can go wrong talking to the provider.
///
/// These never reach the engine as errors; [`ProviderError::into_outcome`]
/// folds each one into a [`SendOutcome::Failed`] code/message pair.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider credentials are not configured")]
    NotConfigured,

    #[error("Provider request timed out: {0}")]
    Timeout(reqwest::Error),

    #[error("Provider request failed: {0}")]
    Network(reqwest::Error),

    /// Non-2xx response; `code` is already mapped from the error payload.
    #[error("Provider returned HTTP {status}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("{0}")]
    MissingMessageId(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Network(err)
        }
    }
}

impl ProviderError {
    pub fn code(&self) -> &str {
        match self {
            Self::NotConfigured => "provider_configuration_missing",
            Self::Timeout(_) => "provider_timeout",
            Self::Network(_) => "provider_network_error",
            Self::Api { code, .. } => code,
            Self::MissingMessageId(_) => "provider_missing_message_id",
        }
    }

    pub fn into_outcome(self) -> SendOutcome {
        let error_code = self.code().to_string();
        let error_message = match self {
            Self::Api { message, .. } => message,
            Self::MissingMessageId(message) => message,
            other => other.to_string(),
        };
        SendOutcome::Failed {
            error_code,
            error_message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_keep_mapped_code_and_message() {
        let err = ProviderError::Api {
            status: 400,
            code: "131026".into(),
            message: "Message undeliverable".into(),
        };
        assert_eq!(
            err.into_outcome(),
            SendOutcome::Failed {
                error_code: "131026".into(),
                error_message: "Message undeliverable".into(),
            }
        );
    }

    #[test]
    fn not_configured_display() {
        let outcome = ProviderError::NotConfigured.into_outcome();
        assert_eq!(
            outcome,
            SendOutcome::Failed {
                error_code: "provider_configuration_missing".into(),
                error_message: "Provider credentials are not configured".into(),
            }
        );
    }
}
