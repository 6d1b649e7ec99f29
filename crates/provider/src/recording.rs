//! In-process provider that records every send.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{MessagingProvider, SendOutcome, TemplateMessage};

/// Error code reported for phones configured to fail.
pub const RECORDED_FAILURE_CODE: &str = "131026";

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedSend {
    Template(TemplateMessage),
    Text { to: String, body: String },
}

impl RecordedSend {
    pub fn to(&self) -> &str {
        match self {
            Self::Template(m) => &m.to,
            Self::Text { to, .. } => to,
        }
    }
}

/// Returns `wamid.test-N` ids, except for phones registered with
/// [`RecordingProvider::failing_for`].
#[derive(Debug)]
pub struct RecordingProvider {
    configured: bool,
    failing: HashSet<String>,
    counter: AtomicU64,
    sends: Mutex<Vec<RecordedSend>>,
}

impl Default for RecordingProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self {
            configured: true,
            failing: HashSet::new(),
            counter: AtomicU64::new(0),
            sends: Mutex::new(Vec::new()),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    pub fn failing_for(mut self, phone: &str) -> Self {
        self.failing.insert(phone.to_string());
        self
    }

    pub async fn sends(&self) -> Vec<RecordedSend> {
        self.sends.lock().await.clone()
    }

    /// Bodies of text sends, in order.
    pub async fn texts(&self) -> Vec<String> {
        self.sends
            .lock()
            .await
            .iter()
            .filter_map(|s| match s {
                RecordedSend::Text { body, .. } => Some(body.clone()),
                RecordedSend::Template(_) => None,
            })
            .collect()
    }

    /// The id the next successful send will return.
    pub fn peek_next_id(&self) -> String {
        format!("wamid.test-{}", self.counter.load(Ordering::SeqCst) + 1)
    }

    async fn record(&self, send: RecordedSend) -> SendOutcome {
        let fails = self.failing.contains(send.to());
        self.sends.lock().await.push(send);
        if fails {
            return SendOutcome::Failed {
                error_code: RECORDED_FAILURE_CODE.into(),
                error_message: "Message undeliverable.".into(),
            };
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        SendOutcome::Sent {
            provider_message_id: format!("wamid.test-{n}"),
        }
    }
}

#[async_trait]
impl MessagingProvider for RecordingProvider {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn send_template(&self, message: &TemplateMessage) -> SendOutcome {
        self.record(RecordedSend::Template(message.clone())).await
    }

    async fn send_text(&self, to: &str, body: &str) -> SendOutcome {
        self.record(RecordedSend::Text {
            to: to.to_string(),
            body: body.to_string(),
        })
        .await
    }
}
