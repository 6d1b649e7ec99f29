//! Read-side queries over runs, messages and do-not-message entries.

use std::sync::Arc;

use serde::Serialize;
use vows_core::error::CoreError;
use vows_db::models::dnm::DoNotMessage;
use vows_db::models::message::{InviteMessage, LifecycleTransition};
use vows_db::models::receipt::WebhookReceipt;
use vows_db::models::run::InviteSendRun;
use vows_db::stores::{DoNotMessageStore, MessageStore, ReceiptStore, RunStore};

use crate::error::EngineResult;

pub const DEFAULT_RUN_LIMIT: i64 = 50;
pub const MAX_RUN_LIMIT: i64 = 100;
pub const DNM_LIST_LIMIT: i64 = 200;
/// History rows attached to each message in a run detail.
pub const MESSAGE_HISTORY_LIMIT: i64 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct MessageDetail {
    #[serde(flatten)]
    pub message: InviteMessage,
    pub transitions: Vec<LifecycleTransition>,
    pub receipts: Vec<WebhookReceipt>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunDetail {
    pub run: InviteSendRun,
    pub messages: Vec<MessageDetail>,
}

#[derive(Clone)]
pub struct InviteInspector {
    runs: Arc<dyn RunStore>,
    messages: Arc<dyn MessageStore>,
    receipts: Arc<dyn ReceiptStore>,
    do_not_message: Arc<dyn DoNotMessageStore>,
}

impl InviteInspector {
    pub fn new(
        runs: Arc<dyn RunStore>,
        messages: Arc<dyn MessageStore>,
        receipts: Arc<dyn ReceiptStore>,
        do_not_message: Arc<dyn DoNotMessageStore>,
    ) -> Self {
        Self {
            runs,
            messages,
            receipts,
            do_not_message,
        }
    }

    /// Runs of a wedding, newest first. `limit` defaults to 50 and is
    /// clamped to `1..=100`.
    pub async fn list_runs(
        &self,
        wedding_id: &str,
        event_id: Option<&str>,
        limit: Option<i64>,
    ) -> EngineResult<Vec<InviteSendRun>> {
        let limit = limit.unwrap_or(DEFAULT_RUN_LIMIT).clamp(1, MAX_RUN_LIMIT);
        Ok(self.runs.list_runs(wedding_id, event_id, limit).await?)
    }

    /// One run with its messages, most recently updated first.
    pub async fn run_detail(&self, wedding_id: &str, run_id: &str) -> EngineResult<RunDetail> {
        let run = self
            .runs
            .find_run(wedding_id, run_id)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "InviteSendRun",
                id: run_id.to_string(),
            })?;

        let mut messages = self.messages.list_by_run(&run.id).await?;
        messages.sort_by(|a, b| {
            b.last_status_at
                .cmp(&a.last_status_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        let mut details = Vec::with_capacity(messages.len());
        for message in messages {
            let transitions = self
                .messages
                .list_transitions(&message.id, MESSAGE_HISTORY_LIMIT)
                .await?;
            let receipts = self
                .receipts
                .list_by_message(&message.id, MESSAGE_HISTORY_LIMIT)
                .await?;
            details.push(MessageDetail {
                message,
                transitions,
                receipts,
            });
        }
        Ok(RunDetail {
            run,
            messages: details,
        })
    }

    pub async fn list_do_not_message(&self, wedding_id: &str) -> EngineResult<Vec<DoNotMessage>> {
        Ok(self
            .do_not_message
            .list_active(wedding_id, Some(DNM_LIST_LIMIT))
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use vows_core::audience::AudienceFilter;
    use vows_core::status::GuestSide;
    use vows_core::webhook::compute_signature;

    use super::*;
    use crate::dispatch::DispatchRequest;
    use crate::error::EngineError;
    use crate::test_support::{status_payload, unit, Harness, WEBHOOK_SECRET};

    fn request(event_id: &str) -> DispatchRequest {
        DispatchRequest {
            wedding_id: "w1".into(),
            event_id: event_id.into(),
            actor_id: None,
            template_name: "wedding_invite".into(),
            template_language: "en".into(),
            filter: AudienceFilter::default(),
        }
    }

    #[tokio::test]
    async fn run_detail_carries_message_history() {
        let h = Harness::new();
        h.store.seed_unit("w1", unit("u1", "Das", GuestSide::Bride, Some("+919800000001"))).await;
        h.store.seed_unit("w1", unit("u2", "Roy", GuestSide::Bride, Some("+919800000002"))).await;
        let run = h.engine.dispatch.dispatch_run(&request("e1")).await.unwrap();

        let body = status_payload("wamid.test-1", "delivered", Some(1_900_000_000));
        let signature = compute_signature(WEBHOOK_SECRET, &body);
        h.engine.webhooks.ingest(&body, Some(&signature)).await.unwrap();

        let detail = h.engine.inspect.run_detail("w1", &run.id).await.unwrap();
        assert_eq!(detail.messages.len(), 2);
        let first = &detail.messages[0];
        assert_eq!(first.message.provider_message_id.as_deref(), Some("wamid.test-1"));
        assert_eq!(first.transitions.len(), 1);
        assert_eq!(first.receipts.len(), 1);
        assert!(detail.messages[1].transitions.is_empty());
    }

    #[tokio::test]
    async fn run_detail_is_scoped_to_the_wedding() {
        let h = Harness::new();
        let run = h.engine.dispatch.dispatch_run(&request("e1")).await.unwrap();

        let err = h.engine.inspect.run_detail("w2", &run.id).await.unwrap_err();
        assert_matches!(err, EngineError::Core(CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn run_listing_filters_by_event_and_clamps_limit() {
        let h = Harness::new();
        for event in ["e1", "e1", "e2"] {
            h.engine.dispatch.dispatch_run(&request(event)).await.unwrap();
        }

        let inspect = &h.engine.inspect;
        assert_eq!(inspect.list_runs("w1", None, None).await.unwrap().len(), 3);
        assert_eq!(inspect.list_runs("w1", Some("e1"), None).await.unwrap().len(), 2);
        assert_eq!(inspect.list_runs("w1", None, Some(0)).await.unwrap().len(), 1);
    }
}
