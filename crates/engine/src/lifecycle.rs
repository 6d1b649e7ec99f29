//! Applies provider status events to stored invite messages.

use std::sync::Arc;

use chrono::Utc;
use vows_core::lifecycle::{evaluate_transition, status_patch, TransitionDecision};
use vows_core::status::LifecycleStatus;
use vows_core::types::{EntityId, Timestamp};
use vows_db::models::message::{CreateLifecycleTransition, InviteMessage, LifecycleTransition};
use vows_db::stores::MessageStore;

use crate::error::EngineResult;

/// Compare-and-set attempts before giving up on a contended message.
const MAX_APPLY_ATTEMPTS: usize = 5;

#[derive(Debug, Clone)]
pub struct TransitionResult {
    pub from: LifecycleStatus,
    pub to: LifecycleStatus,
    pub decision: TransitionDecision,
    pub transition: LifecycleTransition,
}

impl TransitionResult {
    pub fn applied(&self) -> bool {
        self.decision.apply
    }
}

#[derive(Clone)]
pub struct LifecycleStateMachine {
    messages: Arc<dyn MessageStore>,
}

impl LifecycleStateMachine {
    pub fn new(messages: Arc<dyn MessageStore>) -> Self {
        Self { messages }
    }

    /// Move `message` towards `to`, recording exactly one transition row.
    ///
    /// The decision is re-evaluated against the freshly stored status each
    /// time a concurrent writer wins the compare-and-set. Returns `None`
    /// when the message vanished or every attempt lost the race; the latter
    /// still records a transition row.
    pub async fn apply(
        &self,
        message: InviteMessage,
        to: LifecycleStatus,
        event_at: Option<Timestamp>,
        receipt_id: Option<EntityId>,
    ) -> EngineResult<Option<TransitionResult>> {
        let mut current = message;

        for attempt in 1..=MAX_APPLY_ATTEMPTS {
            let decision = evaluate_transition(current.lifecycle_status, to);

            if decision.apply {
                let patch = status_patch(to, event_at, Utc::now());
                let swapped = self
                    .messages
                    .compare_and_set_status(&current.id, current.lifecycle_status, &patch)
                    .await?;
                if !swapped {
                    tracing::debug!(
                        message_id = %current.id,
                        attempt,
                        "Lifecycle compare-and-set lost, reloading"
                    );
                    match self.reload(&current).await? {
                        Some(fresh) => {
                            current = fresh;
                            continue;
                        }
                        None => return Ok(None),
                    }
                }
            }

            let transition = self
                .messages
                .record_transition(&CreateLifecycleTransition::from_decision(
                    &current,
                    to,
                    &decision,
                    receipt_id,
                    event_at,
                ))
                .await?;

            tracing::debug!(
                message_id = %current.id,
                from = %current.lifecycle_status,
                to = %to,
                applied = decision.apply,
                reason = decision.reason,
                "Lifecycle transition evaluated"
            );
            return Ok(Some(TransitionResult {
                from: current.lifecycle_status,
                to,
                decision,
                transition,
            }));
        }

        tracing::warn!(message_id = %current.id, to = %to, "Lifecycle transition abandoned after retries");
        self.messages
            .record_transition(&CreateLifecycleTransition::from_decision(
                &current,
                to,
                &TransitionDecision::contended(),
                receipt_id,
                event_at,
            ))
            .await?;
        Ok(None)
    }

    async fn reload(&self, message: &InviteMessage) -> EngineResult<Option<InviteMessage>> {
        let Some(provider_id) = message.provider_message_id.as_deref() else {
            return Ok(None);
        };
        Ok(self.messages.find_by_provider_message_id(provider_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use vows_core::lifecycle::{
        REASON_CONTENDED, REASON_DUPLICATE, REASON_FAILED_TERMINAL, REASON_OUT_OF_ORDER,
    };

    use super::*;
    use crate::test_support::{seed_sent_message, CasFault, Harness};

    #[tokio::test]
    async fn forward_transition_updates_status_and_timestamp() {
        let h = Harness::new();
        let message = seed_sent_message(&h, "wamid.1").await;
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();

        let result = h
            .engine
            .lifecycle
            .apply(message, LifecycleStatus::Delivered, Some(at), Some("r1".into()))
            .await
            .unwrap()
            .unwrap();
        assert!(result.applied());
        assert_eq!(result.transition.webhook_receipt_id.as_deref(), Some("r1"));

        let stored = &h.store.messages().await[0];
        assert_eq!(stored.lifecycle_status, LifecycleStatus::Delivered);
        assert_eq!(stored.delivered_at, Some(at));
        assert_eq!(stored.last_status_at, at);
    }

    #[tokio::test]
    async fn regressions_and_repeats_are_recorded_but_not_applied() {
        let h = Harness::new();
        let message = seed_sent_message(&h, "wamid.1").await;
        let lifecycle = &h.engine.lifecycle;

        lifecycle.apply(message, LifecycleStatus::Read, None, None).await.unwrap();
        let stored = h.store.messages().await.remove(0);

        let repeat = lifecycle
            .apply(stored.clone(), LifecycleStatus::Read, None, None)
            .await
            .unwrap()
            .unwrap();
        assert!(!repeat.applied());
        assert_eq!(repeat.decision.reason, REASON_DUPLICATE);

        let regress = lifecycle
            .apply(stored, LifecycleStatus::Delivered, None, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(regress.decision.reason, REASON_OUT_OF_ORDER);

        assert_eq!(h.store.messages().await[0].lifecycle_status, LifecycleStatus::Read);
        let transitions = h.store.transitions().await;
        assert_eq!(transitions.len(), 3);
        assert_eq!(transitions.iter().filter(|t| t.is_duplicate).count(), 2);
    }

    #[tokio::test]
    async fn failed_is_absorbing() {
        let h = Harness::new();
        let message = seed_sent_message(&h, "wamid.1").await;
        let lifecycle = &h.engine.lifecycle;

        lifecycle.apply(message, LifecycleStatus::Failed, None, None).await.unwrap();
        let stored = h.store.messages().await.remove(0);
        assert!(stored.failed_at.is_some());

        let result = lifecycle
            .apply(stored, LifecycleStatus::Delivered, None, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.decision.reason, REASON_FAILED_TERMINAL);
        assert_eq!(h.store.messages().await[0].lifecycle_status, LifecycleStatus::Failed);
    }

    #[tokio::test]
    async fn stale_snapshot_is_reevaluated_against_stored_status() {
        let h = Harness::new();
        let stale = seed_sent_message(&h, "wamid.1").await;
        h.engine
            .lifecycle
            .apply(stale.clone(), LifecycleStatus::Read, None, None)
            .await
            .unwrap();

        // The snapshot still says `sent`; the stored row is already `read`.
        let result = h
            .engine
            .lifecycle
            .apply(stale, LifecycleStatus::Delivered, None, None)
            .await
            .unwrap()
            .unwrap();
        assert!(!result.applied());
        assert_eq!(result.from, LifecycleStatus::Read);
        assert_eq!(h.store.messages().await[0].lifecycle_status, LifecycleStatus::Read);
    }

    #[tokio::test]
    async fn exhausted_retries_still_record_a_transition() {
        let h = Harness::with_message_fault(CasFault::AlwaysLose);
        let message = seed_sent_message(&h, "wamid.1").await;

        let result = h
            .engine
            .lifecycle
            .apply(message, LifecycleStatus::Delivered, None, Some("r1".into()))
            .await
            .unwrap();
        assert!(result.is_none());

        let transitions = h.store.transitions().await;
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].to_status, LifecycleStatus::Delivered);
        assert_eq!(transitions[0].reason_note.as_deref(), Some(REASON_CONTENDED));
        assert!(!transitions[0].is_duplicate);
        assert_eq!(transitions[0].webhook_receipt_id.as_deref(), Some("r1"));
        assert_eq!(h.store.messages().await[0].lifecycle_status, LifecycleStatus::Sent);
    }
}
