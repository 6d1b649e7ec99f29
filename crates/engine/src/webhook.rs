//! Authenticated ingestion of provider webhooks.
//!
//! Every request leaves at least one receipt: rejected requests get a
//! unique one, and every recognized event gets one keyed on its dedupe key
//! so a redelivered event is applied exactly once. A receipt is completed
//! only after its event was applied; a redelivery that finds it still
//! unprocessed applies the event again.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use vows_core::status::{AuthResult, ReceiptStatus};
use vows_core::types::{new_id, EntityId};
use vows_core::webhook::{
    decode_events, dedupe_key, inbound_dedupe_key, rejected_dedupe_key, verify_signature,
    InboundTextEvent, StatusEvent, WebhookEvent,
};
use vows_db::models::receipt::{CreateWebhookReceipt, ReceiptInsert};
use vows_db::stores::{MessageStore, ReceiptStore, SessionStore};

use crate::error::EngineResult;
use crate::lifecycle::LifecycleStateMachine;
use crate::rsvp::{ConfirmationFlow, RsvpInput};

pub const DETAIL_INVALID_SIGNATURE: &str = "Webhook signature verification failed.";
pub const DETAIL_INVALID_PAYLOAD: &str = "Webhook body was not valid JSON.";
pub const DETAIL_UNKNOWN_MESSAGE: &str = "No invite message found for provider message id.";
pub const DETAIL_UNMATCHED_REPLY: &str = "Inbound reply does not match a known invite or RSVP prompt.";
pub const DETAIL_TRANSITION_ABANDONED: &str = "Lifecycle transition could not be applied.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub authenticated: bool,
    pub processed_events: usize,
    pub ignored_events: usize,
    pub rejected_events: usize,
    pub replies_sent: usize,
}

enum EventOutcome {
    Processed,
    Ignored,
    Rejected,
}

pub struct WebhookIngestion {
    app_secret: String,
    receipts: Arc<dyn ReceiptStore>,
    messages: Arc<dyn MessageStore>,
    sessions: Arc<dyn SessionStore>,
    lifecycle: LifecycleStateMachine,
    confirmations: Arc<ConfirmationFlow>,
}

impl WebhookIngestion {
    pub fn new(
        app_secret: String,
        receipts: Arc<dyn ReceiptStore>,
        messages: Arc<dyn MessageStore>,
        sessions: Arc<dyn SessionStore>,
        lifecycle: LifecycleStateMachine,
        confirmations: Arc<ConfirmationFlow>,
    ) -> Self {
        Self {
            app_secret,
            receipts,
            messages,
            sessions,
            lifecycle,
            confirmations,
        }
    }

    /// Verify, decode and apply one webhook request body.
    pub async fn ingest(&self, body: &[u8], signature_header: Option<&str>) -> EngineResult<IngestSummary> {
        let mut summary = IngestSummary::default();

        if !verify_signature(&self.app_secret, body, signature_header) {
            tracing::warn!(bytes = body.len(), "Webhook signature rejected");
            self.reject(
                "invalid-signature",
                AuthResult::InvalidSignature,
                DETAIL_INVALID_SIGNATURE,
                body,
                signature_header,
            )
            .await?;
            summary.rejected_events = 1;
            return Ok(summary);
        }
        summary.authenticated = true;

        let events = match decode_events(body) {
            Ok(events) => events,
            Err(err) => {
                tracing::warn!(error = %err, "Webhook body is not JSON");
                self.reject(
                    "invalid-payload",
                    AuthResult::InvalidPayload,
                    DETAIL_INVALID_PAYLOAD,
                    body,
                    signature_header,
                )
                .await?;
                summary.rejected_events = 1;
                return Ok(summary);
            }
        };

        for event in events {
            let outcome = match event {
                WebhookEvent::Status(status) => self.ingest_status(&status, signature_header).await?,
                WebhookEvent::InboundText(inbound) => {
                    let (outcome, replied) = self.ingest_inbound(&inbound, signature_header).await?;
                    if replied {
                        summary.replies_sent += 1;
                    }
                    outcome
                }
                WebhookEvent::Unrecognized { reason } => {
                    tracing::debug!(reason = %reason, "Skipping unrecognized webhook item");
                    EventOutcome::Ignored
                }
            };
            match outcome {
                EventOutcome::Processed => summary.processed_events += 1,
                EventOutcome::Ignored => summary.ignored_events += 1,
                EventOutcome::Rejected => summary.rejected_events += 1,
            }
        }

        tracing::info!(
            processed = summary.processed_events,
            ignored = summary.ignored_events,
            rejected = summary.rejected_events,
            replies = summary.replies_sent,
            "Webhook ingested"
        );
        Ok(summary)
    }

    async fn reject(
        &self,
        prefix: &str,
        auth_result: AuthResult,
        detail: &str,
        body: &[u8],
        signature_header: Option<&str>,
    ) -> EngineResult<()> {
        let now = Utc::now();
        self.receipts
            .insert_receipt(&CreateWebhookReceipt {
                wedding_id: None,
                invite_message_id: None,
                provider_message_id: None,
                event_status: None,
                event_at: None,
                auth_result,
                receipt_status: ReceiptStatus::Rejected,
                dedupe_key: rejected_dedupe_key(prefix, now, &new_id()),
                payload: json!({ "rawBody": String::from_utf8_lossy(body) }),
                signature_header: signature_header.map(str::to_string),
                error_detail: Some(detail.to_string()),
                processed_at: Some(now),
            })
            .await?;
        Ok(())
    }

    async fn ingest_status(
        &self,
        event: &StatusEvent,
        signature_header: Option<&str>,
    ) -> EngineResult<EventOutcome> {
        let message = self
            .messages
            .find_by_provider_message_id(&event.provider_message_id)
            .await?;

        let receipt = CreateWebhookReceipt {
            wedding_id: message.as_ref().map(|m| m.wedding_id.clone()),
            invite_message_id: message.as_ref().map(|m| m.id.clone()),
            provider_message_id: Some(event.provider_message_id.clone()),
            event_status: Some(event.status),
            event_at: event.event_at,
            auth_result: AuthResult::Verified,
            receipt_status: if message.is_some() {
                ReceiptStatus::Accepted
            } else {
                ReceiptStatus::Ignored
            },
            dedupe_key: dedupe_key(event),
            payload: json!({
                "type": "status",
                "id": event.provider_message_id,
                "status": event.status,
                "eventAt": event.event_at,
            }),
            signature_header: signature_header.map(str::to_string),
            error_detail: message.is_none().then(|| DETAIL_UNKNOWN_MESSAGE.to_string()),
            processed_at: message.is_none().then(Utc::now),
        };

        let receipt = match self.receipts.insert_receipt(&receipt).await? {
            ReceiptInsert::Inserted(receipt) => receipt,
            ReceiptInsert::Pending(receipt) => {
                tracing::info!(receipt_id = %receipt.id, dedupe_key = %receipt.dedupe_key, "Resuming unfinished status receipt");
                receipt
            }
            ReceiptInsert::Duplicate => {
                tracing::debug!(provider_message_id = %event.provider_message_id, status = %event.status, "Duplicate status event");
                return Ok(EventOutcome::Ignored);
            }
        };
        let Some(message) = message else {
            return Ok(EventOutcome::Ignored);
        };

        let result = self
            .lifecycle
            .apply(message, event.status, event.event_at, Some(receipt.id.clone()))
            .await?;
        let (status, detail, outcome) = match &result {
            Some(r) if r.applied() => (ReceiptStatus::Accepted, None, EventOutcome::Processed),
            Some(r) => (ReceiptStatus::Ignored, Some(r.decision.reason), EventOutcome::Ignored),
            None => (
                ReceiptStatus::Rejected,
                Some(DETAIL_TRANSITION_ABANDONED),
                EventOutcome::Rejected,
            ),
        };
        self.receipts.complete_receipt(&receipt.id, status, detail).await?;
        Ok(outcome)
    }

    /// Returns the outcome and whether a reply went out.
    async fn ingest_inbound(
        &self,
        event: &InboundTextEvent,
        signature_header: Option<&str>,
    ) -> EngineResult<(EventOutcome, bool)> {
        let Some(context_id) = event.context_message_id.as_deref() else {
            tracing::debug!(from = %event.from_phone, "Inbound text without reply context");
            return Ok((EventOutcome::Ignored, false));
        };

        let correlation = self.correlate(context_id).await?;
        let receipt = CreateWebhookReceipt {
            wedding_id: correlation.as_ref().map(|c| c.wedding_id.clone()),
            invite_message_id: correlation.as_ref().and_then(|c| c.invite_message_id.clone()),
            provider_message_id: Some(context_id.to_string()),
            event_status: None,
            event_at: None,
            auth_result: AuthResult::Verified,
            receipt_status: if correlation.is_some() {
                ReceiptStatus::Accepted
            } else {
                ReceiptStatus::Ignored
            },
            dedupe_key: inbound_dedupe_key(event),
            payload: json!({
                "type": "text",
                "id": event.provider_message_id,
                "from": event.from_phone,
                "contextId": context_id,
                "text": event.text,
            }),
            signature_header: signature_header.map(str::to_string),
            error_detail: correlation.is_none().then(|| DETAIL_UNMATCHED_REPLY.to_string()),
            processed_at: correlation.is_none().then(Utc::now),
        };

        let receipt = match self.receipts.insert_receipt(&receipt).await? {
            ReceiptInsert::Inserted(receipt) => receipt,
            ReceiptInsert::Pending(receipt) => {
                tracing::info!(receipt_id = %receipt.id, dedupe_key = %receipt.dedupe_key, "Resuming unfinished reply receipt");
                receipt
            }
            ReceiptInsert::Duplicate => return Ok((EventOutcome::Ignored, false)),
        };
        let Some(correlation) = correlation else {
            return Ok((EventOutcome::Ignored, false));
        };

        let reply = self
            .confirmations
            .respond(&RsvpInput {
                wedding_id: correlation.wedding_id,
                event_id: correlation.event_id,
                phone_e164: event.from_phone.clone(),
                text: event.text.clone(),
                provider_message_id: Some(event.provider_message_id.clone()),
            })
            .await?;
        self.receipts
            .complete_receipt(&receipt.id, ReceiptStatus::Accepted, None)
            .await?;
        Ok((EventOutcome::Processed, reply.outbound_message_id.is_some()))
    }

    /// Find the wedding and event a reply belongs to, first through the
    /// invite it quotes, then through the RSVP prompt it quotes.
    async fn correlate(&self, context_id: &str) -> EngineResult<Option<Correlation>> {
        if let Some(message) = self.messages.find_by_provider_message_id(context_id).await? {
            return Ok(Some(Correlation {
                wedding_id: message.wedding_id,
                event_id: message.event_id,
                invite_message_id: Some(message.id),
            }));
        }
        Ok(self
            .sessions
            .find_by_outbound_message_id(context_id)
            .await?
            .map(|session| Correlation {
                wedding_id: session.wedding_id,
                event_id: session.event_id,
                invite_message_id: None,
            }))
    }
}

struct Correlation {
    wedding_id: EntityId,
    event_id: EntityId,
    invite_message_id: Option<EntityId>,
}
