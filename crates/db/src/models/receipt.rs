//! Webhook receipt models.

use serde::Serialize;
use sqlx::FromRow;
use vows_core::status::{AuthResult, LifecycleStatus, ReceiptStatus};
use vows_core::types::{EntityId, Timestamp};

/// One processed webhook event (or one rejected request).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WebhookReceipt {
    pub id: EntityId,
    pub wedding_id: Option<EntityId>,
    pub invite_message_id: Option<EntityId>,
    pub provider_message_id: Option<String>,
    pub event_status: Option<LifecycleStatus>,
    pub event_at: Option<Timestamp>,
    pub auth_result: AuthResult,
    pub receipt_status: ReceiptStatus,
    pub dedupe_key: String,
    pub payload: serde_json::Value,
    pub signature_header: Option<String>,
    pub error_detail: Option<String>,
    pub processed_at: Option<Timestamp>,
    pub received_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateWebhookReceipt {
    pub wedding_id: Option<EntityId>,
    pub invite_message_id: Option<EntityId>,
    pub provider_message_id: Option<String>,
    pub event_status: Option<LifecycleStatus>,
    pub event_at: Option<Timestamp>,
    pub auth_result: AuthResult,
    pub receipt_status: ReceiptStatus,
    pub dedupe_key: String,
    pub payload: serde_json::Value,
    pub signature_header: Option<String>,
    pub error_detail: Option<String>,
    /// Set for receipts that are final on insert.
    pub processed_at: Option<Timestamp>,
}

/// Result of an insert guarded by the dedupe-key unique constraint.
#[derive(Debug, Clone)]
pub enum ReceiptInsert {
    Inserted(WebhookReceipt),
    /// The key exists but its receipt was never completed, so the earlier
    /// attempt stopped part-way and the event still needs applying.
    Pending(WebhookReceipt),
    /// The key exists and its receipt is final.
    Duplicate,
}
