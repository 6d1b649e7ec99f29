//! Invite message and lifecycle transition models.

use serde::Serialize;
use sqlx::FromRow;
use vows_core::lifecycle::TransitionDecision;
use vows_core::status::{LifecycleStatus, RejectionReason, TransitionSource};
use vows_core::types::{EntityId, Timestamp};

// ---------------------------------------------------------------------------
// Invite message
// ---------------------------------------------------------------------------

/// One recipient of one run.
///
/// Either blocked (`is_blocked`, `failed`, no provider id) or dispatched.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InviteMessage {
    pub id: EntityId,
    pub invite_run_id: EntityId,
    pub wedding_id: EntityId,
    pub event_id: EntityId,
    pub recipient_guest_unit_id: Option<EntityId>,
    pub recipient_phone_e164: String,
    pub lifecycle_status: LifecycleStatus,
    pub is_blocked: bool,
    pub rejection_reason: Option<RejectionReason>,
    pub provider_message_id: Option<String>,
    pub provider_error_code: Option<String>,
    pub provider_error_message: Option<String>,
    pub dispatched_at: Option<Timestamp>,
    pub delivered_at: Option<Timestamp>,
    pub read_at: Option<Timestamp>,
    pub failed_at: Option<Timestamp>,
    pub last_status_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// How a recipient left the dispatch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageDisposition {
    Blocked {
        reason: RejectionReason,
        detail: String,
    },
    Sent {
        provider_message_id: String,
    },
    ProviderFailed {
        error_code: String,
        error_message: String,
    },
}

#[derive(Debug, Clone)]
pub struct CreateInviteMessage {
    pub invite_run_id: EntityId,
    pub wedding_id: EntityId,
    pub event_id: EntityId,
    pub recipient_guest_unit_id: Option<EntityId>,
    pub recipient_phone_e164: String,
    pub disposition: MessageDisposition,
    pub at: Timestamp,
}

impl CreateInviteMessage {
    pub fn lifecycle_status(&self) -> LifecycleStatus {
        match self.disposition {
            MessageDisposition::Sent { .. } => LifecycleStatus::Sent,
            _ => LifecycleStatus::Failed,
        }
    }

    /// Expand the disposition into the stored message row.
    pub fn into_message(self, id: EntityId) -> InviteMessage {
        let status = self.lifecycle_status();
        let mut message = InviteMessage {
            id,
            invite_run_id: self.invite_run_id,
            wedding_id: self.wedding_id,
            event_id: self.event_id,
            recipient_guest_unit_id: self.recipient_guest_unit_id,
            recipient_phone_e164: self.recipient_phone_e164,
            lifecycle_status: status,
            is_blocked: false,
            rejection_reason: None,
            provider_message_id: None,
            provider_error_code: None,
            provider_error_message: None,
            dispatched_at: None,
            delivered_at: None,
            read_at: None,
            failed_at: None,
            last_status_at: self.at,
            created_at: self.at,
            updated_at: self.at,
        };
        match self.disposition {
            MessageDisposition::Blocked { reason, detail } => {
                message.is_blocked = true;
                message.rejection_reason = Some(reason);
                message.provider_error_message = Some(detail);
                message.failed_at = Some(self.at);
            }
            MessageDisposition::Sent {
                provider_message_id,
            } => {
                message.provider_message_id = Some(provider_message_id);
                message.dispatched_at = Some(self.at);
            }
            MessageDisposition::ProviderFailed {
                error_code,
                error_message,
            } => {
                message.provider_error_code = Some(error_code);
                message.provider_error_message = Some(error_message);
                message.failed_at = Some(self.at);
            }
        }
        message
    }
}

// ---------------------------------------------------------------------------
// Lifecycle transition
// ---------------------------------------------------------------------------

/// Append-only record of one transition evaluation, applied or not.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LifecycleTransition {
    pub id: EntityId,
    pub invite_message_id: EntityId,
    pub wedding_id: EntityId,
    pub from_status: LifecycleStatus,
    pub to_status: LifecycleStatus,
    pub source: TransitionSource,
    pub webhook_receipt_id: Option<EntityId>,
    pub provider_event_at: Option<Timestamp>,
    pub is_duplicate: bool,
    pub reason_note: Option<String>,
    pub applied_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateLifecycleTransition {
    pub invite_message_id: EntityId,
    pub wedding_id: EntityId,
    pub from_status: LifecycleStatus,
    pub to_status: LifecycleStatus,
    pub source: TransitionSource,
    pub webhook_receipt_id: Option<EntityId>,
    pub provider_event_at: Option<Timestamp>,
    pub is_duplicate: bool,
    pub reason_note: Option<String>,
}

impl CreateLifecycleTransition {
    pub fn from_decision(
        message: &InviteMessage,
        to: LifecycleStatus,
        decision: &TransitionDecision,
        webhook_receipt_id: Option<EntityId>,
        provider_event_at: Option<Timestamp>,
    ) -> Self {
        Self {
            invite_message_id: message.id.clone(),
            wedding_id: message.wedding_id.clone(),
            from_status: message.lifecycle_status,
            to_status: to,
            source: TransitionSource::Webhook,
            webhook_receipt_id,
            provider_event_at,
            is_duplicate: decision.is_duplicate,
            reason_note: Some(decision.reason.to_string()),
        }
    }
}
