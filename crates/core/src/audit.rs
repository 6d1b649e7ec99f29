//! Audit-log vocabulary for actions this engine records.

use serde::{Deserialize, Serialize};

use crate::types::EntityId;

pub const ACTION_INVITE_SEND: &str = "invite.send";

pub const TARGET_INVITE: &str = "invite";

/// One entry handed to the audit-log collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub wedding_id: EntityId,
    pub actor_id: Option<EntityId>,
    pub action_type: String,
    pub target_type: String,
    pub target_id: Option<EntityId>,
    pub before_summary: Option<serde_json::Value>,
    pub after_summary: Option<serde_json::Value>,
    pub reason_note: Option<String>,
}

impl AuditEntry {
    pub fn new(
        wedding_id: impl Into<EntityId>,
        action_type: &str,
        target_type: &str,
        target_id: impl Into<EntityId>,
    ) -> Self {
        Self {
            wedding_id: wedding_id.into(),
            actor_id: None,
            action_type: action_type.to_string(),
            target_type: target_type.to_string(),
            target_id: Some(target_id.into()),
            before_summary: None,
            after_summary: None,
            reason_note: None,
        }
    }

    pub fn by(mut self, actor_id: impl Into<EntityId>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    pub fn with_after(mut self, summary: serde_json::Value) -> Self {
        self.after_summary = Some(summary);
        self
    }
}
