//! Audit log rows written by this service.

use serde::Serialize;
use sqlx::FromRow;
use vows_core::types::{EntityId, Timestamp};

/// Immutable once written.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLogRow {
    pub id: EntityId,
    pub wedding_id: EntityId,
    pub actor_id: Option<EntityId>,
    pub action_type: String,
    pub target_type: String,
    pub target_id: Option<EntityId>,
    pub before_summary: Option<serde_json::Value>,
    pub after_summary: Option<serde_json::Value>,
    pub reason_note: Option<String>,
    pub created_at: Timestamp,
}
