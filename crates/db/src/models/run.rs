//! Invite send run models and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use vows_core::dispatch::RunCounters;
use vows_core::status::RunStatus;
use vows_core::types::{EntityId, Timestamp};

/// One dispatch call. Counters are a point-in-time summary written when the
/// run finishes.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InviteSendRun {
    pub id: EntityId,
    pub wedding_id: EntityId,
    pub event_id: EntityId,
    pub template_name: String,
    pub template_language: String,
    pub status: RunStatus,
    pub audience_snapshot: serde_json::Value,
    pub total_candidates: i64,
    pub eligible_count: i64,
    pub blocked_count: i64,
    pub sent_count: i64,
    pub failed_count: i64,
    pub failure_reason: Option<String>,
    pub created_by: Option<EntityId>,
    pub started_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub failed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for opening a run in the `running` state.
#[derive(Debug, Clone)]
pub struct CreateInviteSendRun {
    pub wedding_id: EntityId,
    pub event_id: EntityId,
    pub template_name: String,
    pub template_language: String,
    /// Filter as requested plus the audience trace.
    pub audience_snapshot: serde_json::Value,
    pub total_candidates: i64,
    pub created_by: Option<EntityId>,
}

/// DTO for closing a run.
#[derive(Debug, Clone)]
pub struct FinalizeInviteSendRun {
    pub status: RunStatus,
    pub counters: RunCounters,
    pub failure_reason: Option<String>,
    pub completed_at: Timestamp,
}

impl FinalizeInviteSendRun {
    pub fn from_counters(counters: RunCounters, completed_at: Timestamp) -> Self {
        Self {
            status: counters.status(),
            failure_reason: counters.failure_reason().map(str::to_string),
            counters,
            completed_at,
        }
    }
}
