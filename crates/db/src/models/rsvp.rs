//! RSVP session and person-response models.

use serde::Serialize;
use sqlx::FromRow;
use vows_core::rsvp::{FlowState, FlowStep};
use vows_core::status::{FlowStatus, RsvpChoice};
use vows_core::types::{EntityId, Timestamp};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RsvpFlowSession {
    pub id: EntityId,
    pub wedding_id: EntityId,
    pub event_id: EntityId,
    pub guest_unit_id: EntityId,
    pub phone_e164: String,
    pub flow_status: FlowStatus,
    pub step_index: i16,
    pub final_response: Option<RsvpChoice>,
    pub confirmation_summary: Option<serde_json::Value>,
    /// Last inbound provider message handled by this session.
    pub last_provider_message_id: Option<String>,
    /// Last prompt sent to the guest; replies quoting it correlate here.
    pub last_outbound_message_id: Option<String>,
    pub last_inbound_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl RsvpFlowSession {
    pub fn flow_state(&self) -> FlowState {
        FlowState {
            step: FlowStep::from_index(self.step_index),
            is_completed: self.flow_status == FlowStatus::Completed,
            final_response: self.final_response,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateRsvpFlowSession {
    pub wedding_id: EntityId,
    pub event_id: EntityId,
    pub guest_unit_id: EntityId,
    pub phone_e164: String,
    pub last_provider_message_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateRsvpFlowSession {
    pub step_index: i16,
    pub flow_status: FlowStatus,
    pub final_response: Option<RsvpChoice>,
    pub confirmation_summary: Option<serde_json::Value>,
    pub last_provider_message_id: Option<String>,
}

/// Latest answer for one person at one event.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RsvpPersonResponse {
    pub id: EntityId,
    pub flow_session_id: EntityId,
    pub wedding_id: EntityId,
    pub event_id: EntityId,
    pub guest_unit_id: EntityId,
    pub person_id: EntityId,
    pub response: RsvpChoice,
    pub response_revision: i32,
    pub responded_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct UpsertPersonResponse {
    pub flow_session_id: EntityId,
    pub wedding_id: EntityId,
    pub event_id: EntityId,
    pub guest_unit_id: EntityId,
    pub person_id: EntityId,
    pub response: RsvpChoice,
}
