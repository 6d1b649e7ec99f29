//! Conversational RSVP over inbound messaging replies.
//!
//! One session per (wedding, event, phone) is active at a time. Inputs for
//! the same key are serialized through [`KeyedLocks`], so two replies that
//! arrive together never both create a session or both advance it.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use vows_core::error::CoreError;
use vows_core::guest::GuestUnitRecord;
use vows_core::rsvp::{
    advance, completion_message, is_confirmation_token, parse_attendance_edits, progress_message,
    reply_body, FlowLabel, FlowStep, NextAction, ResponseSummary, NOT_INVITEE_MESSAGE,
};
use vows_core::status::FlowStatus;
use vows_core::types::EntityId;
use vows_db::models::rsvp::{
    CreateRsvpFlowSession, RsvpFlowSession, UpdateRsvpFlowSession, UpsertPersonResponse,
};
use vows_db::stores::{GuestDirectory, SessionStore, StoreError};
use vows_provider::{MessagingProvider, SendOutcome};

use crate::error::EngineResult;
use crate::locks::KeyedLocks;

/// One inbound message addressed to the RSVP flow.
#[derive(Debug, Clone)]
pub struct RsvpInput {
    pub wedding_id: EntityId,
    pub event_id: EntityId,
    pub phone_e164: String,
    pub text: String,
    pub provider_message_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplyStatus {
    NotInvitee,
    InvalidInput,
    Progressed,
    Completed,
    /// The inbound message was already applied; nothing changed or was sent.
    Replayed,
}

#[derive(Debug, Clone, Serialize)]
pub struct RsvpReply {
    pub status: ReplyStatus,
    pub step: FlowStep,
    pub label: FlowLabel,
    pub message: String,
    pub summary: Option<ResponseSummary>,
    pub is_duplicate: bool,
    pub session_id: Option<EntityId>,
    /// Provider id of the reply once it was sent.
    pub outbound_message_id: Option<String>,
}

impl RsvpReply {
    pub fn body(&self) -> String {
        reply_body(&self.message, self.label)
    }

    fn replayed(session: &RsvpFlowSession, had_completed: bool) -> Self {
        let step = session.flow_state().step;
        Self {
            status: ReplyStatus::Replayed,
            step,
            label: if had_completed {
                FlowLabel::UpdateRsvp
            } else {
                FlowLabel::CompleteRsvp
            },
            message: progress_message(step).to_string(),
            summary: None,
            is_duplicate: true,
            session_id: Some(session.id.clone()),
            outbound_message_id: None,
        }
    }

    fn not_invitee() -> Self {
        Self {
            status: ReplyStatus::NotInvitee,
            step: FlowStep::InitialChoice,
            label: FlowLabel::CompleteRsvp,
            message: NOT_INVITEE_MESSAGE.to_string(),
            summary: None,
            is_duplicate: false,
            session_id: None,
            outbound_message_id: None,
        }
    }
}

pub struct ConfirmationFlow {
    guests: Arc<dyn GuestDirectory>,
    sessions: Arc<dyn SessionStore>,
    provider: Arc<dyn MessagingProvider>,
    locks: KeyedLocks,
    session_ttl: Duration,
}

impl ConfirmationFlow {
    pub fn new(
        guests: Arc<dyn GuestDirectory>,
        sessions: Arc<dyn SessionStore>,
        provider: Arc<dyn MessagingProvider>,
        session_ttl_hours: i64,
    ) -> Self {
        Self {
            guests,
            sessions,
            provider,
            locks: KeyedLocks::new(),
            session_ttl: Duration::hours(session_ttl_hours.max(1)),
        }
    }

    /// Handle `input` and send the reply back to the guest.
    ///
    /// A failed reply send is logged; the state change it describes stays.
    pub async fn respond(&self, input: &RsvpInput) -> EngineResult<RsvpReply> {
        let mut reply = self.handle(input).await?;
        if reply.status == ReplyStatus::Replayed {
            tracing::debug!(phone = %input.phone_e164, "RSVP input already applied, reply not resent");
            return Ok(reply);
        }

        match self.provider.send_text(&input.phone_e164, &reply.body()).await {
            SendOutcome::Sent {
                provider_message_id,
            } => {
                if let Some(session_id) = &reply.session_id {
                    self.sessions
                        .record_outbound_message(session_id, &provider_message_id)
                        .await?;
                }
                reply.outbound_message_id = Some(provider_message_id);
            }
            SendOutcome::Failed {
                error_code,
                error_message,
            } => {
                tracing::warn!(
                    phone = %input.phone_e164,
                    error_code = %error_code,
                    error_message = %error_message,
                    "RSVP reply could not be sent"
                );
            }
        }
        Ok(reply)
    }

    /// Advance the conversation without sending anything.
    pub async fn handle(&self, input: &RsvpInput) -> EngineResult<RsvpReply> {
        let key = format!("{}:{}:{}", input.wedding_id, input.event_id, input.phone_e164);
        let _guard = self.locks.acquire(&key).await;

        let Some(unit) = self
            .guests
            .find_unit_by_phone(&input.wedding_id, &input.phone_e164)
            .await?
        else {
            tracing::info!(wedding_id = %input.wedding_id, phone = %input.phone_e164, "RSVP from unknown phone");
            return Ok(RsvpReply::not_invitee());
        };

        let latest = self
            .sessions
            .find_latest_session(&input.wedding_id, &input.event_id, &input.phone_e164)
            .await?;
        let had_completed = self
            .sessions
            .has_completed_session(&input.wedding_id, &input.event_id, &input.phone_e164)
            .await?;

        if let Some(seen) = latest.as_ref().filter(|s| {
            input.provider_message_id.is_some()
                && s.last_provider_message_id == input.provider_message_id
        }) {
            return Ok(RsvpReply::replayed(seen, had_completed));
        }

        let edits = parse_attendance_edits(&input.text);

        if let Some(done) = latest.as_ref().filter(|s| s.flow_status == FlowStatus::Completed) {
            if edits.is_empty() && is_confirmation_token(&input.text) {
                return self.replay_completion(done, &unit).await;
            }
        }

        let session = self.active_session(input, &unit, latest).await?;
        let state = session.flow_state();

        let mut applied = 0;
        if state.step == FlowStep::AttendanceDetails {
            let allowed = unit.active_person_ids();
            for edit in edits.iter().filter(|e| allowed.contains(&e.person_id)) {
                self.sessions
                    .upsert_person_response(&UpsertPersonResponse {
                        flow_session_id: session.id.clone(),
                        wedding_id: input.wedding_id.clone(),
                        event_id: input.event_id.clone(),
                        guest_unit_id: unit.id.clone(),
                        person_id: edit.person_id.clone(),
                        response: edit.response,
                    })
                    .await?;
                applied += 1;
            }
        }

        let outcome = advance(&state, &input.text, applied);
        let label = if had_completed {
            FlowLabel::UpdateRsvp
        } else {
            FlowLabel::CompleteRsvp
        };

        if outcome.next_action == NextAction::InvalidInput {
            return Ok(RsvpReply {
                status: ReplyStatus::InvalidInput,
                step: outcome.step,
                label,
                message: outcome
                    .error_message
                    .unwrap_or_else(|| progress_message(outcome.step))
                    .to_string(),
                summary: None,
                is_duplicate: false,
                session_id: Some(session.id),
                outbound_message_id: None,
            });
        }

        let final_response = outcome.final_response.or(session.final_response);

        if outcome.is_completed {
            let summary = self
                .sessions
                .count_responses(&input.wedding_id, &input.event_id, &unit.id)
                .await?;
            let summary_json = serde_json::to_value(summary)
                .map_err(|e| CoreError::Internal(format!("RSVP summary encoding failed: {e}")))?;
            let session = self
                .sessions
                .update_session(
                    &session.id,
                    &UpdateRsvpFlowSession {
                        step_index: outcome.step.index(),
                        flow_status: FlowStatus::Completed,
                        final_response,
                        confirmation_summary: Some(summary_json),
                        last_provider_message_id: input.provider_message_id.clone(),
                    },
                )
                .await?;

            tracing::info!(
                session_id = %session.id,
                guest_unit_id = %unit.id,
                accepted = summary.accepted,
                declined = summary.declined,
                "RSVP completed"
            );
            return Ok(RsvpReply {
                status: ReplyStatus::Completed,
                step: outcome.step,
                label: FlowLabel::UpdateRsvp,
                message: completion_message(&summary),
                summary: Some(summary),
                is_duplicate: false,
                session_id: Some(session.id),
                outbound_message_id: None,
            });
        }

        let session = self
            .sessions
            .update_session(
                &session.id,
                &UpdateRsvpFlowSession {
                    step_index: outcome.step.index(),
                    flow_status: FlowStatus::Active,
                    final_response,
                    confirmation_summary: None,
                    last_provider_message_id: input.provider_message_id.clone(),
                },
            )
            .await?;

        Ok(RsvpReply {
            status: ReplyStatus::Progressed,
            step: outcome.step,
            label,
            message: progress_message(outcome.step).to_string(),
            summary: None,
            is_duplicate: false,
            session_id: Some(session.id),
            outbound_message_id: None,
        })
    }

    /// Repeated confirmation of a finished session: report the stored result.
    async fn replay_completion(
        &self,
        session: &RsvpFlowSession,
        unit: &GuestUnitRecord,
    ) -> EngineResult<RsvpReply> {
        let outcome = advance(&session.flow_state(), "", 0);
        let stored = session
            .confirmation_summary
            .clone()
            .and_then(|value| serde_json::from_value::<ResponseSummary>(value).ok());
        let summary = match stored {
            Some(summary) => summary,
            None => {
                self.sessions
                    .count_responses(&session.wedding_id, &session.event_id, &unit.id)
                    .await?
            }
        };

        Ok(RsvpReply {
            status: ReplyStatus::Completed,
            step: outcome.step,
            label: FlowLabel::UpdateRsvp,
            message: completion_message(&summary),
            summary: Some(summary),
            is_duplicate: outcome.is_duplicate,
            session_id: Some(session.id.clone()),
            outbound_message_id: None,
        })
    }

    /// The live session for this input, expiring an idle one and opening a
    /// fresh one when needed.
    async fn active_session(
        &self,
        input: &RsvpInput,
        unit: &GuestUnitRecord,
        latest: Option<RsvpFlowSession>,
    ) -> EngineResult<RsvpFlowSession> {
        if let Some(session) = latest.filter(|s| s.flow_status == FlowStatus::Active) {
            if Utc::now() - session.last_inbound_at <= self.session_ttl {
                return Ok(session);
            }
            tracing::info!(session_id = %session.id, "RSVP session expired");
            self.sessions.mark_expired(&session.id).await?;
        }

        let create = CreateRsvpFlowSession {
            wedding_id: input.wedding_id.clone(),
            event_id: input.event_id.clone(),
            guest_unit_id: unit.id.clone(),
            phone_e164: input.phone_e164.clone(),
            last_provider_message_id: input.provider_message_id.clone(),
        };
        match self.sessions.create_session(&create).await {
            Ok(session) => Ok(session),
            Err(StoreError::Conflict(detail)) => {
                // Another process opened one between our read and insert.
                self.sessions
                    .find_latest_session(&input.wedding_id, &input.event_id, &input.phone_e164)
                    .await?
                    .filter(|s| s.flow_status == FlowStatus::Active)
                    .ok_or_else(|| CoreError::Conflict(detail).into())
            }
            Err(err) => Err(err.into()),
        }
    }
}
