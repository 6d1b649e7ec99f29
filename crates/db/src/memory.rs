//! In-memory implementation of every store port.
//!
//! All state sits behind one async mutex, so each port call is atomic with
//! respect to the others. That gives the same guarantees the PostgreSQL
//! store gets from its unique constraints and conditional updates.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use vows_core::audit::AuditEntry;
use vows_core::guest::GuestUnitRecord;
use vows_core::lifecycle::StatusPatch;
use vows_core::rsvp::ResponseSummary;
use vows_core::status::{FlowStatus, LifecycleStatus, ReceiptStatus, RsvpChoice};
use vows_core::types::{new_id, EntityId, Timestamp};

use crate::models::dnm::DoNotMessage;
use crate::models::message::{
    CreateInviteMessage, CreateLifecycleTransition, InviteMessage, LifecycleTransition,
};
use crate::models::receipt::{CreateWebhookReceipt, ReceiptInsert, WebhookReceipt};
use crate::models::rsvp::{
    CreateRsvpFlowSession, RsvpFlowSession, RsvpPersonResponse, UpdateRsvpFlowSession,
    UpsertPersonResponse,
};
use crate::models::run::{CreateInviteSendRun, FinalizeInviteSendRun, InviteSendRun};
use crate::stores::{
    AuditLog, DoNotMessageStore, GuestDirectory, HealthProbe, MessageStore, ReceiptStore,
    RunStore, SessionStore, StoreError, StoreResult,
};

#[derive(Debug, Default)]
struct MemoryState {
    units: HashMap<EntityId, Vec<GuestUnitRecord>>,
    do_not_message: Vec<DoNotMessage>,
    runs: Vec<InviteSendRun>,
    messages: Vec<InviteMessage>,
    transitions: Vec<LifecycleTransition>,
    receipts: Vec<WebhookReceipt>,
    sessions: Vec<RsvpFlowSession>,
    responses: Vec<RsvpPersonResponse>,
    audit: Vec<AuditEntry>,
}

impl MemoryState {
    fn sorted_units(&self, wedding_id: &str) -> Vec<GuestUnitRecord> {
        let mut units: Vec<GuestUnitRecord> = self
            .units
            .get(wedding_id)
            .map(|units| units.iter().filter(|u| u.is_active).cloned().collect())
            .unwrap_or_default();
        units.sort_by(|a, b| a.display_name.cmp(&b.display_name).then_with(|| a.id.cmp(&b.id)));
        units
    }

    fn session_mut(&mut self, id: &str) -> StoreResult<&mut RsvpFlowSession> {
        self.sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "RsvpFlowSession",
                id: id.to_string(),
            })
    }
}

/// Store for tests and database-less local runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -- seeding --------------------------------------------------------------

    pub async fn seed_unit(&self, wedding_id: &str, unit: GuestUnitRecord) {
        let mut state = self.state.lock().await;
        state.units.entry(wedding_id.to_string()).or_default().push(unit);
    }

    pub async fn seed_do_not_message(&self, wedding_id: &str, phone_e164: &str, reason: Option<&str>) {
        let mut state = self.state.lock().await;
        state.do_not_message.push(DoNotMessage {
            id: new_id(),
            wedding_id: wedding_id.to_string(),
            phone_e164: phone_e164.to_string(),
            reason_note: reason.map(str::to_string),
            is_active: true,
            revoked_at: None,
            created_at: Utc::now(),
        });
    }

    /// Move a session's last inbound activity into the past.
    pub async fn backdate_session(&self, session_id: &str, last_inbound_at: Timestamp) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.session_mut(session_id)?.last_inbound_at = last_inbound_at;
        Ok(())
    }

    // -- inspection -----------------------------------------------------------

    pub async fn runs(&self) -> Vec<InviteSendRun> {
        self.state.lock().await.runs.clone()
    }

    pub async fn messages(&self) -> Vec<InviteMessage> {
        self.state.lock().await.messages.clone()
    }

    pub async fn transitions(&self) -> Vec<LifecycleTransition> {
        self.state.lock().await.transitions.clone()
    }

    pub async fn receipts(&self) -> Vec<WebhookReceipt> {
        self.state.lock().await.receipts.clone()
    }

    pub async fn sessions(&self) -> Vec<RsvpFlowSession> {
        self.state.lock().await.sessions.clone()
    }

    pub async fn responses(&self) -> Vec<RsvpPersonResponse> {
        self.state.lock().await.responses.clone()
    }

    pub async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.state.lock().await.audit.clone()
    }
}

#[async_trait]
impl GuestDirectory for MemoryStore {
    async fn list_active_units(&self, wedding_id: &str) -> StoreResult<Vec<GuestUnitRecord>> {
        Ok(self.state.lock().await.sorted_units(wedding_id))
    }

    async fn find_active_units(
        &self,
        wedding_id: &str,
        ids: &[EntityId],
    ) -> StoreResult<Vec<GuestUnitRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .sorted_units(wedding_id)
            .into_iter()
            .filter(|u| ids.contains(&u.id))
            .collect())
    }

    async fn find_unit_by_phone(
        &self,
        wedding_id: &str,
        phone_e164: &str,
    ) -> StoreResult<Option<GuestUnitRecord>> {
        let units = self.state.lock().await.sorted_units(wedding_id);
        let by_unit = units.iter().find(|u| {
            u.delivery_identity
                .as_ref()
                .is_some_and(|i| i.is_active && i.phone_e164 == phone_e164)
        });
        let by_member = || {
            units.iter().find(|u| {
                u.active_members().any(|m| {
                    m.person.is_active
                        && m.person
                            .identity
                            .as_ref()
                            .is_some_and(|i| i.is_active && i.phone_e164 == phone_e164)
                })
            })
        };
        Ok(by_unit.or_else(by_member).cloned())
    }
}

#[async_trait]
impl DoNotMessageStore for MemoryStore {
    async fn list_active(&self, wedding_id: &str, limit: Option<i64>) -> StoreResult<Vec<DoNotMessage>> {
        let state = self.state.lock().await;
        let limit = limit.map_or(usize::MAX, |l| l.max(0) as usize);
        Ok(state
            .do_not_message
            .iter()
            .rev()
            .filter(|e| e.wedding_id == wedding_id && e.is_active && e.revoked_at.is_none())
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RunStore for MemoryStore {
    async fn create_run(&self, input: &CreateInviteSendRun) -> StoreResult<InviteSendRun> {
        let now = Utc::now();
        let run = InviteSendRun {
            id: new_id(),
            wedding_id: input.wedding_id.clone(),
            event_id: input.event_id.clone(),
            template_name: input.template_name.clone(),
            template_language: input.template_language.clone(),
            status: vows_core::status::RunStatus::Running,
            audience_snapshot: input.audience_snapshot.clone(),
            total_candidates: input.total_candidates,
            eligible_count: 0,
            blocked_count: 0,
            sent_count: 0,
            failed_count: 0,
            failure_reason: None,
            created_by: input.created_by.clone(),
            started_at: now,
            completed_at: None,
            failed_at: None,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().await.runs.push(run.clone());
        Ok(run)
    }

    async fn finalize_run(
        &self,
        run_id: &str,
        input: &FinalizeInviteSendRun,
    ) -> StoreResult<InviteSendRun> {
        let mut state = self.state.lock().await;
        let run = state
            .runs
            .iter_mut()
            .find(|r| r.id == run_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "InviteSendRun",
                id: run_id.to_string(),
            })?;
        let c = &input.counters;
        run.status = input.status;
        run.eligible_count = c.eligible as i64;
        run.blocked_count = c.blocked as i64;
        run.sent_count = c.sent as i64;
        run.failed_count = c.failed as i64;
        run.failure_reason = input.failure_reason.clone();
        run.completed_at = Some(input.completed_at);
        run.failed_at = (input.status == vows_core::status::RunStatus::Failed)
            .then_some(input.completed_at);
        run.updated_at = Utc::now();
        Ok(run.clone())
    }

    async fn find_run(&self, wedding_id: &str, run_id: &str) -> StoreResult<Option<InviteSendRun>> {
        let state = self.state.lock().await;
        Ok(state
            .runs
            .iter()
            .find(|r| r.id == run_id && r.wedding_id == wedding_id)
            .cloned())
    }

    async fn list_runs(
        &self,
        wedding_id: &str,
        event_id: Option<&str>,
        limit: i64,
    ) -> StoreResult<Vec<InviteSendRun>> {
        let state = self.state.lock().await;
        Ok(state
            .runs
            .iter()
            .rev()
            .filter(|r| r.wedding_id == wedding_id)
            .filter(|r| event_id.map_or(true, |e| r.event_id == e))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert_message(&self, input: CreateInviteMessage) -> StoreResult<InviteMessage> {
        let message = input.into_message(new_id());
        let mut state = self.state.lock().await;
        if let Some(pid) = &message.provider_message_id {
            if state
                .messages
                .iter()
                .any(|m| m.provider_message_id.as_ref() == Some(pid))
            {
                return Err(StoreError::Conflict(format!(
                    "provider message id {pid} already recorded"
                )));
            }
        }
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn find_by_provider_message_id(
        &self,
        provider_message_id: &str,
    ) -> StoreResult<Option<InviteMessage>> {
        let state = self.state.lock().await;
        Ok(state
            .messages
            .iter()
            .find(|m| m.provider_message_id.as_deref() == Some(provider_message_id))
            .cloned())
    }

    async fn list_by_run(&self, run_id: &str) -> StoreResult<Vec<InviteMessage>> {
        let state = self.state.lock().await;
        Ok(state
            .messages
            .iter()
            .filter(|m| m.invite_run_id == run_id)
            .cloned()
            .collect())
    }

    async fn compare_and_set_status(
        &self,
        message_id: &str,
        expected: LifecycleStatus,
        patch: &StatusPatch,
    ) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let Some(message) = state.messages.iter_mut().find(|m| m.id == message_id) else {
            return Ok(false);
        };
        if message.lifecycle_status != expected {
            return Ok(false);
        }
        message.lifecycle_status = patch.lifecycle_status;
        message.last_status_at = patch.last_status_at;
        message.delivered_at = patch.delivered_at.or(message.delivered_at);
        message.read_at = patch.read_at.or(message.read_at);
        message.failed_at = patch.failed_at.or(message.failed_at);
        message.updated_at = Utc::now();
        Ok(true)
    }

    async fn record_transition(
        &self,
        input: &CreateLifecycleTransition,
    ) -> StoreResult<LifecycleTransition> {
        let transition = LifecycleTransition {
            id: new_id(),
            invite_message_id: input.invite_message_id.clone(),
            wedding_id: input.wedding_id.clone(),
            from_status: input.from_status,
            to_status: input.to_status,
            source: input.source,
            webhook_receipt_id: input.webhook_receipt_id.clone(),
            provider_event_at: input.provider_event_at,
            is_duplicate: input.is_duplicate,
            reason_note: input.reason_note.clone(),
            applied_at: Utc::now(),
        };
        self.state.lock().await.transitions.push(transition.clone());
        Ok(transition)
    }

    async fn list_transitions(
        &self,
        message_id: &str,
        limit: i64,
    ) -> StoreResult<Vec<LifecycleTransition>> {
        let state = self.state.lock().await;
        Ok(state
            .transitions
            .iter()
            .rev()
            .filter(|t| t.invite_message_id == message_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReceiptStore for MemoryStore {
    async fn insert_receipt(&self, input: &CreateWebhookReceipt) -> StoreResult<ReceiptInsert> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.receipts.iter().find(|r| r.dedupe_key == input.dedupe_key) {
            return Ok(match existing.processed_at {
                None => ReceiptInsert::Pending(existing.clone()),
                Some(_) => ReceiptInsert::Duplicate,
            });
        }
        let receipt = WebhookReceipt {
            id: new_id(),
            wedding_id: input.wedding_id.clone(),
            invite_message_id: input.invite_message_id.clone(),
            provider_message_id: input.provider_message_id.clone(),
            event_status: input.event_status,
            event_at: input.event_at,
            auth_result: input.auth_result,
            receipt_status: input.receipt_status,
            dedupe_key: input.dedupe_key.clone(),
            payload: input.payload.clone(),
            signature_header: input.signature_header.clone(),
            error_detail: input.error_detail.clone(),
            processed_at: input.processed_at,
            received_at: Utc::now(),
        };
        state.receipts.push(receipt.clone());
        Ok(ReceiptInsert::Inserted(receipt))
    }

    async fn complete_receipt(
        &self,
        receipt_id: &str,
        status: ReceiptStatus,
        error_detail: Option<&str>,
    ) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let receipt = state
            .receipts
            .iter_mut()
            .find(|r| r.id == receipt_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "WebhookReceipt",
                id: receipt_id.to_string(),
            })?;
        receipt.receipt_status = status;
        receipt.error_detail = error_detail.map(str::to_string);
        receipt.processed_at = Some(Utc::now());
        Ok(())
    }

    async fn list_by_message(&self, message_id: &str, limit: i64) -> StoreResult<Vec<WebhookReceipt>> {
        let state = self.state.lock().await;
        Ok(state
            .receipts
            .iter()
            .rev()
            .filter(|r| r.invite_message_id.as_deref() == Some(message_id))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find_latest_session(
        &self,
        wedding_id: &str,
        event_id: &str,
        phone_e164: &str,
    ) -> StoreResult<Option<RsvpFlowSession>> {
        let state = self.state.lock().await;
        Ok(state
            .sessions
            .iter()
            .enumerate()
            .filter(|(_, s)| s.wedding_id == wedding_id && s.event_id == event_id && s.phone_e164 == phone_e164)
            .max_by_key(|(idx, s)| (s.updated_at, *idx))
            .map(|(_, s)| s.clone()))
    }

    async fn has_completed_session(
        &self,
        wedding_id: &str,
        event_id: &str,
        phone_e164: &str,
    ) -> StoreResult<bool> {
        let state = self.state.lock().await;
        Ok(state.sessions.iter().any(|s| {
            s.wedding_id == wedding_id
                && s.event_id == event_id
                && s.phone_e164 == phone_e164
                && s.flow_status == FlowStatus::Completed
        }))
    }

    async fn find_by_outbound_message_id(
        &self,
        provider_message_id: &str,
    ) -> StoreResult<Option<RsvpFlowSession>> {
        let state = self.state.lock().await;
        Ok(state
            .sessions
            .iter()
            .rev()
            .find(|s| s.last_outbound_message_id.as_deref() == Some(provider_message_id))
            .cloned())
    }

    async fn create_session(&self, input: &CreateRsvpFlowSession) -> StoreResult<RsvpFlowSession> {
        let mut state = self.state.lock().await;
        let clash = state.sessions.iter().any(|s| {
            s.wedding_id == input.wedding_id
                && s.event_id == input.event_id
                && s.phone_e164 == input.phone_e164
                && s.flow_status == FlowStatus::Active
        });
        if clash {
            return Err(StoreError::Conflict(format!(
                "active RSVP session already exists for {}",
                input.phone_e164
            )));
        }
        let now = Utc::now();
        let session = RsvpFlowSession {
            id: new_id(),
            wedding_id: input.wedding_id.clone(),
            event_id: input.event_id.clone(),
            guest_unit_id: input.guest_unit_id.clone(),
            phone_e164: input.phone_e164.clone(),
            flow_status: FlowStatus::Active,
            step_index: 1,
            final_response: None,
            confirmation_summary: None,
            last_provider_message_id: input.last_provider_message_id.clone(),
            last_outbound_message_id: None,
            last_inbound_at: now,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn update_session(
        &self,
        session_id: &str,
        input: &UpdateRsvpFlowSession,
    ) -> StoreResult<RsvpFlowSession> {
        let mut state = self.state.lock().await;
        let session = state.session_mut(session_id)?;
        let now = Utc::now();
        session.step_index = input.step_index;
        session.flow_status = input.flow_status;
        session.final_response = input.final_response;
        if input.confirmation_summary.is_some() {
            session.confirmation_summary = input.confirmation_summary.clone();
        }
        if input.last_provider_message_id.is_some() {
            session.last_provider_message_id = input.last_provider_message_id.clone();
        }
        if input.flow_status == FlowStatus::Completed {
            session.completed_at = Some(now);
        }
        session.last_inbound_at = now;
        session.updated_at = now;
        Ok(session.clone())
    }

    async fn mark_expired(&self, session_id: &str) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let session = state.session_mut(session_id)?;
        if session.flow_status == FlowStatus::Active {
            session.flow_status = FlowStatus::Expired;
            session.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn record_outbound_message(
        &self,
        session_id: &str,
        provider_message_id: &str,
    ) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.session_mut(session_id)?.last_outbound_message_id = Some(provider_message_id.to_string());
        Ok(())
    }

    async fn upsert_person_response(
        &self,
        input: &UpsertPersonResponse,
    ) -> StoreResult<RsvpPersonResponse> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        if let Some(existing) = state.responses.iter_mut().find(|r| {
            r.wedding_id == input.wedding_id
                && r.event_id == input.event_id
                && r.person_id == input.person_id
        }) {
            existing.flow_session_id = input.flow_session_id.clone();
            existing.guest_unit_id = input.guest_unit_id.clone();
            existing.response = input.response;
            existing.response_revision += 1;
            existing.responded_at = now;
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let response = RsvpPersonResponse {
            id: new_id(),
            flow_session_id: input.flow_session_id.clone(),
            wedding_id: input.wedding_id.clone(),
            event_id: input.event_id.clone(),
            guest_unit_id: input.guest_unit_id.clone(),
            person_id: input.person_id.clone(),
            response: input.response,
            response_revision: 1,
            responded_at: now,
            created_at: now,
            updated_at: now,
        };
        state.responses.push(response.clone());
        Ok(response)
    }

    async fn count_responses(
        &self,
        wedding_id: &str,
        event_id: &str,
        guest_unit_id: &str,
    ) -> StoreResult<ResponseSummary> {
        let state = self.state.lock().await;
        let mut summary = ResponseSummary::default();
        for r in state.responses.iter().filter(|r| {
            r.wedding_id == wedding_id && r.event_id == event_id && r.guest_unit_id == guest_unit_id
        }) {
            match r.response {
                RsvpChoice::Accept => summary.accepted += 1,
                RsvpChoice::Decline => summary.declined += 1,
            }
            summary.total += 1;
        }
        Ok(summary)
    }
}

#[async_trait]
impl AuditLog for MemoryStore {
    async fn write(&self, entry: &AuditEntry) -> StoreResult<()> {
        self.state.lock().await.audit.push(entry.clone());
        Ok(())
    }
}

#[async_trait]
impl HealthProbe for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use vows_core::guest::{IdentityRecord, MemberRecord, PersonRecord};
    use vows_core::status::{AuthResult, GuestSide};

    use super::*;

    fn unit(id: &str, name: &str, phone: Option<&str>) -> GuestUnitRecord {
        GuestUnitRecord {
            id: id.into(),
            display_name: name.into(),
            side: GuestSide::Neutral,
            is_active: true,
            is_inviteable: true,
            delivery_identity: phone.map(|p| IdentityRecord {
                phone_e164: p.into(),
                is_active: true,
                is_inviteable: true,
            }),
            tag_ids: Vec::new(),
            members: Vec::new(),
        }
    }

    fn receipt(key: &str) -> CreateWebhookReceipt {
        CreateWebhookReceipt {
            wedding_id: None,
            invite_message_id: None,
            provider_message_id: Some("wamid.1".into()),
            event_status: Some(LifecycleStatus::Delivered),
            event_at: None,
            auth_result: AuthResult::Verified,
            receipt_status: ReceiptStatus::Ignored,
            dedupe_key: key.into(),
            payload: serde_json::json!({}),
            signature_header: None,
            error_detail: None,
            processed_at: None,
        }
    }

    #[tokio::test]
    async fn units_are_listed_by_name_then_id() {
        let store = MemoryStore::new();
        store.seed_unit("w1", unit("u2", "Zed", None)).await;
        store.seed_unit("w1", unit("u3", "Amar", None)).await;
        store.seed_unit("w1", unit("u1", "Amar", None)).await;
        store.seed_unit("w2", unit("u9", "Other", None)).await;

        let ids: Vec<String> = store
            .list_active_units("w1")
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(ids, vec!["u1", "u3", "u2"]);
    }

    #[tokio::test]
    async fn phone_lookup_prefers_unit_identity() {
        let store = MemoryStore::new();
        let mut by_member = unit("u1", "Aunt", None);
        by_member.members.push(MemberRecord {
            is_active: true,
            person: PersonRecord {
                id: "p1".into(),
                full_name: "Aunt".into(),
                is_active: true,
                is_inviteable: true,
                identity: Some(IdentityRecord {
                    phone_e164: "+919800000001".into(),
                    is_active: true,
                    is_inviteable: true,
                }),
                tag_ids: Vec::new(),
            },
        });
        store.seed_unit("w1", by_member).await;
        store.seed_unit("w1", unit("u2", "Uncle", Some("+919800000001"))).await;

        let found = store.find_unit_by_phone("w1", "+919800000001").await.unwrap();
        assert_eq!(found.map(|u| u.id).as_deref(), Some("u2"));
        assert!(store.find_unit_by_phone("w1", "+10000000000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_dedupe_key_is_not_inserted() {
        let store = MemoryStore::new();
        let first = match store.insert_receipt(&receipt("k1")).await.unwrap() {
            ReceiptInsert::Inserted(receipt) => receipt,
            other => panic!("expected Inserted, got {other:?}"),
        };

        // Unfinished receipts are handed back for another attempt.
        assert_matches!(
            store.insert_receipt(&receipt("k1")).await.unwrap(),
            ReceiptInsert::Pending(r) if r.id == first.id
        );

        store
            .complete_receipt(&first.id, ReceiptStatus::Accepted, None)
            .await
            .unwrap();
        assert_matches!(store.insert_receipt(&receipt("k1")).await.unwrap(), ReceiptInsert::Duplicate);
        assert_eq!(store.receipts().await.len(), 1);
    }

    #[tokio::test]
    async fn second_active_session_conflicts() {
        let store = MemoryStore::new();
        let input = CreateRsvpFlowSession {
            wedding_id: "w1".into(),
            event_id: "e1".into(),
            guest_unit_id: "u1".into(),
            phone_e164: "+919800000001".into(),
            last_provider_message_id: None,
        };
        let first = store.create_session(&input).await.unwrap();
        assert_matches!(store.create_session(&input).await, Err(StoreError::Conflict(_)));

        store.mark_expired(&first.id).await.unwrap();
        assert!(store.create_session(&input).await.is_ok());
    }

    #[tokio::test]
    async fn person_response_upsert_bumps_revision() {
        let store = MemoryStore::new();
        let mut input = UpsertPersonResponse {
            flow_session_id: "s1".into(),
            wedding_id: "w1".into(),
            event_id: "e1".into(),
            guest_unit_id: "u1".into(),
            person_id: "p1".into(),
            response: RsvpChoice::Accept,
        };
        assert_eq!(store.upsert_person_response(&input).await.unwrap().response_revision, 1);
        input.response = RsvpChoice::Decline;
        let updated = store.upsert_person_response(&input).await.unwrap();
        assert_eq!(updated.response_revision, 2);
        assert_eq!(store.responses().await.len(), 1);

        let summary = store.count_responses("w1", "e1", "u1").await.unwrap();
        assert_eq!(summary, ResponseSummary { accepted: 0, declined: 1, total: 1 });
    }
}
