//! PostgreSQL implementation of every store port.

use async_trait::async_trait;
use sqlx::PgPool;
use vows_core::audit::AuditEntry;
use vows_core::guest::GuestUnitRecord;
use vows_core::lifecycle::StatusPatch;
use vows_core::rsvp::ResponseSummary;
use vows_core::status::{FlowStatus, LifecycleStatus, ReceiptStatus};
use vows_core::types::EntityId;

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
use crate::repositories::{
    AuditLogRepo, DoNotMessageRepo, GuestDirectoryRepo, InviteMessageRepo, InviteSendRunRepo,
    LifecycleTransitionRepo, RsvpPersonResponseRepo, RsvpSessionRepo, WebhookReceiptRepo,
};
use crate::stores::{
    is_unique_violation, AuditLog, DoNotMessageStore, GuestDirectory, HealthProbe, MessageStore,
    ReceiptStore, RunStore, SessionStore, StoreError, StoreResult,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl GuestDirectory for PgStore {
    async fn list_active_units(&self, wedding_id: &str) -> StoreResult<Vec<GuestUnitRecord>> {
        Ok(GuestDirectoryRepo::list_active_units(&self.pool, wedding_id).await?)
    }

    async fn find_active_units(
        &self,
        wedding_id: &str,
        ids: &[EntityId],
    ) -> StoreResult<Vec<GuestUnitRecord>> {
        Ok(GuestDirectoryRepo::find_active_units(&self.pool, wedding_id, ids).await?)
    }

    async fn find_unit_by_phone(
        &self,
        wedding_id: &str,
        phone_e164: &str,
    ) -> StoreResult<Option<GuestUnitRecord>> {
        let Some(unit_id) =
            GuestDirectoryRepo::find_unit_id_by_phone(&self.pool, wedding_id, phone_e164).await?
        else {
            return Ok(None);
        };
        let mut units =
            GuestDirectoryRepo::find_active_units(&self.pool, wedding_id, &[unit_id]).await?;
        Ok(units.pop())
    }
}

#[async_trait]
impl DoNotMessageStore for PgStore {
    async fn list_active(&self, wedding_id: &str, limit: Option<i64>) -> StoreResult<Vec<DoNotMessage>> {
        Ok(DoNotMessageRepo::list_active(&self.pool, wedding_id, limit).await?)
    }
}

#[async_trait]
impl RunStore for PgStore {
    async fn create_run(&self, input: &CreateInviteSendRun) -> StoreResult<InviteSendRun> {
        Ok(InviteSendRunRepo::create(&self.pool, input).await?)
    }

    async fn finalize_run(
        &self,
        run_id: &str,
        input: &FinalizeInviteSendRun,
    ) -> StoreResult<InviteSendRun> {
        match InviteSendRunRepo::finalize(&self.pool, run_id, input).await {
            Err(sqlx::Error::RowNotFound) => Err(StoreError::NotFound {
                entity: "InviteSendRun",
                id: run_id.to_string(),
            }),
            other => Ok(other?),
        }
    }

    async fn find_run(&self, wedding_id: &str, run_id: &str) -> StoreResult<Option<InviteSendRun>> {
        Ok(InviteSendRunRepo::find_by_id(&self.pool, wedding_id, run_id).await?)
    }

    async fn list_runs(
        &self,
        wedding_id: &str,
        event_id: Option<&str>,
        limit: i64,
    ) -> StoreResult<Vec<InviteSendRun>> {
        Ok(InviteSendRunRepo::list_by_wedding(&self.pool, wedding_id, event_id, limit).await?)
    }
}

#[async_trait]
impl MessageStore for PgStore {
    async fn insert_message(&self, input: CreateInviteMessage) -> StoreResult<InviteMessage> {
        match InviteMessageRepo::create(&self.pool, input).await {
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict(
                "provider message id already recorded".into(),
            )),
            other => Ok(other?),
        }
    }

    async fn find_by_provider_message_id(
        &self,
        provider_message_id: &str,
    ) -> StoreResult<Option<InviteMessage>> {
        Ok(InviteMessageRepo::find_by_provider_message_id(&self.pool, provider_message_id).await?)
    }

    async fn list_by_run(&self, run_id: &str) -> StoreResult<Vec<InviteMessage>> {
        Ok(InviteMessageRepo::list_by_run(&self.pool, run_id).await?)
    }

    async fn compare_and_set_status(
        &self,
        message_id: &str,
        expected: LifecycleStatus,
        patch: &StatusPatch,
    ) -> StoreResult<bool> {
        Ok(InviteMessageRepo::compare_and_set_status(&self.pool, message_id, expected, patch).await?)
    }

    async fn record_transition(
        &self,
        input: &CreateLifecycleTransition,
    ) -> StoreResult<LifecycleTransition> {
        Ok(LifecycleTransitionRepo::create(&self.pool, input).await?)
    }

    async fn list_transitions(
        &self,
        message_id: &str,
        limit: i64,
    ) -> StoreResult<Vec<LifecycleTransition>> {
        Ok(LifecycleTransitionRepo::list_by_message(&self.pool, message_id, limit).await?)
    }
}

#[async_trait]
impl ReceiptStore for PgStore {
    async fn insert_receipt(&self, input: &CreateWebhookReceipt) -> StoreResult<ReceiptInsert> {
        Ok(WebhookReceiptRepo::insert_unique(&self.pool, input).await?)
    }

    async fn complete_receipt(
        &self,
        receipt_id: &str,
        status: ReceiptStatus,
        error_detail: Option<&str>,
    ) -> StoreResult<()> {
        if WebhookReceiptRepo::complete(&self.pool, receipt_id, status, error_detail).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                entity: "WebhookReceipt",
                id: receipt_id.to_string(),
            })
        }
    }

    async fn list_by_message(&self, message_id: &str, limit: i64) -> StoreResult<Vec<WebhookReceipt>> {
        Ok(WebhookReceiptRepo::list_by_message(&self.pool, message_id, limit).await?)
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn find_latest_session(
        &self,
        wedding_id: &str,
        event_id: &str,
        phone_e164: &str,
    ) -> StoreResult<Option<RsvpFlowSession>> {
        Ok(RsvpSessionRepo::find_latest(&self.pool, wedding_id, event_id, phone_e164).await?)
    }

    async fn has_completed_session(
        &self,
        wedding_id: &str,
        event_id: &str,
        phone_e164: &str,
    ) -> StoreResult<bool> {
        Ok(RsvpSessionRepo::exists_with_status(
            &self.pool,
            wedding_id,
            event_id,
            phone_e164,
            FlowStatus::Completed,
        )
        .await?)
    }

    async fn find_by_outbound_message_id(
        &self,
        provider_message_id: &str,
    ) -> StoreResult<Option<RsvpFlowSession>> {
        Ok(RsvpSessionRepo::find_by_outbound_message_id(&self.pool, provider_message_id).await?)
    }

    async fn create_session(&self, input: &CreateRsvpFlowSession) -> StoreResult<RsvpFlowSession> {
        match RsvpSessionRepo::create(&self.pool, input).await {
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict(format!(
                "active RSVP session already exists for {}",
                input.phone_e164
            ))),
            other => Ok(other?),
        }
    }

    async fn update_session(
        &self,
        session_id: &str,
        input: &UpdateRsvpFlowSession,
    ) -> StoreResult<RsvpFlowSession> {
        RsvpSessionRepo::update(&self.pool, session_id, input)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                entity: "RsvpFlowSession",
                id: session_id.to_string(),
            })
    }

    async fn mark_expired(&self, session_id: &str) -> StoreResult<()> {
        RsvpSessionRepo::mark_expired(&self.pool, session_id).await?;
        Ok(())
    }

    async fn record_outbound_message(
        &self,
        session_id: &str,
        provider_message_id: &str,
    ) -> StoreResult<()> {
        RsvpSessionRepo::set_outbound_message(&self.pool, session_id, provider_message_id).await?;
        Ok(())
    }

    async fn upsert_person_response(
        &self,
        input: &UpsertPersonResponse,
    ) -> StoreResult<RsvpPersonResponse> {
        Ok(RsvpPersonResponseRepo::upsert(&self.pool, input).await?)
    }

    async fn count_responses(
        &self,
        wedding_id: &str,
        event_id: &str,
        guest_unit_id: &str,
    ) -> StoreResult<ResponseSummary> {
        Ok(RsvpPersonResponseRepo::summarize(&self.pool, wedding_id, event_id, guest_unit_id).await?)
    }
}

#[async_trait]
impl AuditLog for PgStore {
    async fn write(&self, entry: &AuditEntry) -> StoreResult<()> {
        AuditLogRepo::insert(&self.pool, entry).await?;
        Ok(())
    }
}

#[async_trait]
impl HealthProbe for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(crate::health_check(&self.pool).await?)
    }
}
