//! Persistence ports consumed by the engine.
//!
//! Each trait covers one aggregate. [`crate::pg_store::PgStore`] implements
//! all of them over PostgreSQL and [`crate::memory::MemoryStore`] implements
//! them in memory for tests and local runs.

use async_trait::async_trait;
use vows_core::audit::AuditEntry;
use vows_core::guest::GuestUnitRecord;
use vows_core::lifecycle::StatusPatch;
use vows_core::rsvp::ResponseSummary;
use vows_core::status::{LifecycleStatus, ReceiptStatus};
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

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid stored value: {0}")]
    Decode(String),
}

/// Whether the error is a PostgreSQL unique violation (`23505`).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Read-only collaborators
// ---------------------------------------------------------------------------

#[async_trait]
pub trait GuestDirectory: Send + Sync {
    /// Active units of a wedding ordered by display name, then id.
    async fn list_active_units(&self, wedding_id: &str) -> StoreResult<Vec<GuestUnitRecord>>;

    /// Active units among `ids`, in the same stable order.
    async fn find_active_units(
        &self,
        wedding_id: &str,
        ids: &[EntityId],
    ) -> StoreResult<Vec<GuestUnitRecord>>;

    /// The active unit reachable at `phone_e164`, matching the unit delivery
    /// identity before any member identity.
    async fn find_unit_by_phone(
        &self,
        wedding_id: &str,
        phone_e164: &str,
    ) -> StoreResult<Option<GuestUnitRecord>>;
}

#[async_trait]
pub trait DoNotMessageStore: Send + Sync {
    /// Active, non-revoked entries, newest first.
    async fn list_active(&self, wedding_id: &str, limit: Option<i64>) -> StoreResult<Vec<DoNotMessage>>;
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[async_trait]
pub trait RunStore: Send + Sync {
    async fn create_run(&self, input: &CreateInviteSendRun) -> StoreResult<InviteSendRun>;

    async fn finalize_run(
        &self,
        run_id: &str,
        input: &FinalizeInviteSendRun,
    ) -> StoreResult<InviteSendRun>;

    async fn find_run(&self, wedding_id: &str, run_id: &str) -> StoreResult<Option<InviteSendRun>>;

    /// Newest first.
    async fn list_runs(
        &self,
        wedding_id: &str,
        event_id: Option<&str>,
        limit: i64,
    ) -> StoreResult<Vec<InviteSendRun>>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert_message(&self, input: CreateInviteMessage) -> StoreResult<InviteMessage>;

    async fn find_by_provider_message_id(
        &self,
        provider_message_id: &str,
    ) -> StoreResult<Option<InviteMessage>>;

    /// Messages of a run in insertion order.
    async fn list_by_run(&self, run_id: &str) -> StoreResult<Vec<InviteMessage>>;

    /// Apply `patch` only if the stored status still equals `expected`.
    ///
    /// Returns `false` when another writer moved the message first.
    async fn compare_and_set_status(
        &self,
        message_id: &str,
        expected: LifecycleStatus,
        patch: &StatusPatch,
    ) -> StoreResult<bool>;

    async fn record_transition(
        &self,
        input: &CreateLifecycleTransition,
    ) -> StoreResult<LifecycleTransition>;

    /// Most recent first.
    async fn list_transitions(
        &self,
        message_id: &str,
        limit: i64,
    ) -> StoreResult<Vec<LifecycleTransition>>;
}

// ---------------------------------------------------------------------------
// Webhooks
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ReceiptStore: Send + Sync {
    /// Insert unless a receipt with the same dedupe key exists. The check
    /// and the insert are one atomic operation.
    async fn insert_receipt(&self, input: &CreateWebhookReceipt) -> StoreResult<ReceiptInsert>;

    async fn complete_receipt(
        &self,
        receipt_id: &str,
        status: ReceiptStatus,
        error_detail: Option<&str>,
    ) -> StoreResult<()>;

    /// Most recent first.
    async fn list_by_message(&self, message_id: &str, limit: i64) -> StoreResult<Vec<WebhookReceipt>>;
}

// ---------------------------------------------------------------------------
// RSVP
// ---------------------------------------------------------------------------

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find_latest_session(
        &self,
        wedding_id: &str,
        event_id: &str,
        phone_e164: &str,
    ) -> StoreResult<Option<RsvpFlowSession>>;

    async fn has_completed_session(
        &self,
        wedding_id: &str,
        event_id: &str,
        phone_e164: &str,
    ) -> StoreResult<bool>;

    /// The session whose last outbound prompt has this provider id.
    async fn find_by_outbound_message_id(
        &self,
        provider_message_id: &str,
    ) -> StoreResult<Option<RsvpFlowSession>>;

    /// Fails with [`StoreError::Conflict`] if an active session already
    /// exists for the same wedding, event and phone.
    async fn create_session(&self, input: &CreateRsvpFlowSession) -> StoreResult<RsvpFlowSession>;

    async fn update_session(
        &self,
        session_id: &str,
        input: &UpdateRsvpFlowSession,
    ) -> StoreResult<RsvpFlowSession>;

    async fn mark_expired(&self, session_id: &str) -> StoreResult<()>;

    async fn record_outbound_message(
        &self,
        session_id: &str,
        provider_message_id: &str,
    ) -> StoreResult<()>;

    /// Insert, or overwrite and bump the revision of, the response for
    /// `(wedding, event, person)`.
    async fn upsert_person_response(
        &self,
        input: &UpsertPersonResponse,
    ) -> StoreResult<RsvpPersonResponse>;

    /// Counts over every response recorded for the unit at the event.
    async fn count_responses(
        &self,
        wedding_id: &str,
        event_id: &str,
        guest_unit_id: &str,
    ) -> StoreResult<ResponseSummary>;
}

// ---------------------------------------------------------------------------
// Audit / health
// ---------------------------------------------------------------------------

#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn write(&self, entry: &AuditEntry) -> StoreResult<()>;
}

#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;
}
