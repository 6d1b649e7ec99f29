//! Repositories for `invite_messages` and `invite_lifecycle_transitions`.

use sqlx::PgPool;
use vows_core::lifecycle::StatusPatch;
use vows_core::status::LifecycleStatus;
use vows_core::types::new_id;

use crate::models::message::{
    CreateInviteMessage, CreateLifecycleTransition, InviteMessage, LifecycleTransition,
};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

const MESSAGE_COLUMNS: &str = "\
    id, invite_run_id, wedding_id, event_id, recipient_guest_unit_id, \
    recipient_phone_e164, lifecycle_status, is_blocked, rejection_reason, \
    provider_message_id, provider_error_code, provider_error_message, \
    dispatched_at, delivered_at, read_at, failed_at, last_status_at, \
    created_at, updated_at";

const TRANSITION_COLUMNS: &str = "\
    id, invite_message_id, wedding_id, from_status, to_status, source, \
    webhook_receipt_id, provider_event_at, is_duplicate, reason_note, applied_at";

// ---------------------------------------------------------------------------
// InviteMessageRepo
// ---------------------------------------------------------------------------

pub struct InviteMessageRepo;

impl InviteMessageRepo {
    pub async fn create(
        pool: &PgPool,
        input: CreateInviteMessage,
    ) -> Result<InviteMessage, sqlx::Error> {
        let m = input.into_message(new_id());
        let query = format!(
            "INSERT INTO invite_messages \
                (id, invite_run_id, wedding_id, event_id, recipient_guest_unit_id, \
                 recipient_phone_e164, lifecycle_status, is_blocked, rejection_reason, \
                 provider_message_id, provider_error_code, provider_error_message, \
                 dispatched_at, failed_at, last_status_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {MESSAGE_COLUMNS}"
        );
        sqlx::query_as::<_, InviteMessage>(&query)
            .bind(&m.id)
            .bind(&m.invite_run_id)
            .bind(&m.wedding_id)
            .bind(&m.event_id)
            .bind(&m.recipient_guest_unit_id)
            .bind(&m.recipient_phone_e164)
            .bind(m.lifecycle_status)
            .bind(m.is_blocked)
            .bind(m.rejection_reason)
            .bind(&m.provider_message_id)
            .bind(&m.provider_error_code)
            .bind(&m.provider_error_message)
            .bind(m.dispatched_at)
            .bind(m.failed_at)
            .bind(m.last_status_at)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_provider_message_id(
        pool: &PgPool,
        provider_message_id: &str,
    ) -> Result<Option<InviteMessage>, sqlx::Error> {
        let query =
            format!("SELECT {MESSAGE_COLUMNS} FROM invite_messages WHERE provider_message_id = $1");
        sqlx::query_as::<_, InviteMessage>(&query)
            .bind(provider_message_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_run(
        pool: &PgPool,
        run_id: &str,
    ) -> Result<Vec<InviteMessage>, sqlx::Error> {
        let query = format!(
            "SELECT {MESSAGE_COLUMNS} FROM invite_messages \
             WHERE invite_run_id = $1 ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, InviteMessage>(&query)
            .bind(run_id)
            .fetch_all(pool)
            .await
    }

    /// Conditional update: succeeds only while `lifecycle_status = expected`.
    ///
    /// Timestamp columns absent from the patch keep their stored value.
    pub async fn compare_and_set_status(
        pool: &PgPool,
        id: &str,
        expected: LifecycleStatus,
        patch: &StatusPatch,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE invite_messages SET \
                lifecycle_status = $3, last_status_at = $4, \
                delivered_at = COALESCE($5, delivered_at), \
                read_at = COALESCE($6, read_at), \
                failed_at = COALESCE($7, failed_at), \
                updated_at = now() \
             WHERE id = $1 AND lifecycle_status = $2",
        )
        .bind(id)
        .bind(expected)
        .bind(patch.lifecycle_status)
        .bind(patch.last_status_at)
        .bind(patch.delivered_at)
        .bind(patch.read_at)
        .bind(patch.failed_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

// ---------------------------------------------------------------------------
// LifecycleTransitionRepo
// ---------------------------------------------------------------------------

/// Append-only; rows are never updated.
pub struct LifecycleTransitionRepo;

impl LifecycleTransitionRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateLifecycleTransition,
    ) -> Result<LifecycleTransition, sqlx::Error> {
        let query = format!(
            "INSERT INTO invite_lifecycle_transitions \
                (id, invite_message_id, wedding_id, from_status, to_status, source, \
                 webhook_receipt_id, provider_event_at, is_duplicate, reason_note) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {TRANSITION_COLUMNS}"
        );
        sqlx::query_as::<_, LifecycleTransition>(&query)
            .bind(new_id())
            .bind(&input.invite_message_id)
            .bind(&input.wedding_id)
            .bind(input.from_status)
            .bind(input.to_status)
            .bind(input.source)
            .bind(&input.webhook_receipt_id)
            .bind(input.provider_event_at)
            .bind(input.is_duplicate)
            .bind(&input.reason_note)
            .fetch_one(pool)
            .await
    }

    pub async fn list_by_message(
        pool: &PgPool,
        message_id: &str,
        limit: i64,
    ) -> Result<Vec<LifecycleTransition>, sqlx::Error> {
        let query = format!(
            "SELECT {TRANSITION_COLUMNS} FROM invite_lifecycle_transitions \
             WHERE invite_message_id = $1 \
             ORDER BY applied_at DESC, id DESC LIMIT $2"
        );
        sqlx::query_as::<_, LifecycleTransition>(&query)
            .bind(message_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
