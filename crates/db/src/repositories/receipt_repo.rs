//! Repository for the `invite_webhook_receipts` table.

use sqlx::PgPool;
use vows_core::status::ReceiptStatus;
use vows_core::types::new_id;

use crate::models::receipt::{CreateWebhookReceipt, ReceiptInsert, WebhookReceipt};

const COLUMNS: &str = "\
    id, wedding_id, invite_message_id, provider_message_id, event_status, \
    event_at, auth_result, receipt_status, dedupe_key, payload, \
    signature_header, error_detail, processed_at, received_at";

pub struct WebhookReceiptRepo;

impl WebhookReceiptRepo {
    /// Insert guarded by `uq_invite_webhook_receipts_dedupe_key`.
    ///
    /// `ON CONFLICT DO NOTHING` returns no row for a duplicate key, so two
    /// concurrent deliveries of one event resolve to exactly one insert. A
    /// duplicate whose receipt is still unprocessed comes back as
    /// [`ReceiptInsert::Pending`].
    pub async fn insert_unique(
        pool: &PgPool,
        input: &CreateWebhookReceipt,
    ) -> Result<ReceiptInsert, sqlx::Error> {
        let query = format!(
            "INSERT INTO invite_webhook_receipts \
                (id, wedding_id, invite_message_id, provider_message_id, event_status, \
                 event_at, auth_result, receipt_status, dedupe_key, payload, \
                 signature_header, error_detail, processed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             ON CONFLICT (dedupe_key) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, WebhookReceipt>(&query)
            .bind(new_id())
            .bind(&input.wedding_id)
            .bind(&input.invite_message_id)
            .bind(&input.provider_message_id)
            .bind(input.event_status)
            .bind(input.event_at)
            .bind(input.auth_result)
            .bind(input.receipt_status)
            .bind(&input.dedupe_key)
            .bind(&input.payload)
            .bind(&input.signature_header)
            .bind(&input.error_detail)
            .bind(input.processed_at)
            .fetch_optional(pool)
            .await?;

        if let Some(receipt) = inserted {
            return Ok(ReceiptInsert::Inserted(receipt));
        }

        let pending = Self::find_unprocessed(pool, &input.dedupe_key).await?;
        Ok(match pending {
            Some(receipt) => ReceiptInsert::Pending(receipt),
            None => ReceiptInsert::Duplicate,
        })
    }

    /// The receipt for `dedupe_key` if it has not been completed yet.
    pub async fn find_unprocessed(
        pool: &PgPool,
        dedupe_key: &str,
    ) -> Result<Option<WebhookReceipt>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM invite_webhook_receipts \
             WHERE dedupe_key = $1 AND processed_at IS NULL"
        );
        sqlx::query_as::<_, WebhookReceipt>(&query)
            .bind(dedupe_key)
            .fetch_optional(pool)
            .await
    }

    pub async fn complete(
        pool: &PgPool,
        id: &str,
        status: ReceiptStatus,
        error_detail: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE invite_webhook_receipts \
             SET receipt_status = $2, error_detail = $3, processed_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(error_detail)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn list_by_message(
        pool: &PgPool,
        message_id: &str,
        limit: i64,
    ) -> Result<Vec<WebhookReceipt>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM invite_webhook_receipts \
             WHERE invite_message_id = $1 \
             ORDER BY received_at DESC, id DESC LIMIT $2"
        );
        sqlx::query_as::<_, WebhookReceipt>(&query)
            .bind(message_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
