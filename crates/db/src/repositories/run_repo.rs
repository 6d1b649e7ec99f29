//! Repository for the `invite_send_runs` table.

use sqlx::PgPool;
use vows_core::status::RunStatus;
use vows_core::types::new_id;

use crate::models::run::{CreateInviteSendRun, FinalizeInviteSendRun, InviteSendRun};

/// Column list for `invite_send_runs` queries.
const COLUMNS: &str = "\
    id, wedding_id, event_id, template_name, template_language, status, \
    audience_snapshot, total_candidates, eligible_count, blocked_count, \
    sent_count, failed_count, failure_reason, created_by, started_at, \
    completed_at, failed_at, created_at, updated_at";

pub struct InviteSendRunRepo;

impl InviteSendRunRepo {
    /// Open a run in the `running` state.
    pub async fn create(
        pool: &PgPool,
        input: &CreateInviteSendRun,
    ) -> Result<InviteSendRun, sqlx::Error> {
        let query = format!(
            "INSERT INTO invite_send_runs \
                (id, wedding_id, event_id, template_name, template_language, status, \
                 audience_snapshot, total_candidates, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, InviteSendRun>(&query)
            .bind(new_id())
            .bind(&input.wedding_id)
            .bind(&input.event_id)
            .bind(&input.template_name)
            .bind(&input.template_language)
            .bind(RunStatus::Running)
            .bind(&input.audience_snapshot)
            .bind(input.total_candidates)
            .bind(&input.created_by)
            .fetch_one(pool)
            .await
    }

    /// Write final counters and status. `failed_at` is set only for failed runs.
    pub async fn finalize(
        pool: &PgPool,
        id: &str,
        input: &FinalizeInviteSendRun,
    ) -> Result<InviteSendRun, sqlx::Error> {
        let query = format!(
            "UPDATE invite_send_runs SET \
                status = $2, eligible_count = $3, blocked_count = $4, \
                sent_count = $5, failed_count = $6, failure_reason = $7, \
                completed_at = $8, \
                failed_at = CASE WHEN $2 = 'failed' THEN $8 ELSE NULL END, \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let c = &input.counters;
        sqlx::query_as::<_, InviteSendRun>(&query)
            .bind(id)
            .bind(input.status)
            .bind(c.eligible as i64)
            .bind(c.blocked as i64)
            .bind(c.sent as i64)
            .bind(c.failed as i64)
            .bind(&input.failure_reason)
            .bind(input.completed_at)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        wedding_id: &str,
        id: &str,
    ) -> Result<Option<InviteSendRun>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM invite_send_runs WHERE wedding_id = $1 AND id = $2");
        sqlx::query_as::<_, InviteSendRun>(&query)
            .bind(wedding_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Runs of a wedding, optionally narrowed to one event, newest first.
    pub async fn list_by_wedding(
        pool: &PgPool,
        wedding_id: &str,
        event_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<InviteSendRun>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM invite_send_runs \
             WHERE wedding_id = $1 AND ($2::TEXT IS NULL OR event_id = $2) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3"
        );
        sqlx::query_as::<_, InviteSendRun>(&query)
            .bind(wedding_id)
            .bind(event_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
