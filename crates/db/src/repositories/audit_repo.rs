//! Repository for the `audit_logs` table.

use sqlx::PgPool;
use vows_core::audit::AuditEntry;
use vows_core::types::new_id;

use crate::models::audit::AuditLogRow;

const COLUMNS: &str = "\
    id, wedding_id, actor_id, action_type, target_type, target_id, \
    before_summary, after_summary, reason_note, created_at";

pub struct AuditLogRepo;

impl AuditLogRepo {
    pub async fn insert(pool: &PgPool, entry: &AuditEntry) -> Result<AuditLogRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO audit_logs \
                (id, wedding_id, actor_id, action_type, target_type, target_id, \
                 before_summary, after_summary, reason_note) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLogRow>(&query)
            .bind(new_id())
            .bind(&entry.wedding_id)
            .bind(&entry.actor_id)
            .bind(&entry.action_type)
            .bind(&entry.target_type)
            .bind(&entry.target_id)
            .bind(&entry.before_summary)
            .bind(&entry.after_summary)
            .bind(&entry.reason_note)
            .fetch_one(pool)
            .await
    }

    pub async fn list_by_target(
        pool: &PgPool,
        target_type: &str,
        target_id: &str,
    ) -> Result<Vec<AuditLogRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs \
             WHERE target_type = $1 AND target_id = $2 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, AuditLogRow>(&query)
            .bind(target_type)
            .bind(target_id)
            .fetch_all(pool)
            .await
    }
}
