//! Repository for the `invite_do_not_messages` table.

use sqlx::PgPool;

use crate::models::dnm::DoNotMessage;

const COLUMNS: &str = "id, wedding_id, phone_e164, reason_note, is_active, revoked_at, created_at";

pub struct DoNotMessageRepo;

impl DoNotMessageRepo {
    /// Active, non-revoked entries for a wedding, newest first.
    pub async fn list_active(
        pool: &PgPool,
        wedding_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<DoNotMessage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM invite_do_not_messages \
             WHERE wedding_id = $1 AND is_active = TRUE AND revoked_at IS NULL \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, DoNotMessage>(&query)
            .bind(wedding_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
