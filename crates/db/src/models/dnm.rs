//! Do-not-message entries.

use serde::Serialize;
use sqlx::FromRow;
use vows_core::policy::DoNotMessageEntry;
use vows_core::types::{EntityId, Timestamp};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DoNotMessage {
    pub id: EntityId,
    pub wedding_id: EntityId,
    pub phone_e164: String,
    pub reason_note: Option<String>,
    pub is_active: bool,
    pub revoked_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl From<DoNotMessage> for DoNotMessageEntry {
    fn from(row: DoNotMessage) -> Self {
        Self {
            phone_e164: row.phone_e164,
            reason_note: row.reason_note,
        }
    }
}
