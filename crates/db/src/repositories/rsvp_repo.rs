//! Repositories for `rsvp_flow_sessions` and `rsvp_person_responses`.

use sqlx::PgPool;
use vows_core::rsvp::ResponseSummary;
use vows_core::status::FlowStatus;
use vows_core::types::new_id;

use crate::models::rsvp::{
    CreateRsvpFlowSession, RsvpFlowSession, RsvpPersonResponse, UpdateRsvpFlowSession,
    UpsertPersonResponse,
};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

const SESSION_COLUMNS: &str = "\
    id, wedding_id, event_id, guest_unit_id, phone_e164, flow_status, \
    step_index, final_response, confirmation_summary, last_provider_message_id, \
    last_outbound_message_id, last_inbound_at, completed_at, created_at, updated_at";

const RESPONSE_COLUMNS: &str = "\
    id, flow_session_id, wedding_id, event_id, guest_unit_id, person_id, \
    response, response_revision, responded_at, created_at, updated_at";

// ---------------------------------------------------------------------------
// RsvpSessionRepo
// ---------------------------------------------------------------------------

pub struct RsvpSessionRepo;

impl RsvpSessionRepo {
    pub async fn find_latest(
        pool: &PgPool,
        wedding_id: &str,
        event_id: &str,
        phone_e164: &str,
    ) -> Result<Option<RsvpFlowSession>, sqlx::Error> {
        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM rsvp_flow_sessions \
             WHERE wedding_id = $1 AND event_id = $2 AND phone_e164 = $3 \
             ORDER BY updated_at DESC, created_at DESC, id DESC LIMIT 1"
        );
        sqlx::query_as::<_, RsvpFlowSession>(&query)
            .bind(wedding_id)
            .bind(event_id)
            .bind(phone_e164)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists_with_status(
        pool: &PgPool,
        wedding_id: &str,
        event_id: &str,
        phone_e164: &str,
        status: FlowStatus,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM rsvp_flow_sessions \
             WHERE wedding_id = $1 AND event_id = $2 AND phone_e164 = $3 AND flow_status = $4)",
        )
        .bind(wedding_id)
        .bind(event_id)
        .bind(phone_e164)
        .bind(status)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_outbound_message_id(
        pool: &PgPool,
        provider_message_id: &str,
    ) -> Result<Option<RsvpFlowSession>, sqlx::Error> {
        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM rsvp_flow_sessions \
             WHERE last_outbound_message_id = $1 \
             ORDER BY updated_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, RsvpFlowSession>(&query)
            .bind(provider_message_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert an `active` session at step 1.
    ///
    /// A second active session for the same wedding, event and phone violates
    /// `uq_rsvp_flow_sessions_active`.
    pub async fn create(
        pool: &PgPool,
        input: &CreateRsvpFlowSession,
    ) -> Result<RsvpFlowSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO rsvp_flow_sessions \
                (id, wedding_id, event_id, guest_unit_id, phone_e164, flow_status, \
                 step_index, last_provider_message_id) \
             VALUES ($1, $2, $3, $4, $5, $6, 1, $7) \
             RETURNING {SESSION_COLUMNS}"
        );
        sqlx::query_as::<_, RsvpFlowSession>(&query)
            .bind(new_id())
            .bind(&input.wedding_id)
            .bind(&input.event_id)
            .bind(&input.guest_unit_id)
            .bind(&input.phone_e164)
            .bind(FlowStatus::Active)
            .bind(&input.last_provider_message_id)
            .fetch_one(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: &str,
        input: &UpdateRsvpFlowSession,
    ) -> Result<Option<RsvpFlowSession>, sqlx::Error> {
        let query = format!(
            "UPDATE rsvp_flow_sessions SET \
                step_index = $2, flow_status = $3, final_response = $4, \
                confirmation_summary = COALESCE($5, confirmation_summary), \
                last_provider_message_id = COALESCE($6, last_provider_message_id), \
                completed_at = CASE WHEN $3 = 'completed' THEN now() ELSE completed_at END, \
                last_inbound_at = now(), updated_at = now() \
             WHERE id = $1 \
             RETURNING {SESSION_COLUMNS}"
        );
        sqlx::query_as::<_, RsvpFlowSession>(&query)
            .bind(id)
            .bind(input.step_index)
            .bind(input.flow_status)
            .bind(input.final_response)
            .bind(&input.confirmation_summary)
            .bind(&input.last_provider_message_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn mark_expired(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE rsvp_flow_sessions SET flow_status = $2, updated_at = now() \
             WHERE id = $1 AND flow_status = 'active'",
        )
        .bind(id)
        .bind(FlowStatus::Expired)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn set_outbound_message(
        pool: &PgPool,
        id: &str,
        provider_message_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE rsvp_flow_sessions SET last_outbound_message_id = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(provider_message_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

// ---------------------------------------------------------------------------
// RsvpPersonResponseRepo
// ---------------------------------------------------------------------------

pub struct RsvpPersonResponseRepo;

impl RsvpPersonResponseRepo {
    /// Insert at revision 1 or overwrite and increment the revision.
    pub async fn upsert(
        pool: &PgPool,
        input: &UpsertPersonResponse,
    ) -> Result<RsvpPersonResponse, sqlx::Error> {
        let query = format!(
            "INSERT INTO rsvp_person_responses \
                (id, flow_session_id, wedding_id, event_id, guest_unit_id, person_id, response) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (wedding_id, event_id, person_id) DO UPDATE SET \
                flow_session_id = EXCLUDED.flow_session_id, \
                guest_unit_id = EXCLUDED.guest_unit_id, \
                response = EXCLUDED.response, \
                response_revision = rsvp_person_responses.response_revision + 1, \
                responded_at = now(), updated_at = now() \
             RETURNING {RESPONSE_COLUMNS}"
        );
        sqlx::query_as::<_, RsvpPersonResponse>(&query)
            .bind(new_id())
            .bind(&input.flow_session_id)
            .bind(&input.wedding_id)
            .bind(&input.event_id)
            .bind(&input.guest_unit_id)
            .bind(&input.person_id)
            .bind(input.response)
            .fetch_one(pool)
            .await
    }

    pub async fn summarize(
        pool: &PgPool,
        wedding_id: &str,
        event_id: &str,
        guest_unit_id: &str,
    ) -> Result<ResponseSummary, sqlx::Error> {
        let (accepted, declined, total) = sqlx::query_as::<_, (i64, i64, i64)>(
            "SELECT \
                COUNT(*) FILTER (WHERE response = 'accept'), \
                COUNT(*) FILTER (WHERE response = 'decline'), \
                COUNT(*) \
             FROM rsvp_person_responses \
             WHERE wedding_id = $1 AND event_id = $2 AND guest_unit_id = $3",
        )
        .bind(wedding_id)
        .bind(event_id)
        .bind(guest_unit_id)
        .fetch_one(pool)
        .await?;
        Ok(ResponseSummary {
            accepted,
            declined,
            total,
        })
    }
}
