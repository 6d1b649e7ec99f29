//! Read-only queries over the guest directory tables.
//!
//! Units, members and tags are fetched in three flat queries and stitched
//! together in memory, preserving the unit order of the first query.

use std::collections::HashMap;

use sqlx::PgPool;
use vows_core::guest::{GuestUnitRecord, MemberRecord};
use vows_core::types::EntityId;

use crate::models::guest::{identity, GuestMemberRow, GuestUnitRow, TagLinkRow};

const UNIT_SELECT: &str = "\
    SELECT u.id, u.display_name, u.side, u.is_active, u.is_inviteable, \
           i.normalized_phone_e164 AS delivery_phone, \
           i.is_active AS delivery_is_active, \
           i.is_inviteable AS delivery_is_inviteable \
    FROM guest_units u \
    LEFT JOIN guest_identities i ON i.id = u.delivery_identity_id";

pub struct GuestDirectoryRepo;

impl GuestDirectoryRepo {
    pub async fn list_active_units(
        pool: &PgPool,
        wedding_id: &str,
    ) -> Result<Vec<GuestUnitRecord>, sqlx::Error> {
        let query = format!(
            "{UNIT_SELECT} WHERE u.wedding_id = $1 AND u.is_active = TRUE \
             ORDER BY u.display_name ASC, u.id ASC"
        );
        let units = sqlx::query_as::<_, GuestUnitRow>(&query)
            .bind(wedding_id)
            .fetch_all(pool)
            .await?;
        Self::assemble(pool, units).await
    }

    pub async fn find_active_units(
        pool: &PgPool,
        wedding_id: &str,
        ids: &[EntityId],
    ) -> Result<Vec<GuestUnitRecord>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "{UNIT_SELECT} WHERE u.wedding_id = $1 AND u.is_active = TRUE AND u.id = ANY($2) \
             ORDER BY u.display_name ASC, u.id ASC"
        );
        let units = sqlx::query_as::<_, GuestUnitRow>(&query)
            .bind(wedding_id)
            .bind(ids)
            .fetch_all(pool)
            .await?;
        Self::assemble(pool, units).await
    }

    /// Unit delivery identity first, then any active member identity.
    pub async fn find_unit_id_by_phone(
        pool: &PgPool,
        wedding_id: &str,
        phone_e164: &str,
    ) -> Result<Option<EntityId>, sqlx::Error> {
        let by_unit = sqlx::query_scalar::<_, EntityId>(
            "SELECT u.id FROM guest_units u \
             JOIN guest_identities i ON i.id = u.delivery_identity_id \
             WHERE u.wedding_id = $1 AND u.is_active = TRUE \
               AND i.normalized_phone_e164 = $2 AND i.is_active = TRUE \
             ORDER BY u.display_name ASC, u.id ASC LIMIT 1",
        )
        .bind(wedding_id)
        .bind(phone_e164)
        .fetch_optional(pool)
        .await?;
        if by_unit.is_some() {
            return Ok(by_unit);
        }

        sqlx::query_scalar::<_, EntityId>(
            "SELECT u.id FROM guest_units u \
             JOIN guest_unit_members m ON m.guest_unit_id = u.id AND m.is_active = TRUE \
             JOIN persons p ON p.id = m.person_id AND p.is_active = TRUE \
             JOIN guest_identities i ON i.id = p.identity_id \
             WHERE u.wedding_id = $1 AND u.is_active = TRUE \
               AND i.normalized_phone_e164 = $2 AND i.is_active = TRUE \
             ORDER BY u.display_name ASC, u.id ASC LIMIT 1",
        )
        .bind(wedding_id)
        .bind(phone_e164)
        .fetch_optional(pool)
        .await
    }

    async fn assemble(
        pool: &PgPool,
        units: Vec<GuestUnitRow>,
    ) -> Result<Vec<GuestUnitRecord>, sqlx::Error> {
        if units.is_empty() {
            return Ok(Vec::new());
        }
        let unit_ids: Vec<EntityId> = units.iter().map(|u| u.id.clone()).collect();

        let members = sqlx::query_as::<_, GuestMemberRow>(
            "SELECT m.guest_unit_id, m.is_active AS membership_is_active, \
                    p.id AS person_id, p.full_name, \
                    p.is_active AS person_is_active, p.is_inviteable AS person_is_inviteable, \
                    i.normalized_phone_e164 AS phone, \
                    i.is_active AS identity_is_active, i.is_inviteable AS identity_is_inviteable \
             FROM guest_unit_members m \
             JOIN persons p ON p.id = m.person_id \
             LEFT JOIN guest_identities i ON i.id = p.identity_id \
             WHERE m.guest_unit_id = ANY($1) \
             ORDER BY p.full_name ASC, p.id ASC",
        )
        .bind(&unit_ids)
        .fetch_all(pool)
        .await?;

        let unit_tags = sqlx::query_as::<_, TagLinkRow>(
            "SELECT guest_unit_id AS owner_id, tag_id FROM guest_unit_tags \
             WHERE guest_unit_id = ANY($1) ORDER BY tag_id",
        )
        .bind(&unit_ids)
        .fetch_all(pool)
        .await?;

        let person_ids: Vec<EntityId> = members.iter().map(|m| m.person_id.clone()).collect();
        let person_tags = sqlx::query_as::<_, TagLinkRow>(
            "SELECT person_id AS owner_id, tag_id FROM person_tags \
             WHERE person_id = ANY($1) ORDER BY tag_id",
        )
        .bind(&person_ids)
        .fetch_all(pool)
        .await?;

        let mut unit_tag_map = group_tags(unit_tags);
        let person_tag_map = group_tags(person_tags);

        let mut members_by_unit: HashMap<EntityId, Vec<MemberRecord>> = HashMap::new();
        for row in members {
            let unit_id = row.guest_unit_id.clone();
            let is_active = row.membership_is_active;
            let tags = person_tag_map.get(&row.person_id).cloned().unwrap_or_default();
            members_by_unit.entry(unit_id).or_default().push(MemberRecord {
                is_active,
                person: row.into_person(tags),
            });
        }

        Ok(units
            .into_iter()
            .map(|u| GuestUnitRecord {
                tag_ids: unit_tag_map.remove(&u.id).unwrap_or_default(),
                members: members_by_unit.remove(&u.id).unwrap_or_default(),
                delivery_identity: identity(
                    u.delivery_phone,
                    u.delivery_is_active,
                    u.delivery_is_inviteable,
                ),
                id: u.id,
                display_name: u.display_name,
                side: u.side,
                is_active: u.is_active,
                is_inviteable: u.is_inviteable,
            })
            .collect())
    }
}

fn group_tags(rows: Vec<TagLinkRow>) -> HashMap<EntityId, Vec<EntityId>> {
    let mut map: HashMap<EntityId, Vec<EntityId>> = HashMap::new();
    for row in rows {
        map.entry(row.owner_id).or_default().push(row.tag_id);
    }
    map
}
