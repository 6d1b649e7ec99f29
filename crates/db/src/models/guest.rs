//! Flat rows read from the guest directory tables, assembled into
//! [`GuestUnitRecord`]s by the repository.

use sqlx::FromRow;
use vows_core::guest::{IdentityRecord, PersonRecord};
use vows_core::status::GuestSide;
use vows_core::types::EntityId;

#[derive(Debug, Clone, FromRow)]
pub struct GuestUnitRow {
    pub id: EntityId,
    pub display_name: String,
    pub side: GuestSide,
    pub is_active: bool,
    pub is_inviteable: bool,
    pub delivery_phone: Option<String>,
    pub delivery_is_active: Option<bool>,
    pub delivery_is_inviteable: Option<bool>,
}

#[derive(Debug, Clone, FromRow)]
pub struct GuestMemberRow {
    pub guest_unit_id: EntityId,
    pub membership_is_active: bool,
    pub person_id: EntityId,
    pub full_name: String,
    pub person_is_active: bool,
    pub person_is_inviteable: bool,
    pub phone: Option<String>,
    pub identity_is_active: Option<bool>,
    pub identity_is_inviteable: Option<bool>,
}

/// A tag link; `owner_id` is a unit id or a person id depending on the query.
#[derive(Debug, Clone, FromRow)]
pub struct TagLinkRow {
    pub owner_id: EntityId,
    pub tag_id: EntityId,
}

pub(crate) fn identity(
    phone: Option<String>,
    is_active: Option<bool>,
    is_inviteable: Option<bool>,
) -> Option<IdentityRecord> {
    phone.map(|phone_e164| IdentityRecord {
        phone_e164,
        is_active: is_active.unwrap_or(false),
        is_inviteable: is_inviteable.unwrap_or(false),
    })
}

impl GuestMemberRow {
    pub(crate) fn into_person(self, tag_ids: Vec<EntityId>) -> PersonRecord {
        PersonRecord {
            id: self.person_id,
            full_name: self.full_name,
            is_active: self.person_is_active,
            is_inviteable: self.person_is_inviteable,
            identity: identity(self.phone, self.identity_is_active, self.identity_is_inviteable),
            tag_ids,
        }
    }
}
