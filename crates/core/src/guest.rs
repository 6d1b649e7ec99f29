//! Read-only view of the guest data owned by guest management.
//!
//! The directory collaborator hands the engine fully assembled
//! [`GuestUnitRecord`]s; audience filtering and recipient fan-out only ever
//! read them.

use serde::{Deserialize, Serialize};

use crate::status::GuestSide;
use crate::types::EntityId;

/// A phone identity attached to a guest unit or a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub phone_e164: String,
    pub is_active: bool,
    pub is_inviteable: bool,
}

impl IdentityRecord {
    /// Whether this identity may be messaged at all.
    pub fn is_deliverable(&self) -> bool {
        self.is_active && self.is_inviteable && !self.phone_e164.trim().is_empty()
    }
}

/// An individual guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub id: EntityId,
    pub full_name: String,
    pub is_active: bool,
    pub is_inviteable: bool,
    pub identity: Option<IdentityRecord>,
    pub tag_ids: Vec<EntityId>,
}

/// Membership of a person in a guest unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    /// Whether the membership itself is active.
    pub is_active: bool,
    pub person: PersonRecord,
}

/// A deliverable household or group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestUnitRecord {
    pub id: EntityId,
    pub display_name: String,
    pub side: GuestSide,
    pub is_active: bool,
    pub is_inviteable: bool,
    pub delivery_identity: Option<IdentityRecord>,
    /// Tags attached directly to the unit (member tags are not included).
    pub tag_ids: Vec<EntityId>,
    pub members: Vec<MemberRecord>,
}

impl GuestUnitRecord {
    /// Members whose membership is active.
    pub fn active_members(&self) -> impl Iterator<Item = &MemberRecord> {
        self.members.iter().filter(|m| m.is_active)
    }

    /// Person ids of every active member.
    pub fn active_person_ids(&self) -> Vec<EntityId> {
        self.active_members().map(|m| m.person.id.clone()).collect()
    }

    /// The unit-level delivery phone, if the unit and its identity are both
    /// inviteable and active.
    pub fn deliverable_unit_phone(&self) -> Option<&str> {
        if !self.is_inviteable {
            return None;
        }
        self.delivery_identity
            .as_ref()
            .filter(|identity| identity.is_deliverable())
            .map(|identity| identity.phone_e164.as_str())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn unit_phone_requires_inviteable_unit_and_identity() {
        let mut u = unit("u1", "Sharma Family", GuestSide::Bride, Some("+919800000001"));
        assert_eq!(u.deliverable_unit_phone(), Some("+919800000001"));

        u.is_inviteable = false;
        assert_eq!(u.deliverable_unit_phone(), None);

        u.is_inviteable = true;
        if let Some(identity) = u.delivery_identity.as_mut() {
            identity.is_inviteable = false;
        }
        assert_eq!(u.deliverable_unit_phone(), None);
    }

    #[test]
    fn inactive_memberships_are_not_listed() {
        let mut u = unit("u1", "Rao", GuestSide::Groom, None);
        u.members.push(member(person("p1", "Anil", None)));
        let mut gone = member(person("p2", "Bina", None));
        gone.is_active = false;
        u.members.push(gone);

        assert_eq!(u.active_person_ids(), vec!["p1".to_string()]);
    }
}
