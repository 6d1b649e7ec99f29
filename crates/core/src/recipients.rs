//! Fan-out from guest units to deliverable phone targets.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::audience::normalize_id_list;
use crate::guest::GuestUnitRecord;
use crate::status::SourceKind;
use crate::types::EntityId;

/// One contributor to a [`RecipientTarget`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientSource {
    pub guest_unit_id: EntityId,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub person_id: Option<EntityId>,
}

/// A unique phone number and every source that resolved to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientTarget {
    pub phone_e164: String,
    pub sources: Vec<RecipientSource>,
    pub is_inviteable: bool,
}

impl RecipientTarget {
    /// The unit the persisted message is linked to.
    pub fn primary_guest_unit_id(&self) -> Option<&str> {
        self.sources.first().map(|s| s.guest_unit_id.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecipientResolution {
    pub recipient_count: usize,
    pub total_candidate_guest_units: usize,
    pub resolved_guest_units: usize,
    pub skipped_guest_unit_ids: Vec<EntityId>,
    pub recipients: Vec<RecipientTarget>,
}

/// Expand `requested` unit ids into recipient targets.
///
/// `units` is whatever the directory returned for the requested ids; ids
/// missing from it (or inactive) are reported as skipped. Targets come out
/// in first-seen phone order.
pub fn resolve_recipients(requested: &[String], units: &[GuestUnitRecord]) -> RecipientResolution {
    let requested = normalize_id_list(requested);
    if requested.is_empty() {
        return RecipientResolution::default();
    }

    let by_id: HashMap<&str, &GuestUnitRecord> = units
        .iter()
        .filter(|u| u.is_active)
        .map(|u| (u.id.as_str(), u))
        .collect();

    let mut targets = TargetSet::default();

    let mut skipped = Vec::new();
    for id in &requested {
        let Some(unit) = by_id.get(id.as_str()) else {
            skipped.push(id.clone());
            continue;
        };

        if let Some(phone) = unit.deliverable_unit_phone() {
            targets.add(
                phone,
                RecipientSource {
                    guest_unit_id: unit.id.clone(),
                    kind: SourceKind::Unit,
                    person_id: None,
                },
                unit.is_inviteable,
            );
            continue;
        }

        for member in unit.active_members() {
            let person = &member.person;
            if !person.is_active || !person.is_inviteable {
                continue;
            }
            let Some(identity) = person.identity.as_ref().filter(|i| i.is_deliverable()) else {
                continue;
            };
            targets.add(
                &identity.phone_e164,
                RecipientSource {
                    guest_unit_id: unit.id.clone(),
                    kind: SourceKind::Person,
                    person_id: Some(person.id.clone()),
                },
                person.is_inviteable && identity.is_inviteable,
            );
        }
    }

    RecipientResolution {
        recipient_count: targets.targets.len(),
        total_candidate_guest_units: requested.len(),
        resolved_guest_units: by_id.len(),
        skipped_guest_unit_ids: skipped,
        recipients: targets.targets,
    }
}

/// Targets keyed by phone in first-seen order.
#[derive(Default)]
struct TargetSet {
    targets: Vec<RecipientTarget>,
    index_by_phone: HashMap<String, usize>,
}

impl TargetSet {
    /// A target is inviteable only while every source behind it is.
    fn add(&mut self, phone: &str, source: RecipientSource, inviteable: bool) {
        match self.index_by_phone.get(phone) {
            Some(&idx) => {
                let target = &mut self.targets[idx];
                target.sources.push(source);
                target.is_inviteable &= inviteable;
            }
            None => {
                self.index_by_phone.insert(phone.to_string(), self.targets.len());
                self.targets.push(RecipientTarget {
                    phone_e164: phone.to_string(),
                    sources: vec![source],
                    is_inviteable: inviteable,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guest::fixtures::{member, person, unit};
    use crate::status::GuestSide;

    #[test]
    fn unit_phone_takes_precedence_over_members() {
        let mut u = unit("u1", "Iyer", GuestSide::Bride, Some("+919800000001"));
        u.members.push(member(person("p1", "Kavya", Some("+919800000099"))));

        let resolution = resolve_recipients(&["u1".into()], &[u]);

        assert_eq!(resolution.recipient_count, 1);
        let target = &resolution.recipients[0];
        assert_eq!(target.phone_e164, "+919800000001");
        assert_eq!(target.sources[0].kind, SourceKind::Unit);
        assert_eq!(target.sources[0].person_id, None);
    }

    #[test]
    fn falls_back_to_inviteable_members() {
        let mut u = unit("u1", "Menon", GuestSide::Groom, None);
        u.members.push(member(person("p1", "Ravi", Some("+919800000011"))));
        let mut blocked = person("p2", "Sita", Some("+919800000012"));
        blocked.is_inviteable = false;
        u.members.push(member(blocked));
        u.members.push(member(person("p3", "Tara", None)));

        let resolution = resolve_recipients(&["u1".into()], &[u]);

        assert_eq!(resolution.recipient_count, 1);
        assert_eq!(resolution.recipients[0].phone_e164, "+919800000011");
        assert_eq!(resolution.recipients[0].sources[0].person_id.as_deref(), Some("p1"));
    }

    #[test]
    fn shared_phone_merges_all_sources_into_one_target() {
        let a = unit("u1", "Parents", GuestSide::Bride, Some("+919800000001"));
        let mut b = unit("u2", "Cousins", GuestSide::Bride, None);
        b.members.push(member(person("p9", "Uncle", Some("+919800000001"))));
        let c = unit("u3", "Friends", GuestSide::Bride, Some("+919800000003"));

        let resolution = resolve_recipients(&["u1".into(), "u2".into(), "u3".into()], &[a, b, c]);

        assert_eq!(resolution.recipient_count, 2);
        let shared = &resolution.recipients[0];
        assert_eq!(shared.sources.len(), 2);
        assert_eq!(shared.primary_guest_unit_id(), Some("u1"));
        assert_eq!(shared.sources[1].guest_unit_id, "u2");
        assert_eq!(resolution.recipients[1].phone_e164, "+919800000003");
    }

    #[test]
    fn unknown_and_inactive_units_are_skipped() {
        let mut inactive = unit("u2", "Gone", GuestSide::Neutral, Some("+919800000002"));
        inactive.is_active = false;
        let live = unit("u1", "Here", GuestSide::Neutral, Some("+919800000001"));

        let resolution = resolve_recipients(
            &[" u1 ".into(), "u2".into(), "u3".into(), "u1".into()],
            &[live, inactive],
        );

        assert_eq!(resolution.total_candidate_guest_units, 3);
        assert_eq!(resolution.resolved_guest_units, 1);
        assert_eq!(resolution.skipped_guest_unit_ids, vec!["u2", "u3"]);
    }

    #[test]
    fn one_blocked_source_marks_the_shared_target_uninviteable() {
        let source = |unit: &str| RecipientSource {
            guest_unit_id: unit.into(),
            kind: SourceKind::Unit,
            person_id: None,
        };
        let mut set = TargetSet::default();
        set.add("+919800000001", source("u1"), true);
        set.add("+919800000002", source("u2"), true);
        set.add("+919800000001", source("u3"), false);

        assert_eq!(set.targets.len(), 2);
        assert!(!set.targets[0].is_inviteable);
        assert_eq!(set.targets[0].sources.len(), 2);
        assert!(set.targets[1].is_inviteable);
    }

    #[test]
    fn resolved_targets_carry_record_inviteability() {
        let household = unit("u1", "Iyer", GuestSide::Bride, Some("+919800000001"));
        let mut fallback = unit("u2", "Menon", GuestSide::Groom, None);
        fallback.members.push(member(person("p1", "Ravi", Some("+919800000011"))));

        let resolution = resolve_recipients(&["u1".into(), "u2".into()], &[household, fallback]);

        assert_eq!(resolution.recipient_count, 2);
        assert!(resolution.recipients.iter().all(|t| t.is_inviteable));
    }

    #[test]
    fn empty_request_resolves_nothing() {
        let resolution = resolve_recipients(&["  ".into()], &[]);
        assert_eq!(resolution, RecipientResolution::default());
    }
}
