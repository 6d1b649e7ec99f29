//! Audience filtering: side, tags and free-text search over the active
//! guest units of a wedding, followed by explicit include/exclude overrides.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::guest::GuestUnitRecord;
use crate::status::GuestSide;
use crate::types::EntityId;

/// Raw filter as supplied by a caller. Every field is optional and
/// malformed values normalize to "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudienceFilter {
    pub side: Option<String>,
    pub tag_ids: Vec<String>,
    pub search: Option<String>,
    pub include_guest_unit_ids: Vec<String>,
    pub exclude_guest_unit_ids: Vec<String>,
}

/// The filter after trimming, lower-casing and de-duplication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedAudienceFilter {
    pub side: Option<GuestSide>,
    pub tag_ids: Vec<EntityId>,
    pub search: Option<String>,
    pub include_guest_unit_ids: Vec<EntityId>,
    pub exclude_guest_unit_ids: Vec<EntityId>,
}

impl AudienceFilter {
    pub fn normalize(&self) -> NormalizedAudienceFilter {
        NormalizedAudienceFilter {
            side: self
                .side
                .as_deref()
                .and_then(|s| GuestSide::from_str_db(&s.trim().to_lowercase()).ok()),
            tag_ids: normalize_id_list(&self.tag_ids),
            search: self
                .search
                .as_deref()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty()),
            include_guest_unit_ids: normalize_id_list(&self.include_guest_unit_ids),
            exclude_guest_unit_ids: normalize_id_list(&self.exclude_guest_unit_ids),
        }
    }
}

/// Trim, drop empties and de-duplicate, keeping first-seen order.
pub fn normalize_id_list(values: &[String]) -> Vec<EntityId> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(v.to_string()))
        .map(str::to_string)
        .collect()
}

/// The searchable projection of one active guest unit.
#[derive(Debug, Clone)]
pub struct AudienceCandidate {
    pub id: EntityId,
    pub side: GuestSide,
    pub display_name: String,
    pub delivery_phone: Option<String>,
    pub member_names: Vec<String>,
    pub member_phones: Vec<String>,
    /// Own tags plus tags inherited from active members.
    pub tag_ids: HashSet<EntityId>,
}

impl AudienceCandidate {
    pub fn from_unit(unit: &GuestUnitRecord) -> Self {
        let mut tag_ids: HashSet<EntityId> = unit.tag_ids.iter().cloned().collect();
        for member in unit.active_members() {
            tag_ids.extend(member.person.tag_ids.iter().cloned());
        }

        Self {
            id: unit.id.clone(),
            side: unit.side,
            display_name: unit.display_name.clone(),
            delivery_phone: unit
                .delivery_identity
                .as_ref()
                .map(|identity| identity.phone_e164.clone()),
            member_names: unit
                .active_members()
                .filter(|m| m.person.is_active)
                .map(|m| m.person.full_name.clone())
                .collect(),
            member_phones: unit
                .active_members()
                .filter_map(|m| m.person.identity.as_ref())
                .map(|identity| identity.phone_e164.clone())
                .filter(|phone| !phone.is_empty())
                .collect(),
            tag_ids,
        }
    }

    fn search_blob(&self) -> String {
        let mut pieces: Vec<&str> = vec![
            &self.display_name,
            self.side.as_str(),
            self.delivery_phone.as_deref().unwrap_or(""),
        ];
        pieces.extend(self.member_names.iter().map(String::as_str));
        pieces.extend(self.member_phones.iter().map(String::as_str));
        pieces.join(" ").to_lowercase()
    }

    fn has_all_tags(&self, required: &[EntityId]) -> bool {
        required.iter().all(|tag| self.tag_ids.contains(tag))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudienceCounts {
    pub after_side: usize,
    pub after_tags: usize,
    pub after_search: usize,
    #[serde(rename = "final")]
    pub final_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveFilters {
    pub side: bool,
    pub tags: bool,
    pub search: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideCounts {
    pub included: usize,
    pub excluded: usize,
}

/// Stage-by-stage counts of one audience resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudienceTrace {
    pub total_active_units: usize,
    pub counts: AudienceCounts,
    pub active_filters: ActiveFilters,
    pub normalized: NormalizedAudienceFilter,
    pub overrides: OverrideCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudienceSelection {
    pub guest_unit_ids: Vec<EntityId>,
    pub trace: AudienceTrace,
}

/// Apply `filter` to `candidates`.
///
/// `candidates` must already be the active unit pool in its stable order;
/// the selection is returned in that same order regardless of the order of
/// the include list.
pub fn select_audience(
    candidates: &[AudienceCandidate],
    filter: &NormalizedAudienceFilter,
) -> AudienceSelection {
    let after_side: Vec<&AudienceCandidate> = candidates
        .iter()
        .filter(|c| filter.side.map_or(true, |side| c.side == side))
        .collect();

    let after_tags: Vec<&AudienceCandidate> = after_side
        .iter()
        .copied()
        .filter(|c| c.has_all_tags(&filter.tag_ids))
        .collect();

    let after_search: Vec<&AudienceCandidate> = match filter.search.as_deref() {
        Some(needle) => after_tags
            .iter()
            .copied()
            .filter(|c| c.search_blob().contains(needle))
            .collect(),
        None => after_tags.clone(),
    };

    let pool: HashSet<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
    let mut selected: HashSet<&str> = after_search.iter().map(|c| c.id.as_str()).collect();

    let mut included = 0;
    for id in &filter.include_guest_unit_ids {
        if pool.contains(id.as_str()) && selected.insert(id.as_str()) {
            included += 1;
        }
    }

    let mut excluded = 0;
    for id in &filter.exclude_guest_unit_ids {
        if selected.remove(id.as_str()) {
            excluded += 1;
        }
    }

    let guest_unit_ids: Vec<EntityId> = candidates
        .iter()
        .filter(|c| selected.contains(c.id.as_str()))
        .map(|c| c.id.clone())
        .collect();

    AudienceSelection {
        trace: AudienceTrace {
            total_active_units: candidates.len(),
            counts: AudienceCounts {
                after_side: after_side.len(),
                after_tags: after_tags.len(),
                after_search: after_search.len(),
                final_count: guest_unit_ids.len(),
            },
            active_filters: ActiveFilters {
                side: filter.side.is_some(),
                tags: !filter.tag_ids.is_empty(),
                search: filter.search.is_some(),
            },
            normalized: filter.clone(),
            overrides: OverrideCounts { included, excluded },
        },
        guest_unit_ids,
    }
}
