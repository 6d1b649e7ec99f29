//! Audience and recipient resolution over the guest directory.

use std::sync::Arc;

use vows_core::audience::{normalize_id_list, select_audience, AudienceCandidate, AudienceFilter, AudienceSelection};
use vows_core::recipients::{resolve_recipients, RecipientResolution};
use vows_db::stores::GuestDirectory;

use crate::error::EngineResult;

#[derive(Clone)]
pub struct AudienceResolver {
    guests: Arc<dyn GuestDirectory>,
}

impl AudienceResolver {
    pub fn new(guests: Arc<dyn GuestDirectory>) -> Self {
        Self { guests }
    }

    /// Select the guest units of `wedding_id` matching `filter`.
    pub async fn resolve_audience(
        &self,
        wedding_id: &str,
        filter: &AudienceFilter,
    ) -> EngineResult<AudienceSelection> {
        let units = self.guests.list_active_units(wedding_id).await?;
        let candidates: Vec<AudienceCandidate> = units.iter().map(AudienceCandidate::from_unit).collect();
        let selection = select_audience(&candidates, &filter.normalize());

        tracing::debug!(
            wedding_id,
            total = selection.trace.total_active_units,
            after_side = selection.trace.counts.after_side,
            after_tags = selection.trace.counts.after_tags,
            after_search = selection.trace.counts.after_search,
            selected = selection.guest_unit_ids.len(),
            "Audience resolved"
        );
        Ok(selection)
    }

    /// Expand guest unit ids into deduplicated phone targets.
    pub async fn resolve_recipients(
        &self,
        wedding_id: &str,
        guest_unit_ids: &[String],
    ) -> EngineResult<RecipientResolution> {
        let ids = normalize_id_list(guest_unit_ids);
        if ids.is_empty() {
            return Ok(RecipientResolution::default());
        }
        let units = self.guests.find_active_units(wedding_id, &ids).await?;
        let resolution = resolve_recipients(&ids, &units);

        if !resolution.skipped_guest_unit_ids.is_empty() {
            tracing::debug!(
                wedding_id,
                skipped = resolution.skipped_guest_unit_ids.len(),
                "Requested guest units not found active"
            );
        }
        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use vows_core::status::{GuestSide, SourceKind};

    use super::*;
    use crate::test_support::{member, person, unit, Harness};

    #[tokio::test]
    async fn overrides_and_filters_come_back_in_directory_order() {
        let h = Harness::new();
        h.store.seed_unit("w1", unit("u-b", "Bose", GuestSide::Bride, Some("+919800000001"))).await;
        h.store.seed_unit("w1", unit("u-a", "Arora", GuestSide::Groom, Some("+919800000002"))).await;
        h.store.seed_unit("w1", unit("u-c", "Chopra", GuestSide::Bride, None)).await;

        let filter = AudienceFilter {
            side: Some("bride".into()),
            include_guest_unit_ids: vec!["u-a".into(), "missing".into()],
            exclude_guest_unit_ids: vec!["u-c".into()],
            ..AudienceFilter::default()
        };
        let selection = h.engine.audience.resolve_audience("w1", &filter).await.unwrap();

        assert_eq!(selection.guest_unit_ids, vec!["u-a", "u-b"]);
        assert_eq!(selection.trace.counts.after_side, 2);
        assert_eq!(selection.trace.overrides.included, 1);
        assert_eq!(selection.trace.overrides.excluded, 1);
    }

    #[tokio::test]
    async fn shared_phone_merges_sources_across_units() {
        let h = Harness::new();
        let mut household = unit("u1", "Kapoor", GuestSide::Neutral, None);
        household.members.push(member(person("p1", "Ravi", Some("+919800000009"))));
        h.store.seed_unit("w1", household).await;
        let mut cousin = unit("u2", "Kapoor Cousins", GuestSide::Neutral, None);
        cousin.members.push(member(person("p2", "Ravi K", Some("+919800000009"))));
        h.store.seed_unit("w1", cousin).await;

        let resolution = h
            .engine
            .audience
            .resolve_recipients("w1", &["u1".into(), " u2 ".into(), "gone".into()])
            .await
            .unwrap();

        assert_eq!(resolution.recipient_count, 1);
        assert_eq!(resolution.skipped_guest_unit_ids, vec!["gone"]);
        let sources = &resolution.recipients[0].sources;
        assert_eq!(sources.len(), 2);
        assert!(sources.iter().all(|s| s.kind == SourceKind::Person));
    }
}
