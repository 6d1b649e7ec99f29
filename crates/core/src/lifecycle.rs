//! Monotonic delivery-status transitions for one invite message.
//!
//! `sent` < `delivered` < `read`, with `failed` absorbing. Evaluation is
//! pure; the engine applies an accepted decision with a compare-and-set on
//! the stored status.

use serde::Serialize;

use crate::status::LifecycleStatus;
use crate::types::Timestamp;

pub const REASON_DUPLICATE: &str = "Duplicate status received.";
pub const REASON_FAILED_TERMINAL: &str = "Failed is terminal and cannot be regressed.";
pub const REASON_FAILED_ACCEPTED: &str = "Failed transition accepted as terminal.";
pub const REASON_FORWARD: &str = "Forward transition accepted.";
pub const REASON_OUT_OF_ORDER: &str =
    "Out-of-order transition rejected to preserve monotonic state.";
pub const REASON_CONTENDED: &str = "Transition abandoned after repeated concurrent updates.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionDecision {
    pub apply: bool,
    pub is_duplicate: bool,
    pub reason: &'static str,
}

impl TransitionDecision {
    const fn accept(reason: &'static str) -> Self {
        Self {
            apply: true,
            is_duplicate: false,
            reason,
        }
    }

    const fn reject(reason: &'static str) -> Self {
        Self {
            apply: false,
            is_duplicate: true,
            reason,
        }
    }

    /// Not applied because concurrent writers kept winning the race.
    pub const fn contended() -> Self {
        Self {
            apply: false,
            is_duplicate: false,
            reason: REASON_CONTENDED,
        }
    }
}

impl LifecycleStatus {
    /// Position in the forward progression; `None` for `failed`.
    pub fn rank(self) -> Option<u8> {
        match self {
            Self::Sent => Some(1),
            Self::Delivered => Some(2),
            Self::Read => Some(3),
            Self::Failed => None,
        }
    }
}

pub fn evaluate_transition(from: LifecycleStatus, to: LifecycleStatus) -> TransitionDecision {
    if from == to {
        return TransitionDecision::reject(REASON_DUPLICATE);
    }
    if from == LifecycleStatus::Failed {
        return TransitionDecision::reject(REASON_FAILED_TERMINAL);
    }
    if to == LifecycleStatus::Failed {
        return TransitionDecision::accept(REASON_FAILED_ACCEPTED);
    }

    match (from.rank(), to.rank()) {
        (Some(from_rank), Some(to_rank)) if to_rank > from_rank => {
            TransitionDecision::accept(REASON_FORWARD)
        }
        _ => TransitionDecision::reject(REASON_OUT_OF_ORDER),
    }
}

/// Field updates for an accepted transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPatch {
    pub lifecycle_status: LifecycleStatus,
    pub last_status_at: Timestamp,
    pub delivered_at: Option<Timestamp>,
    pub read_at: Option<Timestamp>,
    pub failed_at: Option<Timestamp>,
}

/// Build the patch for moving to `to`, stamped with the provider event time
/// or `now` when the provider did not supply one.
pub fn status_patch(to: LifecycleStatus, event_at: Option<Timestamp>, now: Timestamp) -> StatusPatch {
    let at = event_at.unwrap_or(now);
    StatusPatch {
        lifecycle_status: to,
        last_status_at: at,
        delivered_at: (to == LifecycleStatus::Delivered).then_some(at),
        read_at: (to == LifecycleStatus::Read).then_some(at),
        failed_at: (to == LifecycleStatus::Failed).then_some(at),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use LifecycleStatus::*;

    #[test]
    fn forward_progression_is_accepted() {
        assert_eq!(evaluate_transition(Sent, Delivered), TransitionDecision::accept(REASON_FORWARD));
        assert!(evaluate_transition(Delivered, Read).apply);
        assert!(evaluate_transition(Sent, Read).apply);
    }

    #[test]
    fn regression_is_rejected_as_duplicate() {
        let decision = evaluate_transition(Read, Delivered);
        assert!(!decision.apply);
        assert!(decision.is_duplicate);
        assert_eq!(decision.reason, REASON_OUT_OF_ORDER);
    }

    #[test]
    fn failed_is_absorbing() {
        for to in LifecycleStatus::ALL {
            let decision = evaluate_transition(Failed, *to);
            assert!(!decision.apply);
            assert!(decision.is_duplicate);
        }
        assert_eq!(evaluate_transition(Failed, Read).reason, REASON_FAILED_TERMINAL);
    }

    #[test]
    fn any_live_status_may_fail() {
        for from in [Sent, Delivered, Read] {
            assert_eq!(
                evaluate_transition(from, Failed),
                TransitionDecision::accept(REASON_FAILED_ACCEPTED)
            );
        }
    }

    #[test]
    fn same_status_is_duplicate() {
        assert_eq!(evaluate_transition(Sent, Sent).reason, REASON_DUPLICATE);
    }

    #[test]
    fn patch_stamps_only_the_reached_status() {
        let event_at = Utc.with_ymd_and_hms(2026, 2, 1, 10, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 10, 5, 0).unwrap();

        let patch = status_patch(Read, Some(event_at), now);
        assert_eq!(patch.read_at, Some(event_at));
        assert_eq!(patch.delivered_at, None);
        assert_eq!(patch.last_status_at, event_at);

        let patch = status_patch(Failed, None, now);
        assert_eq!(patch.failed_at, Some(now));
        assert_eq!(patch.last_status_at, now);
    }
}
