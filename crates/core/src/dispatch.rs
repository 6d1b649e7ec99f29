//! Run-level bookkeeping for one dispatch call.

use serde::{Deserialize, Serialize};

use crate::status::{RejectionReason, RunStatus};

/// Reason recorded on a run in which nothing was delivered to the provider.
pub const RUN_FAILURE_REASON: &str = "No recipient dispatches succeeded.";

/// How many blocked recipients a precheck echoes back.
pub const PRECHECK_BLOCKED_SAMPLE_LIMIT: usize = 25;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub total: usize,
    pub eligible: usize,
    pub blocked: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Per-recipient outcome fed into [`RunCounters::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientOutcome {
    Blocked(RejectionReason),
    Sent,
    ProviderFailed,
}

impl RunCounters {
    pub fn record(&mut self, outcome: RecipientOutcome) {
        match outcome {
            RecipientOutcome::Blocked(_) => self.blocked += 1,
            RecipientOutcome::Sent => {
                self.eligible += 1;
                self.sent += 1;
            }
            RecipientOutcome::ProviderFailed => {
                self.eligible += 1;
                self.failed += 1;
            }
        }
    }

    pub fn status(&self) -> RunStatus {
        derive_run_status(self)
    }

    /// `Some` only for a failed run.
    pub fn failure_reason(&self) -> Option<&'static str> {
        (self.status() == RunStatus::Failed && self.failed > 0).then_some(RUN_FAILURE_REASON)
    }
}

pub fn derive_run_status(counters: &RunCounters) -> RunStatus {
    if counters.failed > 0 && counters.sent == 0 {
        RunStatus::Failed
    } else if counters.failed > 0 || (counters.blocked > 0 && counters.eligible > 0) {
        RunStatus::Partial
    } else {
        RunStatus::Completed
    }
}
