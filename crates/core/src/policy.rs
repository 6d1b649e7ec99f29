//! Send-eligibility policy.
//!
//! Checks run in a fixed order and the first failure wins, so a message
//! always carries exactly one rejection reason.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::phone::normalize_e164;
use crate::status::RejectionReason;

pub const DNM_DEFAULT_DETAIL: &str = "Recipient is blocked by Do-Not-Message policy.";

/// An active do-not-message entry for one phone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoNotMessageEntry {
    pub phone_e164: String,
    pub reason_note: Option<String>,
}

/// Phone-keyed view over the active do-not-message list.
#[derive(Debug, Clone, Default)]
pub struct DoNotMessageLookup {
    entries: HashMap<String, DoNotMessageEntry>,
}

impl DoNotMessageLookup {
    pub fn new(entries: impl IntoIterator<Item = DoNotMessageEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| {
                let key = normalize_e164(&entry.phone_e164).unwrap_or_else(|| entry.phone_e164.clone());
                (key, entry)
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, phone: &str) -> Option<&DoNotMessageEntry> {
        self.entries.get(phone).or_else(|| {
            normalize_e164(phone).and_then(|normalized| self.entries.get(&normalized))
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EligibilityInput<'a> {
    pub phone_e164: Option<&'a str>,
    pub source_count: usize,
    pub is_inviteable: bool,
    pub do_not_message: Option<&'a DoNotMessageEntry>,
    pub provider_configured: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Allowed,
    Rejected {
        reason: RejectionReason,
        detail: String,
    },
}

impl Eligibility {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    fn reject(reason: RejectionReason, detail: impl Into<String>) -> Self {
        Self::Rejected {
            reason,
            detail: detail.into(),
        }
    }
}

pub fn evaluate_send_eligibility(input: &EligibilityInput<'_>) -> Eligibility {
    if !input.provider_configured {
        return Eligibility::reject(
            RejectionReason::ProviderConfigurationMissing,
            "Provider configuration is missing required WhatsApp credentials.",
        );
    }

    if input.phone_e164.map_or(true, |p| p.trim().is_empty()) {
        return Eligibility::reject(
            RejectionReason::MissingPhone,
            "Recipient has no normalized E.164 phone number.",
        );
    }

    if input.source_count == 0 {
        return Eligibility::reject(
            RejectionReason::MissingSource,
            "Recipient could not be mapped to a guest source.",
        );
    }

    if !input.is_inviteable {
        return Eligibility::reject(
            RejectionReason::RecipientNotInviteable,
            "Recipient is not inviteable.",
        );
    }

    if let Some(entry) = input.do_not_message {
        let detail = entry
            .reason_note
            .as_deref()
            .filter(|note| !note.trim().is_empty())
            .unwrap_or(DNM_DEFAULT_DETAIL);
        return Eligibility::reject(RejectionReason::DnmBlocked, detail);
    }

    Eligibility::Allowed
}
