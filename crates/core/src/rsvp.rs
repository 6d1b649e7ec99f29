//! The three-step reply-driven RSVP conversation.
//!
//! Step 1 takes an overall accept/decline, step 2 takes per-person
//! `personId=choice` edits, step 3 waits for a confirmation token. The
//! engine owns sessions and persistence; this module only decides the next
//! step and the text sent back.

use serde::{Deserialize, Serialize};

use crate::status::RsvpChoice;

const ACCEPT_TOKENS: &[&str] = &["accept", "accepted", "yes", "going", "a"];
const DECLINE_TOKENS: &[&str] = &["decline", "declined", "no", "not-going", "d"];
const CONFIRM_TOKENS: &[&str] = &["confirm", "confirmed", "done", "submit", "finish"];

pub const RETRY_INITIAL_CHOICE: &str = "Reply with accept or decline to begin RSVP.";
pub const RETRY_ATTENDANCE: &str =
    "Share per-person updates in format personId=accept,personId=decline or reply confirm.";
pub const RETRY_CONFIRMATION: &str = "Reply confirm to finalize RSVP.";

pub const PROMPT_ATTENDANCE: &str = "Share person responses as personId=accept,personId=decline.";
pub const PROMPT_CONFIRMATION: &str = "Review your updates and reply confirm to finalize RSVP.";

pub const NOT_INVITEE_MESSAGE: &str =
    "We could not match this number to an invite. Please use your invite WhatsApp thread.";

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

pub fn parse_choice(text: &str) -> Option<RsvpChoice> {
    let token = normalize(text);
    if ACCEPT_TOKENS.contains(&token.as_str()) {
        Some(RsvpChoice::Accept)
    } else if DECLINE_TOKENS.contains(&token.as_str()) {
        Some(RsvpChoice::Decline)
    } else {
        None
    }
}

pub fn is_confirmation_token(text: &str) -> bool {
    CONFIRM_TOKENS.contains(&normalize(text).as_str())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEdit {
    pub person_id: String,
    pub response: RsvpChoice,
}

/// Parse `p1=accept, p2=no` style input. Malformed entries are skipped.
pub fn parse_attendance_edits(text: &str) -> Vec<AttendanceEdit> {
    text.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let (person_id, response) = entry.split_once('=')?;
            let person_id = person_id.trim();
            if person_id.is_empty() {
                return None;
            }
            Some(AttendanceEdit {
                person_id: person_id.to_string(),
                response: parse_choice(response)?,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Step machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FlowStep {
    InitialChoice,
    AttendanceDetails,
    Confirmation,
}

impl FlowStep {
    pub fn index(self) -> i16 {
        match self {
            Self::InitialChoice => 1,
            Self::AttendanceDetails => 2,
            Self::Confirmation => 3,
        }
    }

    /// Clamp a stored step index into range.
    pub fn from_index(index: i16) -> Self {
        match index {
            i16::MIN..=1 => Self::InitialChoice,
            2 => Self::AttendanceDetails,
            _ => Self::Confirmation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowState {
    pub step: FlowStep,
    pub is_completed: bool,
    pub final_response: Option<RsvpChoice>,
}

impl FlowState {
    pub fn initial() -> Self {
        Self {
            step: FlowStep::InitialChoice,
            is_completed: false,
            final_response: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NextAction {
    AskForAttendanceDetails,
    AskForConfirmation,
    ShowFinalConfirmation,
    InvalidInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowOutcome {
    pub step: FlowStep,
    pub is_completed: bool,
    pub final_response: Option<RsvpChoice>,
    pub is_duplicate: bool,
    pub next_action: NextAction,
    /// Retry guidance, present only for [`NextAction::InvalidInput`].
    pub error_message: Option<&'static str>,
}

impl FlowOutcome {
    fn progressed(state: &FlowState, step: FlowStep, next_action: NextAction) -> Self {
        Self {
            step,
            is_completed: false,
            final_response: state.final_response,
            is_duplicate: false,
            next_action,
            error_message: None,
        }
    }

    fn retry(state: &FlowState, guidance: &'static str) -> Self {
        Self {
            step: state.step,
            is_completed: false,
            final_response: state.final_response,
            is_duplicate: false,
            next_action: NextAction::InvalidInput,
            error_message: Some(guidance),
        }
    }
}

/// Advance `state` by one inbound message.
///
/// `applied_edits` is the number of attendance edits the caller accepted
/// for this message (edits naming people outside the unit do not count).
pub fn advance(state: &FlowState, text: &str, applied_edits: usize) -> FlowOutcome {
    if state.is_completed {
        return FlowOutcome {
            step: FlowStep::Confirmation,
            is_completed: true,
            final_response: state.final_response,
            is_duplicate: true,
            next_action: NextAction::ShowFinalConfirmation,
            error_message: None,
        };
    }

    match state.step {
        FlowStep::InitialChoice => match parse_choice(text) {
            Some(choice) => FlowOutcome {
                final_response: Some(choice),
                ..FlowOutcome::progressed(
                    state,
                    FlowStep::AttendanceDetails,
                    NextAction::AskForAttendanceDetails,
                )
            },
            None => FlowOutcome::retry(state, RETRY_INITIAL_CHOICE),
        },
        FlowStep::AttendanceDetails => {
            if applied_edits > 0 || is_confirmation_token(text) {
                FlowOutcome::progressed(state, FlowStep::Confirmation, NextAction::AskForConfirmation)
            } else {
                FlowOutcome::retry(state, RETRY_ATTENDANCE)
            }
        }
        FlowStep::Confirmation => {
            if is_confirmation_token(text) {
                FlowOutcome {
                    is_completed: true,
                    ..FlowOutcome::progressed(
                        state,
                        FlowStep::Confirmation,
                        NextAction::ShowFinalConfirmation,
                    )
                }
            } else {
                FlowOutcome::retry(state, RETRY_CONFIRMATION)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlowLabel {
    #[serde(rename = "Complete RSVP")]
    CompleteRsvp,
    #[serde(rename = "Update RSVP")]
    UpdateRsvp,
}

impl FlowLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CompleteRsvp => "Complete RSVP",
            Self::UpdateRsvp => "Update RSVP",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSummary {
    pub accepted: i64,
    pub declined: i64,
    pub total: i64,
}

pub fn completion_message(summary: &ResponseSummary) -> String {
    format!(
        "RSVP confirmed. Accepted: {}, Declined: {}. Reply update anytime to revise.",
        summary.accepted, summary.declined
    )
}

/// Message for a non-terminal step.
pub fn progress_message(step: FlowStep) -> &'static str {
    match step {
        FlowStep::InitialChoice => RETRY_INITIAL_CHOICE,
        FlowStep::AttendanceDetails => PROMPT_ATTENDANCE,
        FlowStep::Confirmation => PROMPT_CONFIRMATION,
    }
}

/// Text body sent back through the provider.
pub fn reply_body(message: &str, label: FlowLabel) -> String {
    format!("{message}\n\nNext: {}", label.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_tokens_are_case_insensitive() {
        assert_eq!(parse_choice(" YES "), Some(RsvpChoice::Accept));
        assert_eq!(parse_choice("Not-Going"), Some(RsvpChoice::Decline));
        assert_eq!(parse_choice("maybe"), None);
        assert!(is_confirmation_token("Done"));
        assert!(!is_confirmation_token("yes"));
    }

    #[test]
    fn attendance_edits_skip_malformed_entries() {
        let edits = parse_attendance_edits(" p1 = accept ,p2=no, =yes, p3=maybe, p4, ");
        assert_eq!(
            edits,
            vec![
                AttendanceEdit { person_id: "p1".into(), response: RsvpChoice::Accept },
                AttendanceEdit { person_id: "p2".into(), response: RsvpChoice::Decline },
            ]
        );
    }

    #[test]
    fn step_one_needs_a_choice() {
        let state = FlowState::initial();
        let outcome = advance(&state, "hello", 0);
        assert_eq!(outcome.next_action, NextAction::InvalidInput);
        assert_eq!(outcome.error_message, Some(RETRY_INITIAL_CHOICE));
        assert_eq!(outcome.step, FlowStep::InitialChoice);

        let outcome = advance(&state, "yes", 0);
        assert_eq!(outcome.step, FlowStep::AttendanceDetails);
        assert_eq!(outcome.final_response, Some(RsvpChoice::Accept));
    }

    #[test]
    fn step_two_advances_on_edits_or_confirmation() {
        let state = FlowState {
            step: FlowStep::AttendanceDetails,
            is_completed: false,
            final_response: Some(RsvpChoice::Accept),
        };
        assert_eq!(advance(&state, "p1=accept,p2=decline", 2).step, FlowStep::Confirmation);
        assert_eq!(advance(&state, "confirm", 0).step, FlowStep::Confirmation);

        let outcome = advance(&state, "stranger=accept", 0);
        assert_eq!(outcome.step, FlowStep::AttendanceDetails);
        assert_eq!(outcome.error_message, Some(RETRY_ATTENDANCE));
    }

    #[test]
    fn step_three_completes_only_on_confirmation() {
        let state = FlowState {
            step: FlowStep::Confirmation,
            is_completed: false,
            final_response: Some(RsvpChoice::Decline),
        };
        assert_eq!(advance(&state, "p1=accept", 1).error_message, Some(RETRY_CONFIRMATION));

        let outcome = advance(&state, "confirmed", 0);
        assert!(outcome.is_completed);
        assert!(!outcome.is_duplicate);
        assert_eq!(outcome.final_response, Some(RsvpChoice::Decline));
    }

    #[test]
    fn completed_state_replays_as_duplicate() {
        let state = FlowState {
            step: FlowStep::Confirmation,
            is_completed: true,
            final_response: Some(RsvpChoice::Accept),
        };
        let outcome = advance(&state, "confirm", 0);
        assert!(outcome.is_duplicate);
        assert_eq!(outcome.next_action, NextAction::ShowFinalConfirmation);
    }

    #[test]
    fn step_index_is_clamped() {
        assert_eq!(FlowStep::from_index(0), FlowStep::InitialChoice);
        assert_eq!(FlowStep::from_index(2), FlowStep::AttendanceDetails);
        assert_eq!(FlowStep::from_index(9), FlowStep::Confirmation);
    }

    #[test]
    fn completion_message_reports_counts() {
        let summary = ResponseSummary { accepted: 1, declined: 1, total: 2 };
        assert_eq!(
            completion_message(&summary),
            "RSVP confirmed. Accepted: 1, Declined: 1. Reply update anytime to revise."
        );
        assert_eq!(
            reply_body(PROMPT_CONFIRMATION, FlowLabel::UpdateRsvp),
            "Review your updates and reply confirm to finalize RSVP.\n\nNext: Update RSVP"
        );
    }
}
