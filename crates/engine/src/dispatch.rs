//! Invite send runs: audience, recipients, eligibility, provider, persistence.
//!
//! A run is opened in `running`, every recipient gets exactly one message
//! row, and the counters and final status are written only after the last
//! recipient's row is stored. Provider calls may overlap when
//! `dispatch_concurrency > 1`, but outcomes are consumed in recipient order.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use vows_core::audience::{AudienceFilter, AudienceTrace};
use vows_core::audit::{AuditEntry, ACTION_INVITE_SEND, TARGET_INVITE};
use vows_core::dispatch::{RecipientOutcome, RunCounters, PRECHECK_BLOCKED_SAMPLE_LIMIT};
use vows_core::policy::{
    evaluate_send_eligibility, DoNotMessageLookup, DoNotMessageEntry, Eligibility, EligibilityInput,
};
use vows_core::recipients::{RecipientResolution, RecipientTarget};
use vows_core::status::RejectionReason;
use vows_core::types::{EntityId, Timestamp};
use vows_db::models::message::{CreateInviteMessage, MessageDisposition};
use vows_db::models::run::{CreateInviteSendRun, FinalizeInviteSendRun, InviteSendRun};
use vows_db::stores::{AuditLog, DoNotMessageStore, MessageStore, RunStore};
use vows_provider::{MessagingProvider, SendOutcome, TemplateMessage};

use crate::audience::AudienceResolver;
use crate::error::EngineResult;

/// What to send, to whom, on whose behalf.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub wedding_id: EntityId,
    pub event_id: EntityId,
    pub actor_id: Option<EntityId>,
    pub template_name: String,
    pub template_language: String,
    pub filter: AudienceFilter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedSample {
    pub phone_e164: String,
    pub reason: RejectionReason,
    pub detail: String,
}

/// Dry run of a dispatch: no run row, no provider calls.
#[derive(Debug, Clone, Serialize)]
pub struct PrecheckReport {
    pub wedding_id: EntityId,
    pub event_id: EntityId,
    pub template_name: String,
    pub template_language: String,
    pub total_candidates: usize,
    pub eligible_count: usize,
    pub blocked_count: usize,
    pub ready_to_send: bool,
    pub provider_configured: bool,
    pub blocked_samples: Vec<BlockedSample>,
    pub skipped_guest_unit_ids: Vec<EntityId>,
    pub audience_trace: AudienceTrace,
    pub checked_at: Timestamp,
}

#[derive(Clone)]
pub struct DispatchOrchestrator {
    audience: AudienceResolver,
    runs: Arc<dyn RunStore>,
    messages: Arc<dyn MessageStore>,
    do_not_message: Arc<dyn DoNotMessageStore>,
    audit: Arc<dyn AuditLog>,
    provider: Arc<dyn MessagingProvider>,
    concurrency: usize,
}

impl DispatchOrchestrator {
    pub fn new(
        audience: AudienceResolver,
        runs: Arc<dyn RunStore>,
        messages: Arc<dyn MessageStore>,
        do_not_message: Arc<dyn DoNotMessageStore>,
        audit: Arc<dyn AuditLog>,
        provider: Arc<dyn MessagingProvider>,
        concurrency: usize,
    ) -> Self {
        Self {
            audience,
            runs,
            messages,
            do_not_message,
            audit,
            provider,
            concurrency: concurrency.max(1),
        }
    }

    async fn resolve(&self, request: &DispatchRequest) -> EngineResult<(AudienceTrace, RecipientResolution)> {
        let selection = self
            .audience
            .resolve_audience(&request.wedding_id, &request.filter)
            .await?;
        let resolution = self
            .audience
            .resolve_recipients(&request.wedding_id, &selection.guest_unit_ids)
            .await?;
        Ok((selection.trace, resolution))
    }

    async fn load_do_not_message(&self, wedding_id: &str) -> EngineResult<DoNotMessageLookup> {
        let rows = self.do_not_message.list_active(wedding_id, None).await?;
        Ok(DoNotMessageLookup::new(rows.into_iter().map(DoNotMessageEntry::from)))
    }

    fn eligibility(
        &self,
        target: &RecipientTarget,
        lookup: &DoNotMessageLookup,
        provider_configured: bool,
    ) -> Eligibility {
        evaluate_send_eligibility(&EligibilityInput {
            phone_e164: Some(&target.phone_e164),
            source_count: target.sources.len(),
            is_inviteable: target.is_inviteable,
            do_not_message: lookup.get(&target.phone_e164),
            provider_configured,
        })
    }

    /// Evaluate the audience against the policy without sending anything.
    pub async fn precheck(&self, request: &DispatchRequest) -> EngineResult<PrecheckReport> {
        let (trace, resolution) = self.resolve(request).await?;
        let lookup = self.load_do_not_message(&request.wedding_id).await?;
        let provider_configured = self.provider.is_configured();

        let mut eligible_count = 0;
        let mut blocked_count = 0;
        let mut blocked_samples = Vec::new();
        for target in &resolution.recipients {
            match self.eligibility(target, &lookup, provider_configured) {
                Eligibility::Allowed => eligible_count += 1,
                Eligibility::Rejected { reason, detail } => {
                    blocked_count += 1;
                    if blocked_samples.len() < PRECHECK_BLOCKED_SAMPLE_LIMIT {
                        blocked_samples.push(BlockedSample {
                            phone_e164: target.phone_e164.clone(),
                            reason,
                            detail,
                        });
                    }
                }
            }
        }

        Ok(PrecheckReport {
            wedding_id: request.wedding_id.clone(),
            event_id: request.event_id.clone(),
            template_name: request.template_name.clone(),
            template_language: request.template_language.clone(),
            total_candidates: resolution.recipient_count,
            eligible_count,
            blocked_count,
            ready_to_send: eligible_count > 0,
            provider_configured,
            blocked_samples,
            skipped_guest_unit_ids: resolution.skipped_guest_unit_ids,
            audience_trace: trace,
            checked_at: Utc::now(),
        })
    }

    /// Run a dispatch to completion and return the finalized run.
    pub async fn dispatch_run(&self, request: &DispatchRequest) -> EngineResult<InviteSendRun> {
        let (trace, resolution) = self.resolve(request).await?;

        let snapshot = serde_json::json!({
            "filters": request.filter,
            "trace": trace,
            "skipped_guest_unit_ids": resolution.skipped_guest_unit_ids,
        });
        let run = self
            .runs
            .create_run(&CreateInviteSendRun {
                wedding_id: request.wedding_id.clone(),
                event_id: request.event_id.clone(),
                template_name: request.template_name.clone(),
                template_language: request.template_language.clone(),
                audience_snapshot: snapshot,
                total_candidates: resolution.recipient_count as i64,
                created_by: request.actor_id.clone(),
            })
            .await?;
        tracing::info!(
            run_id = %run.id,
            wedding_id = %run.wedding_id,
            recipients = resolution.recipient_count,
            "Invite run started"
        );

        let lookup = self.load_do_not_message(&request.wedding_id).await?;
        let provider_configured = self.provider.is_configured();

        let pending: Vec<_> = resolution
            .recipients
            .iter()
            .map(|target| self.dispatch_one(&run, request, target, &lookup, provider_configured))
            .collect();
        let outcomes: Vec<RecipientOutcome> = stream::iter(pending)
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let mut counters = RunCounters {
            total: resolution.recipient_count,
            ..RunCounters::default()
        };
        for outcome in outcomes {
            counters.record(outcome);
        }

        let finalize = FinalizeInviteSendRun::from_counters(counters, Utc::now());
        let run = self.runs.finalize_run(&run.id, &finalize).await?;

        let mut entry = AuditEntry::new(&run.wedding_id, ACTION_INVITE_SEND, TARGET_INVITE, &run.id)
            .with_after(serde_json::json!({
                "event_id": run.event_id,
                "template_name": run.template_name,
                "template_language": run.template_language,
                "total_candidates": counters.total,
                "eligible_count": counters.eligible,
                "blocked_count": counters.blocked,
                "sent_count": counters.sent,
                "failed_count": counters.failed,
                "status": run.status,
            }));
        if let Some(actor) = &request.actor_id {
            entry = entry.by(actor.clone());
        }
        self.audit.write(&entry).await?;

        tracing::info!(
            run_id = %run.id,
            status = %run.status,
            eligible = counters.eligible,
            blocked = counters.blocked,
            sent = counters.sent,
            failed = counters.failed,
            "Invite run finished"
        );
        Ok(run)
    }

    async fn dispatch_one(
        &self,
        run: &InviteSendRun,
        request: &DispatchRequest,
        target: &RecipientTarget,
        lookup: &DoNotMessageLookup,
        provider_configured: bool,
    ) -> EngineResult<RecipientOutcome> {
        let (disposition, outcome) = match self.eligibility(target, lookup, provider_configured) {
            Eligibility::Rejected { reason, detail } => {
                tracing::debug!(run_id = %run.id, phone = %target.phone_e164, reason = %reason, "Recipient blocked");
                (
                    MessageDisposition::Blocked { reason, detail },
                    RecipientOutcome::Blocked(reason),
                )
            }
            Eligibility::Allowed => {
                let message = TemplateMessage {
                    to: target.phone_e164.clone(),
                    template_name: request.template_name.clone(),
                    template_language: request.template_language.clone(),
                    components: None,
                };
                match self.provider.send_template(&message).await {
                    SendOutcome::Sent {
                        provider_message_id,
                    } => (
                        MessageDisposition::Sent {
                            provider_message_id,
                        },
                        RecipientOutcome::Sent,
                    ),
                    SendOutcome::Failed {
                        error_code,
                        error_message,
                    } => {
                        tracing::warn!(
                            run_id = %run.id,
                            phone = %target.phone_e164,
                            error_code = %error_code,
                            "Invite dispatch failed at provider"
                        );
                        (
                            MessageDisposition::ProviderFailed {
                                error_code,
                                error_message,
                            },
                            RecipientOutcome::ProviderFailed,
                        )
                    }
                }
            }
        };

        self.messages
            .insert_message(CreateInviteMessage {
                invite_run_id: run.id.clone(),
                wedding_id: run.wedding_id.clone(),
                event_id: run.event_id.clone(),
                recipient_guest_unit_id: target.primary_guest_unit_id().map(str::to_string),
                recipient_phone_e164: target.phone_e164.clone(),
                disposition,
                at: Utc::now(),
            })
            .await?;
        Ok(outcome)
    }
}
