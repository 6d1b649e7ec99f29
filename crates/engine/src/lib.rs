//! Invite dispatch, delivery tracking and conversational RSVP.
//!
//! [`Engine`] wires the services to a set of store ports and one messaging
//! provider. The API crate owns an `Arc<Engine>`; tests build one over the
//! in-memory store.

use std::sync::Arc;

use vows_provider::MessagingProvider;

pub mod audience;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod inspect;
pub mod lifecycle;
pub mod locks;
pub mod rsvp;
pub mod stores;
pub mod webhook;

use audience::AudienceResolver;
use config::EngineConfig;
use dispatch::DispatchOrchestrator;
use inspect::InviteInspector;
use lifecycle::LifecycleStateMachine;
use rsvp::ConfirmationFlow;
use stores::EngineStores;
use webhook::WebhookIngestion;

pub use error::{EngineError, EngineResult};

pub struct Engine {
    pub audience: AudienceResolver,
    pub dispatch: DispatchOrchestrator,
    pub lifecycle: LifecycleStateMachine,
    pub confirmations: Arc<ConfirmationFlow>,
    pub webhooks: WebhookIngestion,
    pub inspect: InviteInspector,
    stores: EngineStores,
}

impl Engine {
    pub fn new(stores: EngineStores, provider: Arc<dyn MessagingProvider>, config: EngineConfig) -> Self {
        let audience = AudienceResolver::new(stores.guests.clone());
        let dispatch = DispatchOrchestrator::new(
            audience.clone(),
            stores.runs.clone(),
            stores.messages.clone(),
            stores.do_not_message.clone(),
            stores.audit.clone(),
            provider.clone(),
            config.dispatch_concurrency,
        );
        let lifecycle = LifecycleStateMachine::new(stores.messages.clone());
        let confirmations = Arc::new(ConfirmationFlow::new(
            stores.guests.clone(),
            stores.sessions.clone(),
            provider,
            config.rsvp_session_ttl_hours,
        ));
        let webhooks = WebhookIngestion::new(
            config.webhook_app_secret,
            stores.receipts.clone(),
            stores.messages.clone(),
            stores.sessions.clone(),
            lifecycle.clone(),
            confirmations.clone(),
        );
        let inspect = InviteInspector::new(
            stores.runs.clone(),
            stores.messages.clone(),
            stores.receipts.clone(),
            stores.do_not_message.clone(),
        );

        Self {
            audience,
            dispatch,
            lifecycle,
            confirmations,
            webhooks,
            inspect,
            stores,
        }
    }

    /// Whether the backing store answers.
    pub async fn health(&self) -> bool {
        match self.stores.health.ping().await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "Store health check failed");
                false
            }
        }
    }
}
