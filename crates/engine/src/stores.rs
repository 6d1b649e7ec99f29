use std::sync::Arc;

use vows_db::stores::{
    AuditLog, DoNotMessageStore, GuestDirectory, HealthProbe, MessageStore, ReceiptStore,
    RunStore, SessionStore,
};

/// Every persistence port the engine talks to.
#[derive(Clone)]
pub struct EngineStores {
    pub guests: Arc<dyn GuestDirectory>,
    pub do_not_message: Arc<dyn DoNotMessageStore>,
    pub runs: Arc<dyn RunStore>,
    pub messages: Arc<dyn MessageStore>,
    pub receipts: Arc<dyn ReceiptStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub audit: Arc<dyn AuditLog>,
    pub health: Arc<dyn HealthProbe>,
}

impl EngineStores {
    /// Use one store value for every port.
    pub fn from_shared<S>(store: Arc<S>) -> Self
    where
        S: GuestDirectory
            + DoNotMessageStore
            + RunStore
            + MessageStore
            + ReceiptStore
            + SessionStore
            + AuditLog
            + HealthProbe
            + 'static,
    {
        Self {
            guests: store.clone(),
            do_not_message: store.clone(),
            runs: store.clone(),
            messages: store.clone(),
            receipts: store.clone(),
            sessions: store.clone(),
            audit: store.clone(),
            health: store,
        }
    }
}
