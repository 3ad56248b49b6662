use std::sync::Arc;

use auditrail_application::{
    AuditEventStore, AuditService, ResponsiblePopulator, SessionRecordStore, TransactionBridge,
    TransactionRecordStore,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub audit_service: AuditService,
    pub transaction_bridge: TransactionBridge,
    pub session_store: Arc<dyn SessionRecordStore>,
    pub transaction_store: Arc<dyn TransactionRecordStore>,
    pub event_store: Arc<dyn AuditEventStore>,
    pub responsible_populator: Arc<dyn ResponsiblePopulator>,
}
