use std::collections::HashMap;

use async_trait::async_trait;
use auditrail_application::{AuditEventStore, SessionRecordStore, TransactionRecordStore};
use auditrail_core::{AuditError, AuditResult, RecordId};
use auditrail_domain::{
    AuditEvent, CompletionStatus, ResponsibleInformation, SessionRecord, TransactionRecord,
};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// In-memory store for all three audit record kinds.
///
/// The conditional updates run under the map's write lock, so the
/// closed-record guard holds across concurrent callers.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    sessions: RwLock<HashMap<RecordId, SessionRecord>>,
    transactions: RwLock<HashMap<RecordId, TransactionRecord>>,
    events: RwLock<HashMap<RecordId, AuditEvent>>,
}

impl InMemoryAuditStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            transactions: RwLock::new(HashMap::new()),
            events: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SessionRecordStore for InMemoryAuditStore {
    async fn create_session(&self, record: SessionRecord) -> AuditResult<RecordId> {
        let id = record.id().clone();
        let mut sessions = self.sessions.write().await;

        if sessions.contains_key(&id) {
            return Err(AuditError::InvalidState(format!(
                "session record '{id}' already exists"
            )));
        }

        sessions.insert(id.clone(), record);
        Ok(id)
    }

    async fn find_session(&self, id: &RecordId) -> AuditResult<Option<SessionRecord>> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn end_session(
        &self,
        id: &RecordId,
        ended_ts: DateTime<Utc>,
    ) -> AuditResult<SessionRecord> {
        let mut sessions = self.sessions.write().await;

        let Some(record) = sessions.get_mut(id) else {
            return Err(AuditError::NotFound(format!(
                "session record '{id}' does not exist"
            )));
        };

        record.mark_ended(ended_ts)?;
        Ok(record.clone())
    }

    async fn update_responsible_information(
        &self,
        id: &RecordId,
        information: ResponsibleInformation,
    ) -> AuditResult<SessionRecord> {
        let mut sessions = self.sessions.write().await;

        let Some(record) = sessions.get_mut(id) else {
            return Err(AuditError::NotFound(format!(
                "session record '{id}' does not exist"
            )));
        };

        record.set_responsible_information(information)?;
        Ok(record.clone())
    }
}

#[async_trait]
impl TransactionRecordStore for InMemoryAuditStore {
    async fn create_transaction(&self, record: TransactionRecord) -> AuditResult<RecordId> {
        let id = record.id().clone();
        let mut transactions = self.transactions.write().await;

        if transactions.contains_key(&id) {
            return Err(AuditError::InvalidState(format!(
                "transaction record '{id}' already exists"
            )));
        }

        transactions.insert(id.clone(), record);
        Ok(id)
    }

    async fn find_transaction(&self, id: &RecordId) -> AuditResult<Option<TransactionRecord>> {
        Ok(self.transactions.read().await.get(id).cloned())
    }

    async fn end_transaction(
        &self,
        id: &RecordId,
        ended_ts: DateTime<Utc>,
        completion_status: CompletionStatus,
    ) -> AuditResult<TransactionRecord> {
        let mut transactions = self.transactions.write().await;

        let Some(record) = transactions.get_mut(id) else {
            return Err(AuditError::NotFound(format!(
                "transaction record '{id}' does not exist"
            )));
        };

        record.mark_ended(ended_ts, completion_status)?;
        Ok(record.clone())
    }
}

#[async_trait]
impl AuditEventStore for InMemoryAuditStore {
    async fn append_event(&self, event: AuditEvent) -> AuditResult<RecordId> {
        let id = event.id().clone();
        let mut events = self.events.write().await;

        if events.contains_key(&id) {
            return Err(AuditError::InvalidState(format!(
                "audit event '{id}' already exists"
            )));
        }

        events.insert(id.clone(), event);
        Ok(id)
    }

    async fn find_event(&self, id: &RecordId) -> AuditResult<Option<AuditEvent>> {
        Ok(self.events.read().await.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use auditrail_application::{AuditEventStore, SessionRecordStore, TransactionRecordStore};
    use auditrail_core::{AuditError, RecordId};
    use auditrail_domain::{
        AuditEvent, AuditEventKind, CompletionStatus, ResponsibleInformation, SessionRecord,
        TransactionRecord,
    };
    use chrono::Utc;

    use super::InMemoryAuditStore;

    fn record_id(value: &str) -> RecordId {
        RecordId::new(value).unwrap_or_else(|_| unreachable!())
    }

    fn open_session(id: &str) -> SessionRecord {
        SessionRecord::new(record_id(id), Some("web-1".to_owned()), Utc::now())
    }

    fn open_transaction(id: &str) -> TransactionRecord {
        TransactionRecord::new(record_id(id), "tx-1").unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn create_then_find_returns_the_stored_session() {
        let store = InMemoryAuditStore::new();
        let record = open_session("session-1");

        let created = store.create_session(record.clone()).await;
        assert!(created.is_ok());

        let found = store.find_session(record.id()).await;
        assert!(found.is_ok());
        assert_eq!(found.unwrap_or_default(), Some(record));
    }

    #[tokio::test]
    async fn find_of_a_missing_identity_is_none() {
        let store = InMemoryAuditStore::new();

        let found = store.find_session(&record_id("missing")).await;
        assert!(found.is_ok());
        assert!(found.unwrap_or_default().is_none());
    }

    #[tokio::test]
    async fn create_session_rejects_a_reused_identity() {
        let store = InMemoryAuditStore::new();

        let first = store.create_session(open_session("session-1")).await;
        assert!(first.is_ok());

        let second = store.create_session(open_session("session-1")).await;
        assert!(matches!(second, Err(AuditError::InvalidState(_))));
    }

    #[tokio::test]
    async fn end_session_closes_exactly_once() {
        let store = InMemoryAuditStore::new();
        let record = open_session("session-1");
        let created = store.create_session(record.clone()).await;
        assert!(created.is_ok());

        let ended = store.end_session(record.id(), Utc::now()).await;
        assert!(ended.is_ok());
        assert!(ended.unwrap_or_else(|_| unreachable!()).is_ended());

        let again = store.end_session(record.id(), Utc::now()).await;
        assert!(matches!(again, Err(AuditError::InvalidState(_))));

        let missing = store.end_session(&record_id("missing"), Utc::now()).await;
        assert!(matches!(missing, Err(AuditError::NotFound(_))));
    }

    #[tokio::test]
    async fn responsible_information_updates_only_while_open() {
        let store = InMemoryAuditStore::new();
        let record = open_session("session-1");
        let created = store.create_session(record.clone()).await;
        assert!(created.is_ok());

        let mut information = ResponsibleInformation::new();
        information.set_responsible_address("203.0.113.9");

        let updated = store
            .update_responsible_information(record.id(), information.clone())
            .await;
        assert!(updated.is_ok());
        assert_eq!(
            updated
                .unwrap_or_else(|_| unreachable!())
                .responsible_information(),
            Some(&information)
        );

        let ended = store.end_session(record.id(), Utc::now()).await;
        assert!(ended.is_ok());

        let after_close = store
            .update_responsible_information(record.id(), ResponsibleInformation::new())
            .await;
        assert!(matches!(after_close, Err(AuditError::InvalidState(_))));
    }

    #[tokio::test]
    async fn end_transaction_records_the_outcome_exactly_once() {
        let store = InMemoryAuditStore::new();
        let record = open_transaction("record-1");
        let created = store.create_transaction(record.clone()).await;
        assert!(created.is_ok());

        let ended = store
            .end_transaction(record.id(), Utc::now(), CompletionStatus::Committed)
            .await;
        assert!(ended.is_ok());
        assert_eq!(
            ended
                .unwrap_or_else(|_| unreachable!())
                .completion_status(),
            Some(CompletionStatus::Committed)
        );

        let again = store
            .end_transaction(record.id(), Utc::now(), CompletionStatus::RolledBack)
            .await;
        assert!(matches!(again, Err(AuditError::InvalidState(_))));
    }

    #[tokio::test]
    async fn events_are_append_only_per_identity() {
        let store = InMemoryAuditStore::new();
        let kind = AuditEventKind::business("order.placed", None).unwrap_or_else(|_| unreachable!());
        let event = AuditEvent::new(record_id("event-1"), Utc::now(), kind);

        let appended = store.append_event(event.clone()).await;
        assert!(appended.is_ok());

        let duplicate = store.append_event(event.clone()).await;
        assert!(matches!(duplicate, Err(AuditError::InvalidState(_))));

        let found = store.find_event(event.id()).await;
        assert!(found.is_ok());
        assert_eq!(found.unwrap_or_default(), Some(event));
    }
}
