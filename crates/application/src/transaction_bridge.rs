use auditrail_core::AuditResult;
use auditrail_domain::{CompletionStatus, TransactionRecord};
use chrono::{DateTime, Utc};

use crate::{AuditContext, AuditService};

/// Adapter invoked from platform transaction boundaries.
///
/// Datastore integrations call [`TransactionBridge::transaction_started`]
/// when a unit of work begins and
/// [`TransactionBridge::transaction_completed`] when it commits or rolls
/// back, so events recorded in between can be correlated to it.
#[derive(Clone)]
pub struct TransactionBridge {
    audit_service: AuditService,
}

impl TransactionBridge {
    /// Creates a bridge delegating to the given audit service.
    #[must_use]
    pub fn new(audit_service: AuditService) -> Self {
        Self { audit_service }
    }

    /// Records the start of a platform unit of work.
    ///
    /// The new record is linked to the session bound to the current task,
    /// when one is bound; sessions stay optional on transaction records.
    pub async fn transaction_started(
        &self,
        transaction_id: &str,
    ) -> AuditResult<TransactionRecord> {
        let context = AuditContext::current();
        let session_record = context.as_ref().map(AuditContext::session_record);

        self.audit_service
            .create_transaction_record(transaction_id, session_record)
            .await
    }

    /// Records the completion of a platform unit of work with its outcome.
    pub async fn transaction_completed(
        &self,
        transaction_record: &TransactionRecord,
        completion_status: CompletionStatus,
        completed_at: DateTime<Utc>,
    ) -> AuditResult<TransactionRecord> {
        self.audit_service
            .update_transaction_ended(transaction_record, completion_status, completed_at)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    use async_trait::async_trait;
    use auditrail_core::{AuditError, AuditResult, RecordId};
    use auditrail_domain::{
        AuditEvent, CompletionStatus, ResponsibleInformation, SessionRecord, TransactionRecord,
    };
    use chrono::{DateTime, Utc};
    use tokio::sync::Mutex;

    use crate::{
        AuditContext, AuditEventStore, AuditService, IdentifierGenerator, SessionRecordStore,
        SystemIdentity, TransactionRecordStore,
    };

    use super::TransactionBridge;

    #[derive(Default)]
    struct FakeStores {
        sessions: Mutex<HashMap<RecordId, SessionRecord>>,
        transactions: Mutex<HashMap<RecordId, TransactionRecord>>,
        events: Mutex<Vec<AuditEvent>>,
    }

    #[async_trait]
    impl SessionRecordStore for FakeStores {
        async fn create_session(&self, record: SessionRecord) -> AuditResult<RecordId> {
            let id = record.id().clone();
            self.sessions.lock().await.insert(id.clone(), record);
            Ok(id)
        }

        async fn find_session(&self, id: &RecordId) -> AuditResult<Option<SessionRecord>> {
            Ok(self.sessions.lock().await.get(id).cloned())
        }

        async fn end_session(
            &self,
            id: &RecordId,
            ended_ts: DateTime<Utc>,
        ) -> AuditResult<SessionRecord> {
            let mut sessions = self.sessions.lock().await;
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
            let mut sessions = self.sessions.lock().await;
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
    impl TransactionRecordStore for FakeStores {
        async fn create_transaction(&self, record: TransactionRecord) -> AuditResult<RecordId> {
            let id = record.id().clone();
            self.transactions.lock().await.insert(id.clone(), record);
            Ok(id)
        }

        async fn find_transaction(&self, id: &RecordId) -> AuditResult<Option<TransactionRecord>> {
            Ok(self.transactions.lock().await.get(id).cloned())
        }

        async fn end_transaction(
            &self,
            id: &RecordId,
            ended_ts: DateTime<Utc>,
            completion_status: CompletionStatus,
        ) -> AuditResult<TransactionRecord> {
            let mut transactions = self.transactions.lock().await;
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
    impl AuditEventStore for FakeStores {
        async fn append_event(&self, event: AuditEvent) -> AuditResult<RecordId> {
            let id = event.id().clone();
            self.events.lock().await.push(event);
            Ok(id)
        }

        async fn find_event(&self, id: &RecordId) -> AuditResult<Option<AuditEvent>> {
            Ok(self
                .events
                .lock()
                .await
                .iter()
                .find(|event| event.id() == id)
                .cloned())
        }
    }

    #[derive(Default)]
    struct SequentialIdGenerator {
        counter: AtomicU64,
    }

    impl IdentifierGenerator for SequentialIdGenerator {
        fn next_id(&self) -> RecordId {
            let next = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
            RecordId::new(format!("id-{next}")).unwrap_or_else(|_| unreachable!())
        }
    }

    fn build_bridge() -> (TransactionBridge, AuditService) {
        let stores = Arc::new(FakeStores::default());
        let service = AuditService::new(
            stores.clone(),
            stores.clone(),
            stores,
            Arc::new(SequentialIdGenerator::default()),
            SystemIdentity::default(),
        );

        (TransactionBridge::new(service.clone()), service)
    }

    #[tokio::test]
    async fn started_links_the_ambient_session() {
        let (bridge, service) = build_bridge();

        AuditContext::scope(async {
            let session = service
                .create_session_record(None, None)
                .await
                .unwrap_or_else(|_| unreachable!());
            assert!(AuditContext::create(session.clone()).is_ok());

            let transaction = bridge.transaction_started("tx-9000").await;
            assert!(transaction.is_ok());
            let transaction = transaction.unwrap_or_else(|_| unreachable!());

            assert_eq!(transaction.session_record(), Some(&session));
            assert_eq!(transaction.transaction_id().as_str(), "tx-9000");
        })
        .await;
    }

    #[tokio::test]
    async fn started_without_a_session_stays_unlinked() {
        let (bridge, _) = build_bridge();

        let transaction = bridge.transaction_started("tx-9001").await;
        assert!(transaction.is_ok());
        assert!(
            transaction
                .unwrap_or_else(|_| unreachable!())
                .session_record()
                .is_none()
        );
    }

    #[tokio::test]
    async fn completed_closes_with_the_reported_outcome() {
        let (bridge, _) = build_bridge();

        let transaction = bridge
            .transaction_started("tx-9002")
            .await
            .unwrap_or_else(|_| unreachable!());

        let completed_at = Utc::now();
        let closed = bridge
            .transaction_completed(&transaction, CompletionStatus::RolledBack, completed_at)
            .await;
        assert!(closed.is_ok());
        let closed = closed.unwrap_or_else(|_| unreachable!());

        assert_eq!(closed.completion_status(), Some(CompletionStatus::RolledBack));
        assert_eq!(closed.ended_ts(), Some(completed_at));
    }
}
