use async_trait::async_trait;
use auditrail_core::{AuditResult, RecordId};
use auditrail_domain::{
    AuditEvent, CompletionStatus, ResponsibleInformation, SessionRecord, TransactionRecord,
};
use chrono::{DateTime, Utc};

/// Input payload for one property change on a life-cycle update event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChangeInput {
    /// Name of the changed property.
    pub property_name: String,
    /// Declared type of the changed property.
    pub property_type: String,
    /// Value before the change, when captured.
    pub old_value: Option<String>,
    /// Whether the old value was captured at all.
    pub old_value_specified: bool,
    /// Value after the change, when captured.
    pub new_value: Option<String>,
    /// Whether the new value was captured at all.
    pub new_value_specified: bool,
}

/// Store port for session records.
///
/// Finds of a missing identity return `Ok(None)`; the conditional updates
/// return not-found for a missing identity and invalid-state when the
/// record is already closed. Stores enforce the closed check under their
/// own lock or statement.
#[async_trait]
pub trait SessionRecordStore: Send + Sync {
    /// Persists a new session record and returns its storage identity.
    async fn create_session(&self, record: SessionRecord) -> AuditResult<RecordId>;

    /// Finds a session record by storage identity.
    async fn find_session(&self, id: &RecordId) -> AuditResult<Option<SessionRecord>>;

    /// Closes an open session record and returns the updated record.
    async fn end_session(
        &self,
        id: &RecordId,
        ended_ts: DateTime<Utc>,
    ) -> AuditResult<SessionRecord>;

    /// Replaces responsible information on an open session record and
    /// returns the updated record.
    async fn update_responsible_information(
        &self,
        id: &RecordId,
        information: ResponsibleInformation,
    ) -> AuditResult<SessionRecord>;
}

/// Store port for transaction records.
#[async_trait]
pub trait TransactionRecordStore: Send + Sync {
    /// Persists a new transaction record and returns its storage identity.
    async fn create_transaction(&self, record: TransactionRecord) -> AuditResult<RecordId>;

    /// Finds a transaction record by storage identity.
    async fn find_transaction(&self, id: &RecordId) -> AuditResult<Option<TransactionRecord>>;

    /// Closes an open transaction record with its outcome and returns the
    /// updated record.
    async fn end_transaction(
        &self,
        id: &RecordId,
        ended_ts: DateTime<Utc>,
        completion_status: CompletionStatus,
    ) -> AuditResult<TransactionRecord>;
}

/// Store port for audit events. Events are append-only: no update
/// operation exists.
#[async_trait]
pub trait AuditEventStore: Send + Sync {
    /// Appends a single audit event and returns its storage identity.
    async fn append_event(&self, event: AuditEvent) -> AuditResult<RecordId>;

    /// Finds an audit event by storage identity.
    async fn find_event(&self, id: &RecordId) -> AuditResult<Option<AuditEvent>>;
}

/// Source of overwhelmingly unique record identifiers.
pub trait IdentifierGenerator: Send + Sync {
    /// Returns the next fresh identifier.
    fn next_id(&self) -> RecordId;
}
