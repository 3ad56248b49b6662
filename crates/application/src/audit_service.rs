use std::sync::Arc;

use auditrail_core::{AuditError, AuditResult, RecordId};
use auditrail_domain::{
    AuditEvent, AuditEventKind, AuditSubject, CompletionStatus, LifeCycleEventType,
    MembershipChangeEventType, PropertyValueChange, ResponsibleInformation, SessionRecord,
    TransactionRecord,
};
use chrono::{DateTime, Utc};

use crate::AuditContext;
use crate::audit_ports::{
    AuditEventStore, IdentifierGenerator, PropertyChangeInput, SessionRecordStore,
    TransactionRecordStore,
};

/// Identity of the system recording audit data, attached to every session
/// record the service creates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemIdentity {
    /// Subject describing the owning system.
    pub system: Option<AuditSubject>,
    /// Network address of the owning system.
    pub system_address: Option<String>,
}

/// Application service orchestrating audit record capture.
///
/// Stateless apart from its injected collaborators; clones share the same
/// stores and can be handed to any task.
#[derive(Clone)]
pub struct AuditService {
    session_store: Arc<dyn SessionRecordStore>,
    transaction_store: Arc<dyn TransactionRecordStore>,
    event_store: Arc<dyn AuditEventStore>,
    id_generator: Arc<dyn IdentifierGenerator>,
    system_identity: SystemIdentity,
}

impl AuditService {
    /// Creates a new audit service from store implementations.
    #[must_use]
    pub fn new(
        session_store: Arc<dyn SessionRecordStore>,
        transaction_store: Arc<dyn TransactionRecordStore>,
        event_store: Arc<dyn AuditEventStore>,
        id_generator: Arc<dyn IdentifierGenerator>,
        system_identity: SystemIdentity,
    ) -> Self {
        Self {
            session_store,
            transaction_store,
            event_store,
            id_generator,
            system_identity,
        }
    }

    /// Returns the configured owning-system identity.
    #[must_use]
    pub fn system_identity(&self) -> &SystemIdentity {
        &self.system_identity
    }

    /// Returns a fresh, empty responsible information instance for the
    /// caller to fill in.
    #[must_use]
    pub fn new_responsible_information(&self) -> ResponsibleInformation {
        ResponsibleInformation::new()
    }

    /// Creates and persists a session record started now.
    ///
    /// The owning-system identity configured on the service is attached to
    /// the record. Both arguments are optional: an anonymous session starts
    /// with neither an external identifier nor responsible information.
    pub async fn create_session_record(
        &self,
        session_id: Option<String>,
        responsible_information: Option<ResponsibleInformation>,
    ) -> AuditResult<SessionRecord> {
        let mut record = SessionRecord::new(self.id_generator.next_id(), session_id, Utc::now());

        if let Some(system) = self.system_identity.system.clone() {
            record = record.with_system(system);
        }

        if let Some(address) = self.system_identity.system_address.clone() {
            record = record.with_system_address(address);
        }

        if let Some(information) = responsible_information {
            record = record.with_responsible_information(information);
        }

        self.session_store.create_session(record.clone()).await?;
        Ok(record)
    }

    /// Closes the session record, stamping the end to now.
    ///
    /// The record is re-read by identity first, so a stale or foreign
    /// reference fails with not-found before anything is written.
    pub async fn session_ended(&self, session_record: &SessionRecord) -> AuditResult<SessionRecord> {
        let current = self.require_session(session_record.id()).await?;

        if current.is_ended() {
            return Err(AuditError::InvalidState(format!(
                "session record '{}' is already ended",
                current.id()
            )));
        }

        self.session_store
            .end_session(session_record.id(), Utc::now())
            .await
    }

    /// Replaces responsible information on an open session record.
    ///
    /// Typically called when an anonymous session authenticates. Fails
    /// with invalid-state once the session has ended; nothing is written
    /// on any failure path.
    pub async fn update_responsible(
        &self,
        session_record: &SessionRecord,
        responsible_information: ResponsibleInformation,
    ) -> AuditResult<SessionRecord> {
        let current = self.require_session(session_record.id()).await?;

        if current.is_ended() {
            return Err(AuditError::InvalidState(format!(
                "session record '{}' is ended and can no longer change",
                current.id()
            )));
        }

        self.session_store
            .update_responsible_information(session_record.id(), responsible_information)
            .await
    }

    /// Creates and persists a transaction record started now, optionally
    /// linked to the session it runs under.
    pub async fn create_transaction_record(
        &self,
        transaction_id: &str,
        session_record: Option<&SessionRecord>,
    ) -> AuditResult<TransactionRecord> {
        let mut record = TransactionRecord::new(self.id_generator.next_id(), transaction_id)?
            .with_started_ts(Utc::now());

        if let Some(session_record) = session_record {
            record = record.with_session_record(session_record.clone());
        }

        self.transaction_store
            .create_transaction(record.clone())
            .await?;
        Ok(record)
    }

    /// Closes the transaction record with its outcome.
    pub async fn update_transaction_ended(
        &self,
        transaction_record: &TransactionRecord,
        completion_status: CompletionStatus,
        ended_ts: DateTime<Utc>,
    ) -> AuditResult<TransactionRecord> {
        let current = self
            .transaction_store
            .find_transaction(transaction_record.id())
            .await?
            .ok_or_else(|| {
                AuditError::NotFound(format!(
                    "transaction record '{}' does not exist",
                    transaction_record.id()
                ))
            })?;

        if current.is_ended() {
            return Err(AuditError::InvalidState(format!(
                "transaction record '{}' is already ended",
                current.id()
            )));
        }

        self.transaction_store
            .end_transaction(transaction_record.id(), ended_ts, completion_status)
            .await
    }

    /// Records a life-cycle event against the session bound to the
    /// current task.
    pub async fn create_life_cycle_event(
        &self,
        event_type: LifeCycleEventType,
        target: Option<AuditSubject>,
        description: Option<String>,
    ) -> AuditResult<AuditEvent> {
        let kind = AuditEventKind::life_cycle(event_type, Vec::new())?;
        self.persist_event(kind, target, description, None).await
    }

    /// Records a life-cycle event carrying per-property changes, each of
    /// which receives its own generated identity.
    pub async fn create_life_cycle_event_with_changes(
        &self,
        event_type: LifeCycleEventType,
        target: Option<AuditSubject>,
        description: Option<String>,
        changes: Vec<PropertyChangeInput>,
        transaction_record: Option<&TransactionRecord>,
    ) -> AuditResult<AuditEvent> {
        let mut property_value_changes = Vec::with_capacity(changes.len());
        for change in changes {
            property_value_changes.push(PropertyValueChange::new(
                self.id_generator.next_id(),
                change.property_name,
                change.property_type,
                change.old_value,
                change.old_value_specified,
                change.new_value,
                change.new_value_specified,
            )?);
        }

        let kind = AuditEventKind::life_cycle(event_type, property_value_changes)?;
        self.persist_event(kind, target, description, transaction_record)
            .await
    }

    /// Records a business event against the session bound to the current
    /// task.
    pub async fn create_business_event(
        &self,
        business_class: &str,
        business_action: Option<String>,
        target: Option<AuditSubject>,
        description: Option<String>,
        transaction_record: Option<&TransactionRecord>,
    ) -> AuditResult<AuditEvent> {
        let kind = AuditEventKind::business(business_class, business_action)?;
        self.persist_event(kind, target, description, transaction_record)
            .await
    }

    /// Records a consumption event against the session bound to the
    /// current task.
    pub async fn create_consumption_event(
        &self,
        amount_consumed: f64,
        scale: u32,
        target: Option<AuditSubject>,
        description: Option<String>,
        transaction_record: Option<&TransactionRecord>,
    ) -> AuditResult<AuditEvent> {
        let kind = AuditEventKind::consumption(amount_consumed, scale)?;
        self.persist_event(kind, target, description, transaction_record)
            .await
    }

    /// Records a membership change event against the session bound to the
    /// current task.
    pub async fn create_membership_change_event(
        &self,
        membership_group: AuditSubject,
        change_type: MembershipChangeEventType,
        membership_property: Option<String>,
        target: Option<AuditSubject>,
        description: Option<String>,
        transaction_record: Option<&TransactionRecord>,
    ) -> AuditResult<AuditEvent> {
        let kind =
            AuditEventKind::membership_change(membership_group, change_type, membership_property);
        self.persist_event(kind, target, description, transaction_record)
            .await
    }

    async fn require_session(&self, id: &RecordId) -> AuditResult<SessionRecord> {
        self.session_store.find_session(id).await?.ok_or_else(|| {
            AuditError::NotFound(format!("session record '{id}' does not exist"))
        })
    }

    async fn persist_event(
        &self,
        kind: AuditEventKind,
        target: Option<AuditSubject>,
        description: Option<String>,
        transaction_record: Option<&TransactionRecord>,
    ) -> AuditResult<AuditEvent> {
        let context = AuditContext::current().ok_or(AuditError::NoActiveSession)?;

        let mut event = AuditEvent::new(self.id_generator.next_id(), Utc::now(), kind)
            .with_session_record(context.session_record().clone());

        if let Some(target) = target {
            event = event.with_target(target);
        }

        if let Some(description) = description {
            event = event.with_description(description);
        }

        if let Some(transaction_record) = transaction_record {
            event = event.with_transaction_record(transaction_record.clone());
        }

        self.event_store.append_event(event.clone()).await?;
        Ok(event)
    }
}
