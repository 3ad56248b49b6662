use auditrail_application::PropertyChangeInput;
use auditrail_core::AuditResult;
use auditrail_domain::{
    AuditEvent, AuditEventKind, AuditSubject, CompletionStatus, LifeCycleEventType,
    MembershipChangeEventType, ResponsibleInformation, SessionRecord, TransactionRecord,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Wire representation of an audit subject.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuditSubjectPayload {
    pub subject_id: String,
    pub subject_type: Option<String>,
    pub subject_discriminator: Option<String>,
}

/// Wire representation of responsible information.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResponsiblePayload {
    pub responsible: Option<AuditSubjectPayload>,
    pub responsible_address: Option<String>,
    pub responsible_agent: Option<String>,
    pub credentials_type: Option<String>,
}

/// Incoming payload for session record creation.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub session_id: Option<String>,
    pub responsible: Option<ResponsiblePayload>,
}

/// Incoming payload for transaction record creation.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub transaction_id: String,
}

/// Incoming payload for closing a transaction record.
#[derive(Debug, Deserialize)]
pub struct EndTransactionRequest {
    pub completion_status: CompletionStatus,
}

/// Wire representation of one property change on a life-cycle event.
///
/// An omitted specified flag follows value presence, so recording an
/// explicit null requires setting the flag to true.
#[derive(Debug, Deserialize)]
pub struct PropertyChangePayload {
    pub property_name: String,
    pub property_type: String,
    pub old_value: Option<String>,
    pub old_value_specified: Option<bool>,
    pub new_value: Option<String>,
    pub new_value_specified: Option<bool>,
}

/// Incoming payload for recording a life-cycle event.
#[derive(Debug, Deserialize)]
pub struct LifeCycleEventRequest {
    pub event_type: LifeCycleEventType,
    pub target: Option<AuditSubjectPayload>,
    pub description: Option<String>,
    #[serde(default)]
    pub changes: Vec<PropertyChangePayload>,
    pub transaction_record_id: Option<String>,
}

/// Incoming payload for recording a business event.
#[derive(Debug, Deserialize)]
pub struct BusinessEventRequest {
    pub business_class: String,
    pub business_action: Option<String>,
    pub target: Option<AuditSubjectPayload>,
    pub description: Option<String>,
    pub transaction_record_id: Option<String>,
}

/// Incoming payload for recording a consumption event.
#[derive(Debug, Deserialize)]
pub struct ConsumptionEventRequest {
    pub amount_consumed: f64,
    #[serde(default)]
    pub scale: u32,
    pub target: Option<AuditSubjectPayload>,
    pub description: Option<String>,
    pub transaction_record_id: Option<String>,
}

/// Incoming payload for recording a membership change event.
#[derive(Debug, Deserialize)]
pub struct MembershipChangeEventRequest {
    pub membership_group: AuditSubjectPayload,
    pub change_type: MembershipChangeEventType,
    pub membership_property: Option<String>,
    pub target: Option<AuditSubjectPayload>,
    pub description: Option<String>,
    pub transaction_record_id: Option<String>,
}

/// API representation of a session record.
#[derive(Debug, Serialize)]
pub struct SessionRecordResponse {
    pub id: String,
    pub session_id: Option<String>,
    pub started_ts: DateTime<Utc>,
    pub ended_ts: Option<DateTime<Utc>>,
    pub system: Option<AuditSubjectPayload>,
    pub system_address: Option<String>,
    pub responsible_information: Option<ResponsiblePayload>,
}

/// API representation of a transaction record.
#[derive(Debug, Serialize)]
pub struct TransactionRecordResponse {
    pub id: String,
    pub transaction_id: String,
    pub session_record: Option<SessionRecordResponse>,
    pub started_ts: Option<DateTime<Utc>>,
    pub ended_ts: Option<DateTime<Utc>>,
    pub completion_status: Option<CompletionStatus>,
}

/// API representation of an audit event.
#[derive(Debug, Serialize)]
pub struct AuditEventResponse {
    pub id: String,
    pub ts: DateTime<Utc>,
    pub kind: AuditEventKind,
    pub target: Option<AuditSubjectPayload>,
    pub session_record: Option<SessionRecordResponse>,
    pub transaction_record: Option<TransactionRecordResponse>,
    pub description: Option<String>,
}

impl AuditSubjectPayload {
    /// Converts the payload into a validated domain subject.
    pub fn into_subject(self) -> AuditResult<AuditSubject> {
        let mut subject = AuditSubject::new(self.subject_id)?;

        if let Some(subject_type) = self.subject_type {
            subject = subject.with_subject_type(subject_type);
        }

        if let Some(discriminator) = self.subject_discriminator {
            subject = subject.with_discriminator(discriminator);
        }

        Ok(subject)
    }
}

impl From<&AuditSubject> for AuditSubjectPayload {
    fn from(subject: &AuditSubject) -> Self {
        Self {
            subject_id: subject.subject_id().as_str().to_owned(),
            subject_type: subject.subject_type().map(ToOwned::to_owned),
            subject_discriminator: subject.subject_discriminator().map(ToOwned::to_owned),
        }
    }
}

impl ResponsiblePayload {
    /// Converts the payload into validated responsible information.
    pub fn into_information(self) -> AuditResult<ResponsibleInformation> {
        let mut information = ResponsibleInformation::new();

        if let Some(responsible) = self.responsible {
            information.set_responsible(responsible.into_subject()?);
        }

        if let Some(address) = self.responsible_address {
            information.set_responsible_address(address);
        }

        if let Some(agent) = self.responsible_agent {
            information.set_responsible_agent(agent);
        }

        if let Some(credentials_type) = self.credentials_type {
            information.set_credentials_type(credentials_type);
        }

        Ok(information)
    }
}

impl From<&ResponsibleInformation> for ResponsiblePayload {
    fn from(information: &ResponsibleInformation) -> Self {
        Self {
            responsible: information.responsible().map(AuditSubjectPayload::from),
            responsible_address: information.responsible_address().map(ToOwned::to_owned),
            responsible_agent: information.responsible_agent().map(ToOwned::to_owned),
            credentials_type: information.credentials_type().map(ToOwned::to_owned),
        }
    }
}

impl PropertyChangePayload {
    /// Converts the payload into a property change input.
    #[must_use]
    pub fn into_input(self) -> PropertyChangeInput {
        let old_value_specified = self.old_value_specified.unwrap_or(self.old_value.is_some());
        let new_value_specified = self.new_value_specified.unwrap_or(self.new_value.is_some());

        PropertyChangeInput {
            property_name: self.property_name,
            property_type: self.property_type,
            old_value: self.old_value,
            old_value_specified,
            new_value: self.new_value,
            new_value_specified,
        }
    }
}

impl From<SessionRecord> for SessionRecordResponse {
    fn from(record: SessionRecord) -> Self {
        Self {
            id: record.id().to_string(),
            session_id: record.session_id().map(ToOwned::to_owned),
            started_ts: record.started_ts(),
            ended_ts: record.ended_ts(),
            system: record.system().map(AuditSubjectPayload::from),
            system_address: record.system_address().map(ToOwned::to_owned),
            responsible_information: record.responsible_information().map(ResponsiblePayload::from),
        }
    }
}

impl From<TransactionRecord> for TransactionRecordResponse {
    fn from(record: TransactionRecord) -> Self {
        Self {
            id: record.id().to_string(),
            transaction_id: record.transaction_id().as_str().to_owned(),
            session_record: record.session_record().cloned().map(SessionRecordResponse::from),
            started_ts: record.started_ts(),
            ended_ts: record.ended_ts(),
            completion_status: record.completion_status(),
        }
    }
}

impl From<AuditEvent> for AuditEventResponse {
    fn from(event: AuditEvent) -> Self {
        Self {
            id: event.id().to_string(),
            ts: event.ts(),
            kind: event.kind().clone(),
            target: event.target().map(AuditSubjectPayload::from),
            session_record: event.session_record().cloned().map(SessionRecordResponse::from),
            transaction_record: event
                .transaction_record()
                .cloned()
                .map(TransactionRecordResponse::from),
            description: event.description().map(ToOwned::to_owned),
        }
    }
}
