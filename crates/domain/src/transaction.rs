use std::hash::{Hash, Hasher};
use std::str::FromStr;

use auditrail_core::{AuditError, AuditResult, NonEmptyString, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::SessionRecord;

/// Outcome recorded when a transaction closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    /// The transaction committed.
    Committed,
    /// The transaction rolled back.
    RolledBack,
    /// The outcome could not be determined.
    Unknown,
}

impl CompletionStatus {
    /// Returns a stable storage value for the completion status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
            Self::Unknown => "unknown",
        }
    }
}

impl FromStr for CompletionStatus {
    type Err = AuditError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "committed" => Ok(Self::Committed),
            "rolled_back" => Ok(Self::RolledBack),
            "unknown" => Ok(Self::Unknown),
            _ => Err(AuditError::InvalidArgument(format!(
                "unknown completion status '{value}'"
            ))),
        }
    }
}

/// One platform unit of work, correlating the events recorded inside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    id: RecordId,
    transaction_id: NonEmptyString,
    session_record: Option<SessionRecord>,
    started_ts: Option<DateTime<Utc>>,
    ended_ts: Option<DateTime<Utc>>,
    completion_status: Option<CompletionStatus>,
}

impl TransactionRecord {
    /// Creates an open transaction record for the given platform identifier.
    pub fn new(id: RecordId, transaction_id: impl Into<String>) -> AuditResult<Self> {
        Ok(Self {
            id,
            transaction_id: NonEmptyString::new(transaction_id)?,
            session_record: None,
            started_ts: None,
            ended_ts: None,
            completion_status: None,
        })
    }

    /// Returns the record linked to the session it ran under.
    #[must_use]
    pub fn with_session_record(mut self, session_record: SessionRecord) -> Self {
        self.session_record = Some(session_record);
        self
    }

    /// Returns the record with its start instant attached.
    #[must_use]
    pub fn with_started_ts(mut self, started_ts: DateTime<Utc>) -> Self {
        self.started_ts = Some(started_ts);
        self
    }

    /// Returns the storage identity.
    #[must_use]
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// Returns the platform transaction identifier.
    #[must_use]
    pub fn transaction_id(&self) -> &NonEmptyString {
        &self.transaction_id
    }

    /// Returns the session the transaction ran under, when known.
    #[must_use]
    pub fn session_record(&self) -> Option<&SessionRecord> {
        self.session_record.as_ref()
    }

    /// Returns when the transaction started, when known.
    #[must_use]
    pub fn started_ts(&self) -> Option<DateTime<Utc>> {
        self.started_ts
    }

    /// Returns when the transaction closed.
    #[must_use]
    pub fn ended_ts(&self) -> Option<DateTime<Utc>> {
        self.ended_ts
    }

    /// Returns how the transaction closed.
    #[must_use]
    pub fn completion_status(&self) -> Option<CompletionStatus> {
        self.completion_status
    }

    /// Returns whether the transaction has been closed.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended_ts.is_some()
    }

    /// Closes the transaction with its outcome.
    ///
    /// A transaction closes exactly once; further close attempts fail.
    pub fn mark_ended(&mut self, at: DateTime<Utc>, status: CompletionStatus) -> AuditResult<()> {
        if self.ended_ts.is_some() {
            return Err(AuditError::InvalidState(format!(
                "transaction record '{}' is already ended",
                self.id
            )));
        }

        self.ended_ts = Some(at);
        self.completion_status = Some(status);
        Ok(())
    }
}

// Equality and hashing track the storage identity only; close state is
// mutable over the record's lifetime.
impl PartialEq for TransactionRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TransactionRecord {}

impl Hash for TransactionRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
