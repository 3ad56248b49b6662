use auditrail_core::{AuditError, AuditResult, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuditSubject, ResponsibleInformation};

/// One recorded span of user or system activity, from login (or first
/// contact) to logout or expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    id: RecordId,
    session_id: Option<String>,
    started_ts: DateTime<Utc>,
    ended_ts: Option<DateTime<Utc>>,
    system: Option<AuditSubject>,
    system_address: Option<String>,
    responsible_information: Option<ResponsibleInformation>,
}

impl SessionRecord {
    /// Creates an open session record started at the given instant.
    #[must_use]
    pub fn new(id: RecordId, session_id: Option<String>, started_ts: DateTime<Utc>) -> Self {
        Self {
            id,
            session_id,
            started_ts,
            ended_ts: None,
            system: None,
            system_address: None,
            responsible_information: None,
        }
    }

    /// Returns the record with the owning system subject attached.
    #[must_use]
    pub fn with_system(mut self, system: AuditSubject) -> Self {
        self.system = Some(system);
        self
    }

    /// Returns the record with the owning system's network address attached.
    #[must_use]
    pub fn with_system_address(mut self, address: impl Into<String>) -> Self {
        self.system_address = Some(address.into());
        self
    }

    /// Returns the record with responsible information attached.
    #[must_use]
    pub fn with_responsible_information(mut self, information: ResponsibleInformation) -> Self {
        self.responsible_information = Some(information);
        self
    }

    /// Returns the storage identity.
    #[must_use]
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// Returns the external session identifier, such as a web session id.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Returns when the session started.
    #[must_use]
    pub fn started_ts(&self) -> DateTime<Utc> {
        self.started_ts
    }

    /// Returns when the session ended, once closed.
    #[must_use]
    pub fn ended_ts(&self) -> Option<DateTime<Utc>> {
        self.ended_ts
    }

    /// Returns the subject describing the system that owns the session.
    #[must_use]
    pub fn system(&self) -> Option<&AuditSubject> {
        self.system.as_ref()
    }

    /// Returns the network address of the owning system.
    #[must_use]
    pub fn system_address(&self) -> Option<&str> {
        self.system_address.as_deref()
    }

    /// Returns who is answerable for the session's activity.
    #[must_use]
    pub fn responsible_information(&self) -> Option<&ResponsibleInformation> {
        self.responsible_information.as_ref()
    }

    /// Returns whether the session has been closed.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended_ts.is_some()
    }

    /// Closes the session at the given instant.
    ///
    /// A session closes exactly once; further close attempts fail.
    pub fn mark_ended(&mut self, at: DateTime<Utc>) -> AuditResult<()> {
        if self.ended_ts.is_some() {
            return Err(AuditError::InvalidState(format!(
                "session record '{}' is already ended",
                self.id
            )));
        }

        self.ended_ts = Some(at);
        Ok(())
    }

    /// Replaces the responsible information while the session is open.
    pub fn set_responsible_information(
        &mut self,
        information: ResponsibleInformation,
    ) -> AuditResult<()> {
        if self.is_ended() {
            return Err(AuditError::InvalidState(format!(
                "session record '{}' is ended and can no longer change",
                self.id
            )));
        }

        self.responsible_information = Some(information);
        Ok(())
    }
}
