use auditrail_core::{AuditResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// A participant in an audited operation: the acted-upon object, the
/// responsible principal, the owning system, or a membership group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditSubject {
    subject_id: NonEmptyString,
    subject_type: Option<String>,
    subject_discriminator: Option<String>,
}

impl AuditSubject {
    /// Creates a subject from its mandatory identifier.
    pub fn new(subject_id: impl Into<String>) -> AuditResult<Self> {
        Ok(Self {
            subject_id: NonEmptyString::new(subject_id)?,
            subject_type: None,
            subject_discriminator: None,
        })
    }

    /// Returns the subject with a type label attached.
    #[must_use]
    pub fn with_subject_type(mut self, subject_type: impl Into<String>) -> Self {
        self.subject_type = Some(subject_type.into());
        self
    }

    /// Returns the subject with a discriminator attached, separating
    /// same-typed subjects whose identifiers collide across namespaces.
    #[must_use]
    pub fn with_discriminator(mut self, discriminator: impl Into<String>) -> Self {
        self.subject_discriminator = Some(discriminator.into());
        self
    }

    /// Returns the subject identifier.
    #[must_use]
    pub fn subject_id(&self) -> &NonEmptyString {
        &self.subject_id
    }

    /// Returns the subject type label.
    #[must_use]
    pub fn subject_type(&self) -> Option<&str> {
        self.subject_type.as_deref()
    }

    /// Returns the subject discriminator.
    #[must_use]
    pub fn subject_discriminator(&self) -> Option<&str> {
        self.subject_discriminator.as_deref()
    }
}

/// Who is answerable for the activity a session covers, and how they
/// presented themselves.
///
/// Starts empty and is filled in as authentication context becomes
/// available, so an anonymous session can later gain a principal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsibleInformation {
    responsible: Option<AuditSubject>,
    responsible_address: Option<String>,
    responsible_agent: Option<String>,
    credentials_type: Option<String>,
}

impl ResponsibleInformation {
    /// Creates an empty instance with no field populated.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the responsible principal.
    #[must_use]
    pub fn responsible(&self) -> Option<&AuditSubject> {
        self.responsible.as_ref()
    }

    /// Returns the network address the principal acted from.
    #[must_use]
    pub fn responsible_address(&self) -> Option<&str> {
        self.responsible_address.as_deref()
    }

    /// Returns the client agent the principal acted through.
    #[must_use]
    pub fn responsible_agent(&self) -> Option<&str> {
        self.responsible_agent.as_deref()
    }

    /// Returns the kind of credentials the principal authenticated with.
    #[must_use]
    pub fn credentials_type(&self) -> Option<&str> {
        self.credentials_type.as_deref()
    }

    /// Sets the responsible principal.
    pub fn set_responsible(&mut self, responsible: AuditSubject) {
        self.responsible = Some(responsible);
    }

    /// Sets the network address the principal acted from.
    pub fn set_responsible_address(&mut self, address: impl Into<String>) {
        self.responsible_address = Some(address.into());
    }

    /// Sets the client agent the principal acted through.
    pub fn set_responsible_agent(&mut self, agent: impl Into<String>) {
        self.responsible_agent = Some(agent.into());
    }

    /// Sets the kind of credentials the principal authenticated with.
    pub fn set_credentials_type(&mut self, credentials_type: impl Into<String>) {
        self.credentials_type = Some(credentials_type.into());
    }
}

#[cfg(test)]
mod tests {
    use super::{AuditSubject, ResponsibleInformation};

    #[test]
    fn subject_requires_identifier() {
        let result = AuditSubject::new("  ");
        assert!(result.is_err());
    }

    #[test]
    fn subject_equality_covers_all_fields() {
        let plain = AuditSubject::new("42").unwrap_or_else(|_| unreachable!());
        let typed = AuditSubject::new("42")
            .unwrap_or_else(|_| unreachable!())
            .with_subject_type("invoice");
        let discriminated = typed.clone().with_discriminator("eu-west");

        assert_ne!(plain, typed);
        assert_ne!(typed, discriminated);
        assert_eq!(typed, typed.clone());
    }

    #[test]
    fn responsible_information_starts_empty() {
        let info = ResponsibleInformation::new();
        assert!(info.responsible().is_none());
        assert!(info.responsible_address().is_none());
        assert!(info.responsible_agent().is_none());
        assert!(info.credentials_type().is_none());
    }

    #[test]
    fn responsible_information_accumulates_fields() {
        let mut info = ResponsibleInformation::new();
        info.set_responsible_address("198.51.100.7");
        info.set_responsible_agent("cli/2.4");

        assert_eq!(info.responsible_address(), Some("198.51.100.7"));
        assert_eq!(info.responsible_agent(), Some("cli/2.4"));
        assert!(info.responsible().is_none());
    }
}
