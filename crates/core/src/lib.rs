//! Shared primitives for all Auditrail crates.

#![forbid(unsafe_code)]

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Result type used across Auditrail crates.
pub type AuditResult<T> = Result<T, AuditError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AuditResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AuditError::InvalidArgument(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Storage identity assigned to every persisted audit record.
///
/// The value is opaque to the domain: identifier generators decide the
/// concrete format, stores treat it as the primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a record identifier from a non-blank value.
    pub fn new(value: impl Into<String>) -> AuditResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AuditError::InvalidArgument(
                "record identifier must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Creates a record identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value.to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<RecordId> for String {
    fn from(value: RecordId) -> Self {
        value.0
    }
}

impl Display for RecordId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Common audit error categories.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Invalid input or violated invariant, detected before any I/O.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation attempted against a record or context whose state forbids it.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An event operation ran without an audit session bound to the task.
    #[error("no audit session is bound to the current task")]
    NoActiveSession,

    /// Persistence or collaborator failure, propagated unchanged.
    #[error("store error: {0}")]
    Store(String),
}

#[cfg(test)]
mod tests {
    use super::{NonEmptyString, RecordId};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn non_empty_string_keeps_original_value() {
        let value = NonEmptyString::new("  padded  ").unwrap_or_else(|_| unreachable!());
        assert_eq!(value.as_str(), "  padded  ");
    }

    #[test]
    fn record_id_rejects_blank_values() {
        let result = RecordId::new("");
        assert!(result.is_err());
    }

    #[test]
    fn record_id_displays_raw_value() {
        let id = RecordId::new("record-1").unwrap_or_else(|_| unreachable!());
        assert_eq!(id.to_string(), "record-1");
    }

    #[test]
    fn record_id_from_uuid_renders_as_text() {
        let value = uuid::Uuid::new_v4();
        let id = RecordId::from_uuid(value);
        assert_eq!(id.as_str(), value.to_string());
    }
}
