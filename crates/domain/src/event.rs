use std::str::FromStr;

use auditrail_core::{AuditError, AuditResult, NonEmptyString, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuditSubject, SessionRecord, TransactionRecord};

/// Life-cycle transition recorded against a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeCycleEventType {
    /// The subject came into existence.
    Create,
    /// One or more properties of the subject changed.
    Update,
    /// The subject was removed.
    Delete,
    /// The subject moved to another state in its life cycle.
    StateChange,
}

impl LifeCycleEventType {
    /// Returns a stable storage value for the event type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::StateChange => "state_change",
        }
    }
}

impl FromStr for LifeCycleEventType {
    type Err = AuditError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "state_change" => Ok(Self::StateChange),
            _ => Err(AuditError::InvalidArgument(format!(
                "unknown life cycle event type '{value}'"
            ))),
        }
    }
}

/// Direction of a group membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipChangeEventType {
    /// The subject joined the group.
    Added,
    /// The subject left the group.
    Removed,
}

impl MembershipChangeEventType {
    /// Returns a stable storage value for the change type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
        }
    }
}

impl FromStr for MembershipChangeEventType {
    type Err = AuditError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "added" => Ok(Self::Added),
            "removed" => Ok(Self::Removed),
            _ => Err(AuditError::InvalidArgument(format!(
                "unknown membership change type '{value}'"
            ))),
        }
    }
}

/// One observed change to a single property of the event target.
///
/// The `*_specified` flags distinguish "the value was null" from "the value
/// was not captured": an explicit null carries `specified = true` with no
/// value, an uncaptured side carries `specified = false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyValueChange {
    id: RecordId,
    property_name: NonEmptyString,
    property_type: NonEmptyString,
    old_value: Option<String>,
    new_value: Option<String>,
    old_value_specified: bool,
    new_value_specified: bool,
}

impl PropertyValueChange {
    /// Creates a validated property change.
    pub fn new(
        id: RecordId,
        property_name: impl Into<String>,
        property_type: impl Into<String>,
        old_value: Option<String>,
        old_value_specified: bool,
        new_value: Option<String>,
        new_value_specified: bool,
    ) -> AuditResult<Self> {
        if old_value.is_some() && !old_value_specified {
            return Err(AuditError::InvalidArgument(
                "old value is present but flagged as not specified".to_owned(),
            ));
        }

        if new_value.is_some() && !new_value_specified {
            return Err(AuditError::InvalidArgument(
                "new value is present but flagged as not specified".to_owned(),
            ));
        }

        Ok(Self {
            id,
            property_name: NonEmptyString::new(property_name)?,
            property_type: NonEmptyString::new(property_type)?,
            old_value,
            new_value,
            old_value_specified,
            new_value_specified,
        })
    }

    /// Returns the storage identity.
    #[must_use]
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// Returns the name of the changed property.
    #[must_use]
    pub fn property_name(&self) -> &NonEmptyString {
        &self.property_name
    }

    /// Returns the declared type of the changed property.
    #[must_use]
    pub fn property_type(&self) -> &NonEmptyString {
        &self.property_type
    }

    /// Returns the value before the change, when captured.
    #[must_use]
    pub fn old_value(&self) -> Option<&str> {
        self.old_value.as_deref()
    }

    /// Returns the value after the change, when captured.
    #[must_use]
    pub fn new_value(&self) -> Option<&str> {
        self.new_value.as_deref()
    }

    /// Returns whether the old value was captured at all.
    #[must_use]
    pub fn old_value_specified(&self) -> bool {
        self.old_value_specified
    }

    /// Returns whether the new value was captured at all.
    #[must_use]
    pub fn new_value_specified(&self) -> bool {
        self.new_value_specified
    }
}

/// Payload distinguishing the recorded occurrence kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditEventKind {
    /// A subject was created, updated, deleted or changed state.
    LifeCycle {
        /// Which life-cycle transition occurred.
        event_type: LifeCycleEventType,
        /// Per-property changes; only update events may carry any.
        property_value_changes: Vec<PropertyValueChange>,
    },
    /// A domain-defined business occurrence.
    Business {
        /// Classification of the occurrence, such as "order.placed".
        business_class: NonEmptyString,
        /// Optional refinement of the classification.
        business_action: Option<String>,
    },
    /// A metered consumption of some resource.
    Consumption {
        /// Amount consumed; finite and non-negative.
        amount_consumed: f64,
        /// Decimal scale the amount is expressed in.
        scale: u32,
    },
    /// A subject entered or left a group.
    MembershipChange {
        /// The group whose membership changed.
        membership_group: AuditSubject,
        /// Whether the subject was added or removed.
        change_type: MembershipChangeEventType,
        /// Optional property of the group that represents the membership.
        membership_property: Option<String>,
    },
}

impl AuditEventKind {
    /// Creates a life-cycle payload, rejecting property changes on
    /// anything but update events.
    pub fn life_cycle(
        event_type: LifeCycleEventType,
        property_value_changes: Vec<PropertyValueChange>,
    ) -> AuditResult<Self> {
        if !property_value_changes.is_empty() && event_type != LifeCycleEventType::Update {
            return Err(AuditError::InvalidArgument(format!(
                "property value changes are only valid for update events, not '{}'",
                event_type.as_str()
            )));
        }

        Ok(Self::LifeCycle {
            event_type,
            property_value_changes,
        })
    }

    /// Creates a business payload with a validated classification.
    pub fn business(
        business_class: impl Into<String>,
        business_action: Option<String>,
    ) -> AuditResult<Self> {
        Ok(Self::Business {
            business_class: NonEmptyString::new(business_class)?,
            business_action,
        })
    }

    /// Creates a consumption payload with a validated amount.
    pub fn consumption(amount_consumed: f64, scale: u32) -> AuditResult<Self> {
        if !amount_consumed.is_finite() || amount_consumed < 0.0 {
            return Err(AuditError::InvalidArgument(format!(
                "consumed amount must be finite and non-negative, got {amount_consumed}"
            )));
        }

        Ok(Self::Consumption {
            amount_consumed,
            scale,
        })
    }

    /// Creates a membership change payload.
    #[must_use]
    pub fn membership_change(
        membership_group: AuditSubject,
        change_type: MembershipChangeEventType,
        membership_property: Option<String>,
    ) -> Self {
        Self::MembershipChange {
            membership_group,
            change_type,
            membership_property,
        }
    }

    /// Returns a stable storage value for the payload kind.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::LifeCycle { .. } => "life_cycle",
            Self::Business { .. } => "business",
            Self::Consumption { .. } => "consumption",
            Self::MembershipChange { .. } => "membership_change",
        }
    }
}

/// Immutable record of one audited occurrence.
///
/// Events carry their correlation by value: the session and transaction
/// records captured at creation time. No operation anywhere updates an
/// event after it is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    id: RecordId,
    ts: DateTime<Utc>,
    target: Option<AuditSubject>,
    session_record: Option<SessionRecord>,
    transaction_record: Option<TransactionRecord>,
    description: Option<String>,
    kind: AuditEventKind,
}

impl AuditEvent {
    /// Creates an event recorded at the given instant.
    #[must_use]
    pub fn new(id: RecordId, ts: DateTime<Utc>, kind: AuditEventKind) -> Self {
        Self {
            id,
            ts,
            target: None,
            session_record: None,
            transaction_record: None,
            description: None,
            kind,
        }
    }

    /// Returns the event with the acted-upon subject attached.
    #[must_use]
    pub fn with_target(mut self, target: AuditSubject) -> Self {
        self.target = Some(target);
        self
    }

    /// Returns the event correlated to the session it occurred in.
    #[must_use]
    pub fn with_session_record(mut self, session_record: SessionRecord) -> Self {
        self.session_record = Some(session_record);
        self
    }

    /// Returns the event correlated to the transaction it occurred in.
    #[must_use]
    pub fn with_transaction_record(mut self, transaction_record: TransactionRecord) -> Self {
        self.transaction_record = Some(transaction_record);
        self
    }

    /// Returns the event with a human-readable description attached.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the storage identity.
    #[must_use]
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// Returns when the occurrence was recorded.
    #[must_use]
    pub fn ts(&self) -> DateTime<Utc> {
        self.ts
    }

    /// Returns the acted-upon subject.
    #[must_use]
    pub fn target(&self) -> Option<&AuditSubject> {
        self.target.as_ref()
    }

    /// Returns the session the occurrence was recorded in.
    #[must_use]
    pub fn session_record(&self) -> Option<&SessionRecord> {
        self.session_record.as_ref()
    }

    /// Returns the transaction the occurrence was recorded in.
    #[must_use]
    pub fn transaction_record(&self) -> Option<&TransactionRecord> {
        self.transaction_record.as_ref()
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the kind-specific payload.
    #[must_use]
    pub fn kind(&self) -> &AuditEventKind {
        &self.kind
    }
}

#[cfg(test)]
mod tests {
    use auditrail_core::RecordId;
    use chrono::Utc;

    use super::{AuditEvent, AuditEventKind, LifeCycleEventType, PropertyValueChange};
    use crate::AuditSubject;

    fn record_id(value: &str) -> RecordId {
        RecordId::new(value).unwrap_or_else(|_| unreachable!())
    }

    fn name_change() -> PropertyValueChange {
        PropertyValueChange::new(
            record_id("change-1"),
            "name",
            "string",
            Some("Draft".to_owned()),
            true,
            Some("Final".to_owned()),
            true,
        )
        .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn property_changes_are_rejected_outside_updates() {
        let result = AuditEventKind::life_cycle(LifeCycleEventType::Delete, vec![name_change()]);
        assert!(result.is_err());
    }

    #[test]
    fn update_events_carry_property_changes() {
        let kind = AuditEventKind::life_cycle(LifeCycleEventType::Update, vec![name_change()]);
        assert!(kind.is_ok());
    }

    #[test]
    fn create_events_without_changes_are_valid() {
        let kind = AuditEventKind::life_cycle(LifeCycleEventType::Create, Vec::new());
        assert!(kind.is_ok());
    }

    #[test]
    fn property_change_rejects_value_flagged_as_unspecified() {
        let result = PropertyValueChange::new(
            record_id("change-2"),
            "name",
            "string",
            Some("Draft".to_owned()),
            false,
            None,
            false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn property_change_accepts_explicit_null_sides() {
        let change = PropertyValueChange::new(
            record_id("change-3"),
            "closed_at",
            "datetime",
            None,
            true,
            None,
            true,
        );
        assert!(change.is_ok());
    }

    #[test]
    fn consumption_rejects_negative_and_non_finite_amounts() {
        assert!(AuditEventKind::consumption(-0.5, 0).is_err());
        assert!(AuditEventKind::consumption(f64::NAN, 0).is_err());
        assert!(AuditEventKind::consumption(f64::INFINITY, 2).is_err());
        assert!(AuditEventKind::consumption(12.5, 2).is_ok());
    }

    #[test]
    fn business_events_require_a_class() {
        assert!(AuditEventKind::business("", None).is_err());
        assert!(AuditEventKind::business("order.placed", Some("expedited".to_owned())).is_ok());
    }

    #[test]
    fn event_builders_attach_correlation() {
        let kind = AuditEventKind::business("order.placed", None)
            .unwrap_or_else(|_| unreachable!());
        let target = AuditSubject::new("order-77")
            .unwrap_or_else(|_| unreachable!())
            .with_subject_type("order");

        let event = AuditEvent::new(record_id("event-1"), Utc::now(), kind)
            .with_target(target.clone())
            .with_description("customer placed an order");

        assert_eq!(event.target(), Some(&target));
        assert_eq!(event.description(), Some("customer placed an order"));
        assert_eq!(event.kind().kind_name(), "business");
        assert!(event.session_record().is_none());
    }
}
