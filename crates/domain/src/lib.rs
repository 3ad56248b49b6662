//! Audit domain records and their invariants.

#![forbid(unsafe_code)]

mod event;
mod session;
mod subject;
mod transaction;

pub use event::{
    AuditEvent, AuditEventKind, LifeCycleEventType, MembershipChangeEventType, PropertyValueChange,
};
pub use session::SessionRecord;
pub use subject::{AuditSubject, ResponsibleInformation};
pub use transaction::{CompletionStatus, TransactionRecord};
