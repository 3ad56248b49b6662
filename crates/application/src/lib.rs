//! Application services and ports for audit capture.

#![forbid(unsafe_code)]

mod audit_context;
mod audit_ports;
mod audit_service;
mod responsible_populator;
mod transaction_bridge;

pub use audit_context::AuditContext;
pub use audit_ports::{
    AuditEventStore, IdentifierGenerator, PropertyChangeInput, SessionRecordStore,
    TransactionRecordStore,
};
pub use audit_service::{AuditService, SystemIdentity};
pub use responsible_populator::{RequestContext, ResponsiblePopulator, StandardResponsiblePopulator};
pub use transaction_bridge::TransactionBridge;
