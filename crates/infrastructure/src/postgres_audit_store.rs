use std::str::FromStr;

use async_trait::async_trait;
use auditrail_application::{AuditEventStore, SessionRecordStore, TransactionRecordStore};
use auditrail_core::{AuditError, AuditResult, RecordId};
use auditrail_domain::{
    AuditEvent, AuditEventKind, AuditSubject, CompletionStatus, ResponsibleInformation,
    SessionRecord, TransactionRecord,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed store for all three audit record kinds.
///
/// Correlated subjects, responsible information and event payloads are
/// stored as JSONB snapshots. The conditional updates carry the
/// closed-record guard inside the statement (`WHERE ... ended_at IS NULL`),
/// so it holds across concurrent connections.
#[derive(Clone)]
pub struct PostgresAuditStore {
    pool: PgPool,
}

impl PostgresAuditStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SessionRow {
    id: String,
    session_id: Option<String>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    system_subject: Option<Value>,
    system_address: Option<String>,
    responsible_information: Option<Value>,
}

#[derive(Debug, FromRow)]
struct TransactionRow {
    id: String,
    transaction_id: String,
    session_record: Option<Value>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    completion_status: Option<String>,
}

#[derive(Debug, FromRow)]
struct EventRow {
    id: String,
    occurred_at: DateTime<Utc>,
    target: Option<Value>,
    session_record: Option<Value>,
    transaction_record: Option<Value>,
    description: Option<String>,
    kind: Value,
}

#[async_trait]
impl SessionRecordStore for PostgresAuditStore {
    async fn create_session(&self, record: SessionRecord) -> AuditResult<RecordId> {
        let system_subject = record
            .system()
            .map(|subject| encode_json(subject, "session system subject"))
            .transpose()?;
        let responsible_information = record
            .responsible_information()
            .map(|information| encode_json(information, "session responsible information"))
            .transpose()?;

        let result = sqlx::query(
            r#"
            INSERT INTO audit_session_records (
                id,
                session_id,
                started_at,
                ended_at,
                system_subject,
                system_address,
                responsible_information
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id().as_str())
        .bind(record.session_id())
        .bind(record.started_ts())
        .bind(record.ended_ts())
        .bind(system_subject)
        .bind(record.system_address())
        .bind(responsible_information)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(record.id().clone()),
            Err(error) => {
                if let sqlx::Error::Database(database_error) = &error
                    && database_error.code().as_deref() == Some("23505")
                {
                    return Err(AuditError::InvalidState(format!(
                        "session record '{}' already exists",
                        record.id()
                    )));
                }

                Err(AuditError::Store(format!(
                    "failed to create session record '{}': {error}",
                    record.id()
                )))
            }
        }
    }

    async fn find_session(&self, id: &RecordId) -> AuditResult<Option<SessionRecord>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT
                id,
                session_id,
                started_at,
                ended_at,
                system_subject,
                system_address,
                responsible_information
            FROM audit_session_records
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AuditError::Store(format!("failed to find session record '{id}': {error}"))
        })?;

        row.map(session_from_row).transpose()
    }

    async fn end_session(
        &self,
        id: &RecordId,
        ended_ts: DateTime<Utc>,
    ) -> AuditResult<SessionRecord> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            UPDATE audit_session_records
            SET ended_at = $2
            WHERE id = $1 AND ended_at IS NULL
            RETURNING
                id,
                session_id,
                started_at,
                ended_at,
                system_subject,
                system_address,
                responsible_information
            "#,
        )
        .bind(id.as_str())
        .bind(ended_ts)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AuditError::Store(format!("failed to end session record '{id}': {error}"))
        })?;

        let Some(row) = row else {
            return Err(match self.find_session(id).await? {
                Some(_) => {
                    AuditError::InvalidState(format!("session record '{id}' is already ended"))
                }
                None => AuditError::NotFound(format!("session record '{id}' does not exist")),
            });
        };

        session_from_row(row)
    }

    async fn update_responsible_information(
        &self,
        id: &RecordId,
        information: ResponsibleInformation,
    ) -> AuditResult<SessionRecord> {
        let information = encode_json(&information, "session responsible information")?;

        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            UPDATE audit_session_records
            SET responsible_information = $2
            WHERE id = $1 AND ended_at IS NULL
            RETURNING
                id,
                session_id,
                started_at,
                ended_at,
                system_subject,
                system_address,
                responsible_information
            "#,
        )
        .bind(id.as_str())
        .bind(information)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AuditError::Store(format!(
                "failed to update responsible information for session record '{id}': {error}"
            ))
        })?;

        let Some(row) = row else {
            return Err(match self.find_session(id).await? {
                Some(_) => AuditError::InvalidState(format!(
                    "session record '{id}' is ended and can no longer change"
                )),
                None => AuditError::NotFound(format!("session record '{id}' does not exist")),
            });
        };

        session_from_row(row)
    }
}

#[async_trait]
impl TransactionRecordStore for PostgresAuditStore {
    async fn create_transaction(&self, record: TransactionRecord) -> AuditResult<RecordId> {
        let session_record = record
            .session_record()
            .map(|session| encode_json(session, "transaction session record"))
            .transpose()?;

        let result = sqlx::query(
            r#"
            INSERT INTO audit_transaction_records (
                id,
                transaction_id,
                session_record,
                started_at,
                ended_at,
                completion_status
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id().as_str())
        .bind(record.transaction_id().as_str())
        .bind(session_record)
        .bind(record.started_ts())
        .bind(record.ended_ts())
        .bind(record.completion_status().map(|status| status.as_str()))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(record.id().clone()),
            Err(error) => {
                if let sqlx::Error::Database(database_error) = &error
                    && database_error.code().as_deref() == Some("23505")
                {
                    return Err(AuditError::InvalidState(format!(
                        "transaction record '{}' already exists",
                        record.id()
                    )));
                }

                Err(AuditError::Store(format!(
                    "failed to create transaction record '{}': {error}",
                    record.id()
                )))
            }
        }
    }

    async fn find_transaction(&self, id: &RecordId) -> AuditResult<Option<TransactionRecord>> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, transaction_id, session_record, started_at, ended_at, completion_status
            FROM audit_transaction_records
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AuditError::Store(format!("failed to find transaction record '{id}': {error}"))
        })?;

        row.map(transaction_from_row).transpose()
    }

    async fn end_transaction(
        &self,
        id: &RecordId,
        ended_ts: DateTime<Utc>,
        completion_status: CompletionStatus,
    ) -> AuditResult<TransactionRecord> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            UPDATE audit_transaction_records
            SET ended_at = $2, completion_status = $3
            WHERE id = $1 AND ended_at IS NULL
            RETURNING id, transaction_id, session_record, started_at, ended_at, completion_status
            "#,
        )
        .bind(id.as_str())
        .bind(ended_ts)
        .bind(completion_status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AuditError::Store(format!("failed to end transaction record '{id}': {error}"))
        })?;

        let Some(row) = row else {
            return Err(match self.find_transaction(id).await? {
                Some(_) => {
                    AuditError::InvalidState(format!("transaction record '{id}' is already ended"))
                }
                None => AuditError::NotFound(format!("transaction record '{id}' does not exist")),
            });
        };

        transaction_from_row(row)
    }
}

#[async_trait]
impl AuditEventStore for PostgresAuditStore {
    async fn append_event(&self, event: AuditEvent) -> AuditResult<RecordId> {
        let target = event
            .target()
            .map(|target| encode_json(target, "audit event target"))
            .transpose()?;
        let session_record = event
            .session_record()
            .map(|session| encode_json(session, "audit event session record"))
            .transpose()?;
        let transaction_record = event
            .transaction_record()
            .map(|transaction| encode_json(transaction, "audit event transaction record"))
            .transpose()?;
        let kind = encode_json(event.kind(), "audit event payload")?;

        let result = sqlx::query(
            r#"
            INSERT INTO audit_events (
                id,
                occurred_at,
                target,
                session_record,
                transaction_record,
                description,
                kind
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(event.id().as_str())
        .bind(event.ts())
        .bind(target)
        .bind(session_record)
        .bind(transaction_record)
        .bind(event.description())
        .bind(kind)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(event.id().clone()),
            Err(error) => {
                if let sqlx::Error::Database(database_error) = &error
                    && database_error.code().as_deref() == Some("23505")
                {
                    return Err(AuditError::InvalidState(format!(
                        "audit event '{}' already exists",
                        event.id()
                    )));
                }

                Err(AuditError::Store(format!(
                    "failed to append audit event '{}': {error}",
                    event.id()
                )))
            }
        }
    }

    async fn find_event(&self, id: &RecordId) -> AuditResult<Option<AuditEvent>> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, occurred_at, target, session_record, transaction_record, description, kind
            FROM audit_events
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AuditError::Store(format!("failed to find audit event '{id}': {error}"))
        })?;

        row.map(event_from_row).transpose()
    }
}

fn encode_json<T: Serialize>(value: &T, what: &str) -> AuditResult<Value> {
    serde_json::to_value(value)
        .map_err(|error| AuditError::Store(format!("failed to serialize {what}: {error}")))
}

fn decode_json<T: DeserializeOwned>(value: Value, what: &str) -> AuditResult<T> {
    serde_json::from_value(value)
        .map_err(|error| AuditError::Store(format!("persisted {what} is invalid: {error}")))
}

fn session_from_row(row: SessionRow) -> AuditResult<SessionRecord> {
    let id = RecordId::new(row.id).map_err(|error| {
        AuditError::Store(format!("persisted session record is invalid: {error}"))
    })?;

    let mut record = SessionRecord::new(id, row.session_id, row.started_at);

    if let Some(value) = row.system_subject {
        let subject: AuditSubject = decode_json(value, "session system subject")?;
        record = record.with_system(subject);
    }

    if let Some(address) = row.system_address {
        record = record.with_system_address(address);
    }

    if let Some(value) = row.responsible_information {
        let information: ResponsibleInformation =
            decode_json(value, "session responsible information")?;
        record = record.with_responsible_information(information);
    }

    if let Some(ended_at) = row.ended_at {
        record.mark_ended(ended_at)?;
    }

    Ok(record)
}

fn transaction_from_row(row: TransactionRow) -> AuditResult<TransactionRecord> {
    let id = RecordId::new(row.id).map_err(|error| {
        AuditError::Store(format!("persisted transaction record is invalid: {error}"))
    })?;
    let mut record = TransactionRecord::new(id, row.transaction_id).map_err(|error| {
        AuditError::Store(format!("persisted transaction record is invalid: {error}"))
    })?;

    if let Some(value) = row.session_record {
        let session: SessionRecord = decode_json(value, "transaction session record")?;
        record = record.with_session_record(session);
    }

    if let Some(started_at) = row.started_at {
        record = record.with_started_ts(started_at);
    }

    if let Some(ended_at) = row.ended_at {
        let Some(status) = row.completion_status else {
            return Err(AuditError::Store(format!(
                "persisted transaction record '{}' is ended without a completion status",
                record.id()
            )));
        };

        let status = CompletionStatus::from_str(status.as_str()).map_err(|error| {
            AuditError::Store(format!(
                "persisted transaction record '{}' is invalid: {error}",
                record.id()
            ))
        })?;
        record.mark_ended(ended_at, status)?;
    }

    Ok(record)
}

fn event_from_row(row: EventRow) -> AuditResult<AuditEvent> {
    let id = RecordId::new(row.id)
        .map_err(|error| AuditError::Store(format!("persisted audit event is invalid: {error}")))?;
    let kind: AuditEventKind = decode_json(row.kind, "audit event payload")?;

    let mut event = AuditEvent::new(id, row.occurred_at, kind);

    if let Some(value) = row.target {
        let target: AuditSubject = decode_json(value, "audit event target")?;
        event = event.with_target(target);
    }

    if let Some(value) = row.session_record {
        let session: SessionRecord = decode_json(value, "audit event session record")?;
        event = event.with_session_record(session);
    }

    if let Some(value) = row.transaction_record {
        let transaction: TransactionRecord = decode_json(value, "audit event transaction record")?;
        event = event.with_transaction_record(transaction);
    }

    if let Some(description) = row.description {
        event = event.with_description(description);
    }

    Ok(event)
}
