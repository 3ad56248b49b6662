use auditrail_core::{AuditError, RecordId};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::dto::{CreateSessionRequest, ResponsiblePayload, SessionRecordResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_session_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateSessionRequest>,
) -> ApiResult<(StatusCode, Json<SessionRecordResponse>)> {
    let responsible_information = payload
        .responsible
        .map(ResponsiblePayload::into_information)
        .transpose()?;

    let record = state
        .audit_service
        .create_session_record(payload.session_id, responsible_information)
        .await?;

    Ok((StatusCode::CREATED, Json(SessionRecordResponse::from(record))))
}

pub async fn get_session_handler(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
) -> ApiResult<Json<SessionRecordResponse>> {
    let id = RecordId::new(record_id)?;
    let record = state
        .session_store
        .find_session(&id)
        .await?
        .ok_or_else(|| AuditError::NotFound(format!("session record '{id}' does not exist")))?;

    Ok(Json(SessionRecordResponse::from(record)))
}

pub async fn end_session_handler(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
) -> ApiResult<Json<SessionRecordResponse>> {
    let id = RecordId::new(record_id)?;
    let record = state
        .session_store
        .find_session(&id)
        .await?
        .ok_or_else(|| AuditError::NotFound(format!("session record '{id}' does not exist")))?;

    let ended = state.audit_service.session_ended(&record).await?;
    Ok(Json(SessionRecordResponse::from(ended)))
}

pub async fn update_responsible_handler(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
    Json(payload): Json<ResponsiblePayload>,
) -> ApiResult<Json<SessionRecordResponse>> {
    let id = RecordId::new(record_id)?;
    let record = state
        .session_store
        .find_session(&id)
        .await?
        .ok_or_else(|| AuditError::NotFound(format!("session record '{id}' does not exist")))?;

    let information = payload.into_information()?;
    let updated = state
        .audit_service
        .update_responsible(&record, information)
        .await?;

    Ok(Json(SessionRecordResponse::from(updated)))
}
