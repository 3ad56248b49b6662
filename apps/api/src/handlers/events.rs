use auditrail_core::{AuditError, RecordId};
use auditrail_domain::TransactionRecord;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::dto::{
    AuditEventResponse, AuditSubjectPayload, BusinessEventRequest, ConsumptionEventRequest,
    LifeCycleEventRequest, MembershipChangeEventRequest, PropertyChangePayload,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_life_cycle_event_handler(
    State(state): State<AppState>,
    Json(payload): Json<LifeCycleEventRequest>,
) -> ApiResult<(StatusCode, Json<AuditEventResponse>)> {
    let transaction_record = resolve_transaction(&state, payload.transaction_record_id).await?;
    let target = payload
        .target
        .map(AuditSubjectPayload::into_subject)
        .transpose()?;
    let changes = payload
        .changes
        .into_iter()
        .map(PropertyChangePayload::into_input)
        .collect();

    let event = state
        .audit_service
        .create_life_cycle_event_with_changes(
            payload.event_type,
            target,
            payload.description,
            changes,
            transaction_record.as_ref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(AuditEventResponse::from(event))))
}

pub async fn create_business_event_handler(
    State(state): State<AppState>,
    Json(payload): Json<BusinessEventRequest>,
) -> ApiResult<(StatusCode, Json<AuditEventResponse>)> {
    let transaction_record = resolve_transaction(&state, payload.transaction_record_id).await?;
    let target = payload
        .target
        .map(AuditSubjectPayload::into_subject)
        .transpose()?;

    let event = state
        .audit_service
        .create_business_event(
            &payload.business_class,
            payload.business_action,
            target,
            payload.description,
            transaction_record.as_ref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(AuditEventResponse::from(event))))
}

pub async fn create_consumption_event_handler(
    State(state): State<AppState>,
    Json(payload): Json<ConsumptionEventRequest>,
) -> ApiResult<(StatusCode, Json<AuditEventResponse>)> {
    let transaction_record = resolve_transaction(&state, payload.transaction_record_id).await?;
    let target = payload
        .target
        .map(AuditSubjectPayload::into_subject)
        .transpose()?;

    let event = state
        .audit_service
        .create_consumption_event(
            payload.amount_consumed,
            payload.scale,
            target,
            payload.description,
            transaction_record.as_ref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(AuditEventResponse::from(event))))
}

pub async fn create_membership_change_event_handler(
    State(state): State<AppState>,
    Json(payload): Json<MembershipChangeEventRequest>,
) -> ApiResult<(StatusCode, Json<AuditEventResponse>)> {
    let transaction_record = resolve_transaction(&state, payload.transaction_record_id).await?;
    let membership_group = payload.membership_group.into_subject()?;
    let target = payload
        .target
        .map(AuditSubjectPayload::into_subject)
        .transpose()?;

    let event = state
        .audit_service
        .create_membership_change_event(
            membership_group,
            payload.change_type,
            payload.membership_property,
            target,
            payload.description,
            transaction_record.as_ref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(AuditEventResponse::from(event))))
}

pub async fn get_event_handler(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
) -> ApiResult<Json<AuditEventResponse>> {
    let id = RecordId::new(record_id)?;
    let event = state
        .event_store
        .find_event(&id)
        .await?
        .ok_or_else(|| AuditError::NotFound(format!("audit event '{id}' does not exist")))?;

    Ok(Json(AuditEventResponse::from(event)))
}

async fn resolve_transaction(
    state: &AppState,
    record_id: Option<String>,
) -> ApiResult<Option<TransactionRecord>> {
    let Some(record_id) = record_id else {
        return Ok(None);
    };

    let id = RecordId::new(record_id)?;
    let record = state
        .transaction_store
        .find_transaction(&id)
        .await?
        .ok_or_else(|| AuditError::NotFound(format!("transaction record '{id}' does not exist")))?;

    Ok(Some(record))
}
