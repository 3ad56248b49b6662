use auditrail_core::{AuditError, RecordId};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;

use crate::dto::{CreateTransactionRequest, EndTransactionRequest, TransactionRecordResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_transaction_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateTransactionRequest>,
) -> ApiResult<(StatusCode, Json<TransactionRecordResponse>)> {
    let record = state
        .transaction_bridge
        .transaction_started(&payload.transaction_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TransactionRecordResponse::from(record)),
    ))
}

pub async fn end_transaction_handler(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
    Json(payload): Json<EndTransactionRequest>,
) -> ApiResult<Json<TransactionRecordResponse>> {
    let id = RecordId::new(record_id)?;
    let record = state
        .transaction_store
        .find_transaction(&id)
        .await?
        .ok_or_else(|| AuditError::NotFound(format!("transaction record '{id}' does not exist")))?;

    let ended = state
        .transaction_bridge
        .transaction_completed(&record, payload.completion_status, Utc::now())
        .await?;

    Ok(Json(TransactionRecordResponse::from(ended)))
}
