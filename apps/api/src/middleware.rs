use auditrail_application::{AuditContext, RequestContext};
use auditrail_core::{AuditError, RecordId};
use auditrail_domain::SessionRecord;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiResult;
use crate::state::AppState;

const AUDIT_SESSION_HEADER: &str = "x-audit-session";

pub async fn audit_scope(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    AuditContext::scope(async move {
        if let Some(record) = session_from_headers(&state, request.headers()).await? {
            AuditContext::create(record)?;
        }

        Ok(next.run(request).await)
    })
    .await
}

async fn session_from_headers(
    state: &AppState,
    headers: &HeaderMap,
) -> ApiResult<Option<SessionRecord>> {
    let Some(value) = headers.get(AUDIT_SESSION_HEADER) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| {
        AuditError::InvalidArgument(format!("{AUDIT_SESSION_HEADER} header must be valid UTF-8"))
    })?;

    let id = RecordId::new(value)?;
    let record = state
        .session_store
        .find_session(&id)
        .await?
        .ok_or_else(|| AuditError::NotFound(format!("session record '{id}' does not exist")))?;

    let record = refresh_responsible_information(state, record, headers).await?;
    Ok(Some(record))
}

async fn refresh_responsible_information(
    state: &AppState,
    record: SessionRecord,
    headers: &HeaderMap,
) -> ApiResult<SessionRecord> {
    // Ended sessions stay referenceable for reads but accept no updates.
    if record.is_ended() {
        return Ok(record);
    }

    let context = request_context_from_headers(headers);
    let mut information = record.responsible_information().cloned().unwrap_or_default();

    if state
        .responsible_populator
        .update(&mut information, &context)
    {
        let updated = state
            .audit_service
            .update_responsible(&record, information)
            .await?;
        return Ok(updated);
    }

    Ok(record)
}

fn request_context_from_headers(headers: &HeaderMap) -> RequestContext {
    let remote_address = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned);

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned);

    RequestContext {
        remote_address,
        user_agent,
        ..RequestContext::default()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue};

    use super::request_context_from_headers;

    #[test]
    fn forwarded_for_takes_the_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        headers.insert("user-agent", HeaderValue::from_static("cli/2.4"));

        let context = request_context_from_headers(&headers);

        assert_eq!(context.remote_address.as_deref(), Some("203.0.113.9"));
        assert_eq!(context.user_agent.as_deref(), Some("cli/2.4"));
    }

    #[test]
    fn absent_headers_yield_an_empty_context() {
        let context = request_context_from_headers(&HeaderMap::new());

        assert!(context.remote_address.is_none());
        assert!(context.user_agent.is_none());
        assert!(context.principal.is_none());
        assert!(context.credentials_type.is_none());
    }
}
