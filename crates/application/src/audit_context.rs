use std::cell::RefCell;
use std::future::Future;

use auditrail_core::{AuditError, AuditResult};
use auditrail_domain::SessionRecord;

tokio::task_local! {
    static CURRENT_SESSION: RefCell<Option<SessionRecord>>;
}

/// The audit session bound to the current task.
///
/// A binding slot exists only inside [`AuditContext::scope`], which
/// unit-of-work adapters open around each request or job. The slot is
/// dropped with the scope on every exit path, so a binding can never leak
/// into unrelated work executing later on the same worker thread. Bindings
/// are per logical task; concurrent tasks never observe each other's
/// context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditContext {
    session_record: SessionRecord,
}

impl AuditContext {
    /// Runs a future with an empty binding slot for the current task.
    pub async fn scope<F>(future: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_SESSION.scope(RefCell::new(None), future).await
    }

    /// Binds the session record to the current task and returns the
    /// bound context.
    ///
    /// Fails when a context is already bound (nested bindings are not
    /// supported) and when no scope is open, which means no unit of work
    /// was declared around the caller.
    pub fn create(session_record: SessionRecord) -> AuditResult<Self> {
        CURRENT_SESSION
            .try_with(|slot| {
                let mut bound = slot.borrow_mut();
                if bound.is_some() {
                    return Err(AuditError::InvalidState(
                        "an audit context is already bound to the current task".to_owned(),
                    ));
                }

                *bound = Some(session_record.clone());
                Ok(Self { session_record })
            })
            .map_err(|_| {
                AuditError::InvalidState(
                    "no audit scope is open on the current task".to_owned(),
                )
            })?
    }

    /// Returns the context bound to the current task, if any.
    ///
    /// Also `None` outside any scope.
    #[must_use]
    pub fn current() -> Option<Self> {
        CURRENT_SESSION
            .try_with(|slot| slot.borrow().clone())
            .ok()
            .flatten()
            .map(|session_record| Self { session_record })
    }

    /// Unbinds the current task's context.
    ///
    /// A no-op when nothing is bound or no scope is open.
    pub fn clear() {
        let _ = CURRENT_SESSION.try_with(|slot| {
            slot.borrow_mut().take();
        });
    }

    /// Returns the session record the context was created with.
    #[must_use]
    pub fn session_record(&self) -> &SessionRecord {
        &self.session_record
    }
}

#[cfg(test)]
mod tests {
    use auditrail_core::RecordId;
    use chrono::Utc;

    use super::AuditContext;
    use auditrail_domain::SessionRecord;

    fn session_record(value: &str) -> SessionRecord {
        let id = RecordId::new(value).unwrap_or_else(|_| unreachable!());
        SessionRecord::new(id, None, Utc::now())
    }

    #[tokio::test]
    async fn create_requires_an_open_scope() {
        let result = AuditContext::create(session_record("session-1"));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn current_is_none_outside_any_scope() {
        assert!(AuditContext::current().is_none());
    }

    #[tokio::test]
    async fn bind_then_lookup_then_clear() {
        AuditContext::scope(async {
            assert!(AuditContext::current().is_none());

            let record = session_record("session-1");
            let bound = AuditContext::create(record.clone());
            assert!(bound.is_ok());

            let current = AuditContext::current();
            assert_eq!(
                current.map(|context| context.session_record().clone()),
                Some(record)
            );

            AuditContext::clear();
            assert!(AuditContext::current().is_none());
        })
        .await;
    }

    #[tokio::test]
    async fn second_bind_fails_while_first_is_active() {
        AuditContext::scope(async {
            let first = AuditContext::create(session_record("session-1"));
            assert!(first.is_ok());

            let second = AuditContext::create(session_record("session-2"));
            assert!(second.is_err());

            // The original binding survives the failed attempt.
            let current = AuditContext::current();
            assert_eq!(
                current.map(|context| context.session_record().id().to_string()),
                Some("session-1".to_owned())
            );
        })
        .await;
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        AuditContext::scope(async {
            AuditContext::clear();
            AuditContext::clear();
            assert!(AuditContext::current().is_none());
        })
        .await;

        // Outside any scope it degrades to a no-op as well.
        AuditContext::clear();
    }

    #[tokio::test]
    async fn rebind_succeeds_after_clear() {
        AuditContext::scope(async {
            let first = AuditContext::create(session_record("session-1"));
            assert!(first.is_ok());

            AuditContext::clear();

            let second = AuditContext::create(session_record("session-2"));
            assert!(second.is_ok());
        })
        .await;
    }

    #[tokio::test]
    async fn scope_drop_discards_the_binding() {
        AuditContext::scope(async {
            let bound = AuditContext::create(session_record("session-1"));
            assert!(bound.is_ok());
        })
        .await;

        AuditContext::scope(async {
            assert!(AuditContext::current().is_none());
        })
        .await;
    }

    #[tokio::test]
    async fn concurrent_tasks_have_independent_bindings() {
        let first = tokio::spawn(AuditContext::scope(async {
            let bound = AuditContext::create(session_record("session-a"));
            assert!(bound.is_ok());

            tokio::task::yield_now().await;

            AuditContext::current().map(|context| context.session_record().id().to_string())
        }));

        let second = tokio::spawn(AuditContext::scope(async {
            let bound = AuditContext::create(session_record("session-b"));
            assert!(bound.is_ok());

            tokio::task::yield_now().await;

            AuditContext::current().map(|context| context.session_record().id().to_string())
        }));

        let first = first.await.unwrap_or_default();
        let second = second.await.unwrap_or_default();

        assert_eq!(first, Some("session-a".to_owned()));
        assert_eq!(second, Some("session-b".to_owned()));
    }

    #[tokio::test]
    async fn spawned_tasks_do_not_inherit_the_binding() {
        AuditContext::scope(async {
            let bound = AuditContext::create(session_record("session-1"));
            assert!(bound.is_ok());

            let observed = tokio::spawn(async { AuditContext::current().is_none() })
                .await
                .unwrap_or_default();
            assert!(observed);
        })
        .await;
    }

    #[tokio::test]
    async fn contexts_compare_by_session_record() {
        AuditContext::scope(async {
            let record = session_record("session-1");
            let bound = AuditContext::create(record);
            assert!(bound.is_ok());

            let first = AuditContext::current();
            let second = AuditContext::current();
            assert_eq!(first, second);
        })
        .await;
    }
}
