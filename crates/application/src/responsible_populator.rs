use auditrail_domain::{AuditSubject, ResponsibleInformation};

/// Ambient request data an integration layer observed for one unit of work.
///
/// Assembled by the integration adapter (an HTTP layer from headers, a job
/// runner from its submission metadata) and handed to a populator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Network address the request arrived from.
    pub remote_address: Option<String>,
    /// Client agent string presented with the request.
    pub user_agent: Option<String>,
    /// Authenticated principal, once authentication has happened.
    pub principal: Option<AuditSubject>,
    /// Kind of credentials the principal presented.
    pub credentials_type: Option<String>,
}

/// Policy for mapping ambient request data onto responsible information.
pub trait ResponsiblePopulator: Send + Sync {
    /// Populates an instance from the request context.
    fn fill_in(&self, information: &mut ResponsibleInformation, context: &RequestContext);

    /// Applies newly available request data and returns whether anything
    /// changed, so callers know when to persist.
    ///
    /// Drives the anonymous-to-authenticated transition: the same session
    /// gains a principal once authentication happens mid-session.
    fn update(&self, information: &mut ResponsibleInformation, context: &RequestContext) -> bool;
}

/// Default policy: copies every observed value; updates overwrite only
/// when the observed value differs.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardResponsiblePopulator;

impl StandardResponsiblePopulator {
    /// Creates the default populator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ResponsiblePopulator for StandardResponsiblePopulator {
    fn fill_in(&self, information: &mut ResponsibleInformation, context: &RequestContext) {
        if let Some(address) = context.remote_address.as_deref() {
            information.set_responsible_address(address);
        }

        if let Some(agent) = context.user_agent.as_deref() {
            information.set_responsible_agent(agent);
        }

        if let Some(principal) = context.principal.clone() {
            information.set_responsible(principal);
        }

        if let Some(credentials_type) = context.credentials_type.as_deref() {
            information.set_credentials_type(credentials_type);
        }
    }

    fn update(&self, information: &mut ResponsibleInformation, context: &RequestContext) -> bool {
        let mut changed = false;

        if let Some(address) = context.remote_address.as_deref()
            && information.responsible_address() != Some(address)
        {
            information.set_responsible_address(address);
            changed = true;
        }

        if let Some(agent) = context.user_agent.as_deref()
            && information.responsible_agent() != Some(agent)
        {
            information.set_responsible_agent(agent);
            changed = true;
        }

        if let Some(principal) = context.principal.as_ref()
            && information.responsible() != Some(principal)
        {
            information.set_responsible(principal.clone());
            changed = true;
        }

        if let Some(credentials_type) = context.credentials_type.as_deref()
            && information.credentials_type() != Some(credentials_type)
        {
            information.set_credentials_type(credentials_type);
            changed = true;
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use auditrail_domain::{AuditSubject, ResponsibleInformation};

    use super::{RequestContext, ResponsiblePopulator, StandardResponsiblePopulator};

    fn authenticated_context() -> RequestContext {
        RequestContext {
            remote_address: Some("203.0.113.9".to_owned()),
            user_agent: Some("browser/121".to_owned()),
            principal: Some(
                AuditSubject::new("alice")
                    .unwrap_or_else(|_| unreachable!())
                    .with_subject_type("user"),
            ),
            credentials_type: Some("password".to_owned()),
        }
    }

    #[test]
    fn fill_in_copies_every_observed_value() {
        let populator = StandardResponsiblePopulator::new();
        let context = authenticated_context();
        let mut information = ResponsibleInformation::new();

        populator.fill_in(&mut information, &context);

        assert_eq!(information.responsible_address(), Some("203.0.113.9"));
        assert_eq!(information.responsible_agent(), Some("browser/121"));
        assert_eq!(information.credentials_type(), Some("password"));
        assert_eq!(
            information
                .responsible()
                .map(|subject| subject.subject_id().as_str()),
            Some("alice")
        );
    }

    #[test]
    fn fill_in_skips_unobserved_values() {
        let populator = StandardResponsiblePopulator::new();
        let context = RequestContext {
            remote_address: Some("203.0.113.9".to_owned()),
            ..RequestContext::default()
        };
        let mut information = ResponsibleInformation::new();

        populator.fill_in(&mut information, &context);

        assert_eq!(information.responsible_address(), Some("203.0.113.9"));
        assert!(information.responsible().is_none());
        assert!(information.credentials_type().is_none());
    }

    #[test]
    fn update_reports_the_authentication_transition() {
        let populator = StandardResponsiblePopulator::new();
        let mut information = ResponsibleInformation::new();

        let anonymous = RequestContext {
            remote_address: Some("203.0.113.9".to_owned()),
            user_agent: Some("browser/121".to_owned()),
            ..RequestContext::default()
        };
        assert!(populator.update(&mut information, &anonymous));
        assert!(information.responsible().is_none());

        let authenticated = authenticated_context();
        assert!(populator.update(&mut information, &authenticated));
        assert!(information.responsible().is_some());
    }

    #[test]
    fn update_is_quiet_when_nothing_changed() {
        let populator = StandardResponsiblePopulator::new();
        let context = authenticated_context();
        let mut information = ResponsibleInformation::new();

        populator.fill_in(&mut information, &context);
        assert!(!populator.update(&mut information, &context));
    }
}
