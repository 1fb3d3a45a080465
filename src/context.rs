use crate::id::EntityId;
use crate::logging::RequestLog;
use crate::request::Caller;

/// Per-operation context produced by the [`AuthResolver`](crate::AuthResolver).
///
/// Built once at the start of an operation and never mutated afterwards.
/// An anonymous context has neither a caller email nor a caller id.
///
/// # Examples
///
/// ```
/// use marketplace_core::{Caller, EntityId, RequestContext};
///
/// let anon = RequestContext::anonymous("req-1");
/// assert!(anon.caller_email().is_none());
///
/// let caller = Caller { id: EntityId::generate(), email: "ada@example.com".to_string() };
/// let ctx = RequestContext::authenticated("req-2", caller);
/// assert_eq!(ctx.caller_email(), Some("ada@example.com"));
/// assert!(ctx.caller_id().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    request_id: String,
    caller: Option<Caller>,
}

impl RequestContext {
    /// Context for a request without a credential.
    pub fn anonymous(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            caller: None,
        }
    }

    /// Context for a request whose credential resolved to `caller`.
    pub fn authenticated(request_id: impl Into<String>, caller: Caller) -> Self {
        Self {
            request_id: request_id.into(),
            caller: Some(caller),
        }
    }

    /// Correlation id of the inbound request.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// The resolved caller, if any.
    pub fn caller(&self) -> Option<&Caller> {
        self.caller.as_ref()
    }

    /// Email of the caller, `None` when anonymous.
    pub fn caller_email(&self) -> Option<&str> {
        self.caller.as_ref().map(|c| c.email.as_str())
    }

    /// Id of the caller, `None` when anonymous.
    pub fn caller_id(&self) -> Option<EntityId> {
        self.caller.as_ref().map(|c| c.id)
    }

    /// Whether the context carries an identity.
    pub fn is_authenticated(&self) -> bool {
        self.caller.is_some()
    }

    /// Logger tagged with this request's id and caller.
    pub fn log(&self) -> RequestLog<'_> {
        RequestLog::new(&self.request_id, self.caller_email())
    }
}
