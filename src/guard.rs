use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::Error;

/// Denial reason of [`RequiresAuthentication`].
pub const MUST_BE_AUTHENTICATED: &str = "must be authenticated";

/// Outcome of a single guard.
///
/// There is no soft-deny: a guard either lets the chain continue or stops it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardResult {
    /// Continue with the next guard or the handler
    Proceed,
    /// Abort the chain with this reason
    Deny(String),
}

impl GuardResult {
    /// Shorthand for `GuardResult::Deny(reason.into())`.
    pub fn deny(reason: impl Into<String>) -> Self {
        GuardResult::Deny(reason.into())
    }

    /// Whether the guard allowed continuation.
    pub fn is_proceed(&self) -> bool {
        matches!(self, GuardResult::Proceed)
    }
}

/// A stateless predicate over an operation's arguments and request context.
///
/// Guards are owned by a [`GuardChain`](crate::GuardChain) and see the same
/// `(arguments, context)` pair regardless of what earlier guards decided.
/// A guard that cannot reach a collaborator returns `Err`, which is not a
/// denial and propagates unchanged.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use marketplace_core::{Error, Guard, GuardResult, RequestContext};
///
/// struct NonEmptyQuery;
///
/// #[async_trait]
/// impl Guard<String> for NonEmptyQuery {
///     fn name(&self) -> &'static str {
///         "non_empty_query"
///     }
///
///     async fn check(&self, args: &String, _ctx: &RequestContext) -> Result<GuardResult, Error> {
///         if args.trim().is_empty() {
///             Ok(GuardResult::deny("query must not be empty"))
///         } else {
///             Ok(GuardResult::Proceed)
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Guard<A: Sync>: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Evaluates the guard.
    async fn check(&self, args: &A, ctx: &RequestContext) -> Result<GuardResult, Error>;
}

/// Proceeds iff the context carries a caller email.
///
/// Works for any argument type, so every protected operation can reuse it.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiresAuthentication;

#[async_trait]
impl<A: Sync> Guard<A> for RequiresAuthentication {
    fn name(&self) -> &'static str {
        "requires_authentication"
    }

    async fn check(&self, _args: &A, ctx: &RequestContext) -> Result<GuardResult, Error> {
        Ok(match ctx.caller_email() {
            Some(_) => GuardResult::Proceed,
            None => GuardResult::deny(MUST_BE_AUTHENTICATED),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::EntityId;
    use crate::request::Caller;

    #[tokio::test]
    async fn anonymous_is_denied() {
        let ctx = RequestContext::anonymous("req-1");
        let result = Guard::<()>::check(&RequiresAuthentication, &(), &ctx)
            .await
            .unwrap();
        assert_eq!(result, GuardResult::deny(MUST_BE_AUTHENTICATED));
    }

    #[tokio::test]
    async fn caller_proceeds() {
        let ctx = RequestContext::authenticated(
            "req-2",
            Caller {
                id: EntityId::generate(),
                email: "a@b.io".to_string(),
            },
        );
        let result = Guard::<u32>::check(&RequiresAuthentication, &7, &ctx)
            .await
            .unwrap();
        assert!(result.is_proceed());
    }
}
