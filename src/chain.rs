use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::{Error, GuardDenied};
use crate::guard::{Guard, GuardResult};

/// The terminal step of a [`GuardChain`].
///
/// Runs only after every guard proceeded, and receives the arguments by value.
#[async_trait]
pub trait Handler<A, T>: Send + Sync {
    /// Performs the operation.
    async fn handle(&self, args: A, ctx: &RequestContext) -> Result<T, Error>;
}

/// Ordered guards followed by exactly one handler.
///
/// `GuardChain` is the only path into a protected handler. Guards run in
/// the order they were added with [`require`](Self::require). The first
/// denial stops the chain. Later guards and the handler are not invoked.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use marketplace_core::{Error, GuardChain, Handler, RequestContext, RequiresAuthentication};
///
/// struct Echo;
///
/// #[async_trait]
/// impl Handler<String, String> for Echo {
///     async fn handle(&self, args: String, _ctx: &RequestContext) -> Result<String, Error> {
///         Ok(args)
///     }
/// }
///
/// let chain = GuardChain::new("echo", Echo).require(RequiresAuthentication);
/// let ctx = RequestContext::anonymous("req-1");
///
/// let result = futures::executor::block_on(chain.evaluate("hi".to_string(), &ctx));
/// assert_eq!(result.unwrap_err().denial_reason(), Some("must be authenticated"));
/// ```
pub struct GuardChain<A, T> {
    name: &'static str,
    guards: Vec<Box<dyn Guard<A>>>,
    handler: Box<dyn Handler<A, T>>,
}

impl<A, T> GuardChain<A, T>
where
    A: Send + Sync,
    T: Send,
{
    /// Creates a chain with no guards around `handler`.
    pub fn new(name: &'static str, handler: impl Handler<A, T> + 'static) -> Self {
        Self {
            name,
            guards: Vec::new(),
            handler: Box::new(handler),
        }
    }

    /// Appends a guard. Guards run in the order they are added.
    pub fn require(mut self, guard: impl Guard<A> + 'static) -> Self {
        self.guards.push(Box::new(guard));
        self
    }

    /// Operation name, as used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Guard names in evaluation order.
    pub fn guard_names(&self) -> Vec<&'static str> {
        self.guards.iter().map(|g| g.name()).collect()
    }

    /// Runs the guards, then the handler.
    ///
    /// # Errors
    ///
    /// - [`Error::Denied`] with the first denying guard's reason
    /// - any error a guard or the handler returned, unchanged
    pub async fn evaluate(&self, args: A, ctx: &RequestContext) -> Result<T, Error> {
        let log = ctx.log();

        for guard in &self.guards {
            match guard.check(&args, ctx).await {
                Ok(GuardResult::Proceed) => {
                    log.debug(format_args!("{}: {} proceeded", self.name, guard.name()));
                }
                Ok(GuardResult::Deny(reason)) => {
                    log.warn(format_args!(
                        "{}: denied by {}: {}",
                        self.name,
                        guard.name(),
                        reason
                    ));
                    return Err(GuardDenied::new(reason).into());
                }
                Err(err) => {
                    log.error(format_args!(
                        "{}: {} failed: {}",
                        self.name,
                        guard.name(),
                        err
                    ));
                    return Err(err);
                }
            }
        }

        match self.handler.handle(args, ctx).await {
            Ok(value) => {
                log.debug(format_args!("{}: completed", self.name));
                Ok(value)
            }
            Err(err) => {
                log.warn(format_args!("{}: failed: {}", self.name, err));
                Err(err)
            }
        }
    }
}

impl<A: Sync, T> std::fmt::Debug for GuardChain<A, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardChain")
            .field("name", &self.name)
            .field("guards", &self.guards.iter().map(|g| g.name()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::guard::RequiresAuthentication;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Fixed {
        name: &'static str,
        result: GuardResult,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Guard<u32> for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn check(&self, _args: &u32, _ctx: &RequestContext) -> Result<GuardResult, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.result.clone())
        }
    }

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl Handler<u32, u32> for Counting {
        async fn handle(&self, args: u32, _ctx: &RequestContext) -> Result<u32, Error> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(args * 2)
        }
    }

    fn fixed(name: &'static str, result: GuardResult) -> (Fixed, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Fixed {
                name,
                result,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }

    #[tokio::test]
    async fn all_proceed_runs_handler_once() {
        let handled = Arc::new(AtomicUsize::new(0));
        let (g1, _) = fixed("g1", GuardResult::Proceed);
        let (g2, _) = fixed("g2", GuardResult::Proceed);
        let chain = GuardChain::new("double", Counting(Arc::clone(&handled)))
            .require(g1)
            .require(g2);

        let out = chain
            .evaluate(21, &RequestContext::anonymous("req"))
            .await
            .unwrap();
        assert_eq!(out, 42);
        assert_eq!(handled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn first_denial_short_circuits() {
        let handled = Arc::new(AtomicUsize::new(0));
        let (g1, g1_calls) = fixed("g1", GuardResult::deny("nope"));
        let (g2, g2_calls) = fixed("g2", GuardResult::Proceed);
        let chain = GuardChain::new("double", Counting(Arc::clone(&handled)))
            .require(g1)
            .require(g2);

        let err = chain
            .evaluate(1, &RequestContext::anonymous("req"))
            .await
            .unwrap_err();
        assert_eq!(err.denial_reason(), Some("nope"));
        assert_eq!(g1_calls.load(Ordering::SeqCst), 1);
        assert_eq!(g2_calls.load(Ordering::SeqCst), 0);
        assert_eq!(handled.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn chain_without_guards_runs_handler() {
        let handled = Arc::new(AtomicUsize::new(0));
        let chain = GuardChain::new("open", Counting(Arc::clone(&handled)));
        assert!(chain.guard_names().is_empty());
        assert_eq!(
            chain.evaluate(2, &RequestContext::anonymous("r")).await.unwrap(),
            4
        );
    }

    #[test]
    fn guard_names_follow_declaration_order() {
        let (g, _) = fixed("second", GuardResult::Proceed);
        let chain = GuardChain::new("op", Counting(Arc::new(AtomicUsize::new(0))))
            .require(RequiresAuthentication)
            .require(g);
        assert_eq!(chain.guard_names(), vec!["requires_authentication", "second"]);
        assert!(format!("{chain:?}").contains("second"));
    }

    struct Unreachable(Arc<AtomicUsize>);

    #[async_trait]
    impl Guard<u32> for Unreachable {
        fn name(&self) -> &'static str {
            "unreachable"
        }

        async fn check(&self, _args: &u32, _ctx: &RequestContext) -> Result<GuardResult, Error> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Backend("connection reset".to_string()).into())
        }
    }

    #[tokio::test]
    async fn guard_error_stops_chain_and_passes_through() {
        let handled = Arc::new(AtomicUsize::new(0));
        let guard_calls = Arc::new(AtomicUsize::new(0));
        let (later, later_calls) = fixed("later", GuardResult::Proceed);
        let chain = GuardChain::new("op", Counting(Arc::clone(&handled)))
            .require(Unreachable(Arc::clone(&guard_calls)))
            .require(later);

        let err = chain
            .evaluate(1, &RequestContext::anonymous("req"))
            .await
            .unwrap_err();

        assert!(matches!(
            &err,
            Error::Store(StoreError::Backend(msg)) if msg == "connection reset"
        ));
        assert_eq!(err.denial_reason(), None);
        assert_eq!(guard_calls.load(Ordering::SeqCst), 1);
        assert_eq!(later_calls.load(Ordering::SeqCst), 0);
        assert_eq!(handled.load(Ordering::SeqCst), 0);
    }
}
