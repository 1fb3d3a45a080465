//! Context resolution at the start of every operation.
//!
//! ```text
//! Transport request
//!   ↓
//! ExtractCredential (RequestAdapter or a framework type)
//!   ↓
//! resolve_context()  → RequestContext | Error::Auth
//!   ↓
//! GuardChain::evaluate(args, &ctx)
//! ```

use tracing::Instrument;

use crate::auth::AuthResolver;
use crate::context::RequestContext;
use crate::error::Error;

use super::ExtractCredential;

/// Resolves the [`RequestContext`] for an inbound request.
///
/// The lookup runs inside a `request` span carrying the request id, so
/// resolver logs correlate with the operation that follows.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use marketplace_core::web::{resolve_context, RequestAdapter};
/// use marketplace_core::{AuthResolver, HmacTokenCodec, InMemoryUserStore};
///
/// let resolver = AuthResolver::new(
///     Arc::new(HmacTokenCodec::new("k", Duration::from_secs(60))),
///     Arc::new(InMemoryUserStore::new()),
/// );
/// let adapter = RequestAdapter::new("req-public");
///
/// let ctx = futures::executor::block_on(resolve_context(&adapter, &resolver)).unwrap();
/// assert!(ctx.caller_email().is_none());
/// ```
pub async fn resolve_context<R>(request: &R, resolver: &AuthResolver) -> Result<RequestContext, Error>
where
    R: ExtractCredential + ?Sized,
{
    let span = tracing::info_span!("request", request_id = %request.request_id());
    resolver.resolve(request).instrument(span).await
}
