//! Transport integration surface.
//!
//! This module is the boundary between a transport (HTTP, GraphQL over
//! websockets, ...) and the marketplace core. It handles:
//! - exposing the request id and `Authorization` header of an inbound request
//! - resolving the per-request [`RequestContext`](crate::RequestContext)
//!
//! It carries no framework dependencies. Integrations implement
//! [`ExtractCredential`] for their own request types, or copy what they
//! need into a [`RequestAdapter`].

mod adapter;
mod extract;
mod middleware;

pub use adapter::RequestAdapter;
pub use extract::{bearer_token, ExtractCredential, AUTHORIZATION};
pub use middleware::resolve_context;
