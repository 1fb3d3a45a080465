//! Request authorization and event fan-out for a sales marketplace API.
//!
//! Every request is resolved into an immutable [`RequestContext`]. Mutations
//! then run as a [`GuardChain`]: ordered guards that may deny, followed by
//! exactly one handler. Creations are announced on an in-process
//! [`EventBus`] that subscription clients read from.
//!
//! # Core Types
//!
//! - [`AuthResolver`]: bearer token to [`RequestContext`]
//! - [`Guard`] / [`GuardResult`]: one authorization check
//! - [`RequiresAuthentication`], [`RequiresOwnership`]: the standard guards
//! - [`GuardChain`]: guards plus a terminal [`Handler`]
//! - [`EventBus`] / [`Subscription`]: topic-keyed publish and subscribe
//! - [`Marketplace`]: the wired-up operations
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use marketplace_core::{Collaborators, Config, EventBus, Marketplace, RequestContext};
//!
//! let config = Config::new("change-me");
//! let collaborators = Collaborators::in_memory(&config);
//! let marketplace = Marketplace::new(config, collaborators, Arc::new(EventBus::new()));
//!
//! let ctx = RequestContext::anonymous("req-123");
//! let sales = futures::executor::block_on(marketplace.list_sales(&ctx, None, None)).unwrap();
//! assert!(sales.is_empty());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod bus;
mod chain;
mod config;
mod context;
mod credential;
mod error;
mod events;
mod guard;
mod id;
pub mod logging;
mod model;
mod operations;
mod ownership;
mod request;
mod secret;
mod store;
pub mod validate;
pub mod web;

pub use auth::AuthResolver;
pub use bus::{EventBus, Subscription, Topic};
pub use chain::{GuardChain, Handler};
pub use config::{Config, ConfigError, PAGE_LIMIT_VAR, SECRET_KEY_VAR, TOKEN_TTL_VAR};
pub use context::RequestContext;
pub use credential::{Claims, HmacTokenCodec, PasswordHasher, TokenCodec};
pub use error::{AuthError, CredentialError, Error, GuardDenied, StoreError, ValidationError};
pub use events::MarketplaceEvent;
pub use guard::{Guard, GuardResult, RequiresAuthentication, MUST_BE_AUTHENTICATED};
pub use id::{is_valid_id, EntityId};
pub use logging::RequestLog;
pub use model::{
    AuthToken, DeleteSale, Listing, LoginInput, NewUser, Sale, SaleInput, SignupInput, UpdateSale,
    User,
};
pub use operations::{Collaborators, Marketplace};
pub use ownership::{
    OwnedLookup, RequiresOwnership, SaleOwners, TargetId, INVALID_IDENTIFIER, NOT_FOUND, NOT_OWNER,
};
pub use request::Caller;
pub use secret::Secret;
pub use store::{InMemorySaleStore, InMemoryUserStore, SaleStore, UserStore};
